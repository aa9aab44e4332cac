//! Owns everything one top-level operation needs: the hardware handle,
//! the reader's tuning, the tag image it has built up, and the
//! diagnostic log — replacing the global mutable driver state the
//! teacher crate uses with a value the caller constructs, uses, and
//! drops.

use crate::consts::{FIELD_SETTLE_TICKS, TICKS_PER_FC};
use crate::diag::TransactionLog;
use crate::error::Em4x70Error;
use crate::hal::HwInterface;
use crate::listen_window::find_listen_window;
use crate::tag::{ParityMode, TagImage};
use crate::timing::await_signal_threshold;

/// Reader tuning parameters, constructed by the caller rather than read
/// from globals.
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    /// LF carrier divisor (95 => 125 kHz from a 12 MHz reference).
    pub carrier_divisor: u32,
    /// Timer ticks per tag carrier cycle.
    pub ticks_per_fc: u32,
    /// Whether outgoing commands carry an even-parity bit.
    pub parity: ParityMode,
}

impl ReaderConfig {
    pub const fn new(carrier_divisor: u32, parity: ParityMode) -> Self {
        Self {
            carrier_divisor,
            ticks_per_fc: TICKS_PER_FC,
            parity,
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::new(95, ParityMode::WithParity)
    }
}

/// The hardware, tuning, and accumulated state of one reader-to-tag
/// operation.
pub struct Session<HW: HwInterface> {
    pub(crate) hw: HW,
    pub(crate) config: ReaderConfig,
    pub(crate) tag: TagImage,
    pub(crate) log: TransactionLog,
}

impl<HW: HwInterface> Session<HW> {
    pub fn new(hw: HW, config: ReaderConfig) -> Self {
        Self {
            hw,
            config,
            tag: TagImage::new(),
            log: TransactionLog::new(),
        }
    }

    pub fn config(&self) -> ReaderConfig {
        self.config
    }

    pub fn tag(&self) -> &TagImage {
        &self.tag
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    pub fn into_hw(self) -> HW {
        self.hw
    }

    /// Energize the field, start the tick counter, and let the field
    /// settle for [`FIELD_SETTLE_TICKS`] before anything else touches the
    /// channel. Must be called before any transaction.
    pub fn setup_field(&mut self) -> Result<(), Em4x70Error> {
        self.hw
            .fpga_configure_lf_reader()
            .map_err(|_| Em4x70Error::NoSignal)?;
        self.hw.start_ticks();
        self.hw.wait_ticks(FIELD_SETTLE_TICKS);
        self.hw.watchdog_kick();
        Ok(())
    }

    /// De-energize timing bookkeeping at the end of an operation,
    /// regardless of whether it succeeded.
    pub fn finalize(&mut self) {
        self.hw.stop_ticks();
    }

    pub(crate) fn check_abort(&mut self) -> Result<(), Em4x70Error> {
        if self.hw.host_abort_pending() || self.hw.button_pressed() {
            Err(Em4x70Error::Aborted)
        } else {
            Ok(())
        }
    }

    /// The four checks every operation requires before it may touch the
    /// tag: no pending abort, a field settled at [`Self::setup_field`], a
    /// signal amplitude above the discrimination threshold, and a
    /// recognized listen window confirming a tag is actually present.
    fn preflight(&mut self) -> Result<(), Em4x70Error> {
        self.check_abort()?;
        await_signal_threshold(&mut self.hw)?;
        find_listen_window(&mut self.hw)?;
        Ok(())
    }

    /// Run `body`, guaranteeing `finalize` runs whether or not it
    /// succeeds, after energizing the field and completing pre-flight.
    pub fn run<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, Em4x70Error>,
    ) -> Result<T, Em4x70Error> {
        self.setup_field()?;
        let result = self.preflight().and_then(|()| body(self));
        self.finalize();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHw {
        ticks: u32,
        started: bool,
    }

    impl HwInterface for NoopHw {
        type Error = ();
        fn fpga_configure_lf_reader(&mut self) -> Result<(), ()> {
            Ok(())
        }
        fn adc_sample(&mut self) -> Result<u8, ()> {
            Ok(0)
        }
        fn mod_high(&mut self) -> Result<(), ()> {
            Ok(())
        }
        fn mod_low(&mut self) -> Result<(), ()> {
            Ok(())
        }
        fn now_ticks(&mut self) -> u32 {
            self.ticks += 1;
            self.ticks
        }
        fn wait_ticks(&mut self, ticks: u32) {
            self.ticks += ticks;
        }
        fn start_ticks(&mut self) {
            self.started = true;
            self.ticks = 0;
        }
        fn stop_ticks(&mut self) {
            self.started = false;
        }
        fn watchdog_kick(&mut self) {}
        fn button_pressed(&mut self) -> bool {
            false
        }
        fn host_abort_pending(&mut self) -> bool {
            false
        }
    }

    #[test]
    fn setup_field_starts_ticks() {
        let mut session = Session::new(
            NoopHw {
                ticks: 0,
                started: false,
            },
            ReaderConfig::default(),
        );
        session.setup_field().unwrap();
        assert!(session.hw.started);
    }

    #[test]
    fn run_finalizes_even_on_error() {
        let mut session = Session::new(
            NoopHw {
                ticks: 0,
                started: false,
            },
            ReaderConfig::default(),
        );
        let result: Result<(), Em4x70Error> =
            session.run(|_| Err(Em4x70Error::NoAck));
        assert!(result.is_err());
        assert!(!session.hw.started);
    }
}
