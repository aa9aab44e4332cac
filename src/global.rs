//! Optional global `Session` cell for hosts that need to reach the same
//! session from both a main dispatch loop and an interrupt handler (for
//! example, a button-abort ISR setting a flag `Session::check_abort`
//! picks up on its next call). Mirrors the teacher crate's
//! `timer::isr` global-driver-in-a-mutex pattern, adapted from a
//! periodically-ticked driver to a plain shared session handle.

use core::cell::RefCell;
use critical_section::Mutex;

use crate::hal::HwInterface;
use crate::session::Session;

/// A `critical-section`-guarded cell holding at most one `Session`.
/// Intended to be stored in a `static`; see [`with_session`].
pub type GlobalSession<HW> = Mutex<RefCell<Option<Session<HW>>>>;

/// Build an empty global session cell, to be assigned to a `static`.
pub const fn global_session_init<HW: HwInterface>() -> GlobalSession<HW> {
    Mutex::new(RefCell::new(None))
}

/// Install `session` into the global cell, replacing whatever was there.
pub fn global_session_setup<HW: HwInterface>(cell: &GlobalSession<HW>, session: Session<HW>) {
    critical_section::with(|cs| {
        cell.borrow(cs).replace(Some(session));
    });
}

/// Run `f` with exclusive access to the installed session, if any.
/// Returns `None` if no session has been installed yet.
pub fn with_session<HW: HwInterface, R>(
    cell: &GlobalSession<HW>,
    f: impl FnOnce(&mut Session<HW>) -> R,
) -> Option<R> {
    critical_section::with(|cs| {
        let mut slot = cell.borrow(cs).borrow_mut();
        slot.as_mut().map(f)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ReaderConfig;

    struct NoopHw;
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
            0
        }
        fn wait_ticks(&mut self, _ticks: u32) {}
        fn start_ticks(&mut self) {}
        fn stop_ticks(&mut self) {}
        fn watchdog_kick(&mut self) {}
        fn button_pressed(&mut self) -> bool {
            false
        }
        fn host_abort_pending(&mut self) -> bool {
            false
        }
    }

    #[test]
    fn with_session_is_none_before_setup() {
        static CELL: GlobalSession<NoopHw> = global_session_init();
        let result = with_session(&CELL, |_s| 1);
        assert_eq!(result, None);
    }

    #[test]
    fn with_session_runs_after_setup() {
        static CELL: GlobalSession<NoopHw> = global_session_init();
        global_session_setup(&CELL, Session::new(NoopHw, ReaderConfig::default()));
        let result = with_session(&CELL, |_s| 42);
        assert_eq!(result, Some(42));
    }
}
