//! The three request/response shapes every high-level operation is built
//! from, plus the retry policy: up to [`TRANSACTION_MAX_RETRIES`] times the
//! whole find-listen-window-then-send-then-receive sequence is retried; a
//! transaction is never re-sent mid-frame.

use crate::buf::{BitVec, MAX_REPLY_BITS};
use crate::consts::{
    fc_to_ticks, ACK_PULSE_TICKS, FULL_PERIOD_TICKS, TRANSACTION_MAX_RETRIES, T_TWALB_FC,
    T_TWA_FC, T_WEE_FC,
};
use crate::diag::TransactionLog;
use crate::error::Em4x70Error;
use crate::hal::HwInterface;
use crate::listen_window::{find_listen_window, send_rm_request};
use crate::modulator::send_bits;
use crate::receiver::receive_bits;
use crate::timing::{measure_pulse_length, pulse_matches, Edge};

/// Run `attempt` up to [`TRANSACTION_MAX_RETRIES`] times, short-circuiting
/// immediately on [`Em4x70Error::Aborted`].
fn with_retries<T>(
    mut attempt: impl FnMut() -> Result<T, Em4x70Error>,
) -> Result<T, Em4x70Error> {
    let mut last_err = Em4x70Error::NoListenWindow;
    for _ in 0..TRANSACTION_MAX_RETRIES {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(Em4x70Error::Aborted) => return Err(Em4x70Error::Aborted),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

/// Send a command and expect a bit-exact reply of `expected_bits`.
/// Used by ID/UM1/UM2/AUTH.
pub fn send_and_read<HW: HwInterface>(
    hw: &mut HW,
    log: &mut TransactionLog,
    command_bits: &[u8],
    expected_bits: usize,
) -> Result<BitVec<MAX_REPLY_BITS>, Em4x70Error> {
    with_retries(|| {
        let high = find_listen_window(hw)?;
        send_rm_request(hw, FULL_PERIOD_TICKS);

        let started_at = hw.now_ticks();
        send_bits(hw, command_bits, FULL_PERIOD_TICKS);
        let send_end = hw.now_ticks();

        let reply = receive_bits(hw, high, expected_bits)?;
        let receive_end = hw.now_ticks();

        log.record_transmit(started_at, send_end, command_bits);
        log.record_receive(send_end, receive_end, &reply);
        Ok(reply)
    })
}

/// Send a command and expect a single ACK pulse train, with the settle
/// gaps a WRITE needs around the tag's EEPROM cycle. The tag is expected
/// to ACK twice (once for the command, once once the write completes);
/// both are checked.
pub fn send_and_ack<HW: HwInterface>(
    hw: &mut HW,
    log: &mut TransactionLog,
    command_bits: &[u8],
) -> Result<(), Em4x70Error> {
    with_retries(|| {
        let high = find_listen_window(hw)?;
        send_rm_request(hw, FULL_PERIOD_TICKS);

        let started_at = hw.now_ticks();
        send_bits(hw, command_bits, FULL_PERIOD_TICKS);
        let send_end = hw.now_ticks();

        hw.wait_ticks(fc_to_ticks(T_TWA_FC));
        let high_after_first = check_ack(hw, high)?;

        hw.wait_ticks(fc_to_ticks(T_WEE_FC));
        check_ack(hw, high_after_first)?;
        let receive_end = hw.now_ticks();

        log.record_transmit(started_at, send_end, command_bits);
        log.record_receive(send_end, receive_end, &[1, 1]);
        Ok(())
    })
}

/// Send a command, wait `T_TWALB`, check for the tag's ACK, wait `T_WEE`
/// for its EEPROM cycle, then read back a reply of `expected_bits` (used by
/// PIN, which is confirmed by re-reading the tag's ID after the ACK rather
/// than by the ACK alone).
pub fn send_and_wait_and_read<HW: HwInterface>(
    hw: &mut HW,
    log: &mut TransactionLog,
    command_bits: &[u8],
    expected_bits: usize,
) -> Result<BitVec<MAX_REPLY_BITS>, Em4x70Error> {
    with_retries(|| {
        let high = find_listen_window(hw)?;
        send_rm_request(hw, FULL_PERIOD_TICKS);

        let started_at = hw.now_ticks();
        send_bits(hw, command_bits, FULL_PERIOD_TICKS);
        let send_end = hw.now_ticks();

        hw.wait_ticks(fc_to_ticks(T_TWALB_FC));
        let high_after_ack = check_ack(hw, high)?;

        hw.wait_ticks(fc_to_ticks(T_WEE_FC));
        let reply = receive_bits(hw, high_after_ack, expected_bits)?;
        let receive_end = hw.now_ticks();

        log.record_transmit(started_at, send_end, command_bits);
        log.record_receive(send_end, receive_end, &reply);
        Ok(reply)
    })
}

/// An ACK is two consecutive falling pulses of length [`ACK_PULSE_TICKS`];
/// anything else (wrong length, wrong edge direction, or a pulse timeout)
/// is a NAK. The brief return-to-idle between the two notches is consumed
/// without being checked for length, since only its direction (rising)
/// matters to keep the sampler's tracked polarity correct. Returns the
/// sampler's polarity after the ACK for callers that continue reading from
/// the same stream.
pub fn check_ack<HW: HwInterface>(hw: &mut HW, currently_high: bool) -> Result<bool, Em4x70Error> {
    let (len1, edge1) = measure_pulse_length(hw, currently_high)?;
    if edge1 != Edge::Falling || !pulse_matches(len1, ACK_PULSE_TICKS) {
        return Err(Em4x70Error::NoAck);
    }

    let (_, bridge_edge) = measure_pulse_length(hw, false)?;
    let high_before_second = matches!(bridge_edge, Edge::Rising);

    let (len2, edge2) = measure_pulse_length(hw, high_before_second)?;
    if edge2 != Edge::Falling || !pulse_matches(len2, ACK_PULSE_TICKS) {
        return Err(Em4x70Error::NoAck);
    }
    Ok(matches!(edge2, Edge::Rising))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedHw {
        segments: heapless::Vec<(u32, bool), 16>,
        seg_idx: usize,
        seg_elapsed: u32,
        ticks: u32,
    }

    impl ScriptedHw {
        fn from_pulses(pulses: &[(u32, bool)]) -> Self {
            let mut segments = heapless::Vec::new();
            for &p in pulses {
                let _ = segments.push(p);
            }
            Self {
                segments,
                seg_idx: 0,
                seg_elapsed: 0,
                ticks: 0,
            }
        }
    }

    impl HwInterface for ScriptedHw {
        type Error = ();
        fn fpga_configure_lf_reader(&mut self) -> Result<(), ()> {
            Ok(())
        }
        fn adc_sample(&mut self) -> Result<u8, ()> {
            let (len, level) = *self.segments.get(self.seg_idx).unwrap_or(&(1, false));
            self.ticks += 1;
            self.seg_elapsed += 1;
            if self.seg_elapsed >= len && self.seg_idx + 1 < self.segments.len() {
                self.seg_idx += 1;
                self.seg_elapsed = 0;
            }
            Ok(if level { 200 } else { 50 })
        }
        fn mod_high(&mut self) -> Result<(), ()> {
            Ok(())
        }
        fn mod_low(&mut self) -> Result<(), ()> {
            Ok(())
        }
        fn now_ticks(&mut self) -> u32 {
            self.ticks
        }
        fn wait_ticks(&mut self, ticks: u32) {
            self.ticks += ticks;
        }
        fn start_ticks(&mut self) {
            self.ticks = 0;
        }
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
    fn check_ack_accepts_two_falling_ack_length_pulses() {
        let pulses = [
            (ACK_PULSE_TICKS, true),
            (1, false),
            (ACK_PULSE_TICKS, true),
            (1, false),
        ];
        let mut hw = ScriptedHw::from_pulses(&pulses);
        assert!(check_ack(&mut hw, true).is_ok());
    }

    #[test]
    fn check_ack_rejects_wrong_length_pulse() {
        let pulses = [(4, false), (4, true)];
        let mut hw = ScriptedHw::from_pulses(&pulses);
        assert!(check_ack(&mut hw, true).is_err());
    }
}
