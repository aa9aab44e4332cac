//! Reader-to-tag bit modulation.
//!
//! The reader talks first by briefly killing the field (on-off keying). A
//! `0` bit is three segments within one period: a short low notch, a high
//! segment filling out to the 1-period mark, then low again for the rest
//! of the period. A `1` bit leaves the field present (high) for the whole
//! period — no notch at all. This loop is the one place in the crate where
//! timing must be exact and allocation-free: no logging, no heap traffic,
//! nothing but `wait_ticks` and pin writes.

use crate::consts::{fc_to_ticks, BIT_ZERO_NOTCH_FC, PULSE_1_FC};
use crate::hal::HwInterface;

/// Send one bit to the tag over `period_ticks`. `bit = true` holds the
/// field high (unmodulated) for the entire period; `bit = false` notches
/// the field low for [`BIT_ZERO_NOTCH_FC`], brings it high until the
/// 1-period mark, then drops it low again for the remainder of the period.
pub fn send_bit<HW: HwInterface>(hw: &mut HW, bit: bool, period_ticks: u32) {
    if bit {
        let _ = hw.mod_high();
        hw.wait_ticks(period_ticks);
        return;
    }

    let notch_ticks = fc_to_ticks(BIT_ZERO_NOTCH_FC);
    let mid_ticks = fc_to_ticks(PULSE_1_FC);

    let _ = hw.mod_low();
    hw.wait_ticks(notch_ticks);
    let _ = hw.mod_high();
    hw.wait_ticks(mid_ticks.saturating_sub(notch_ticks));
    let _ = hw.mod_low();
    hw.wait_ticks(period_ticks.saturating_sub(mid_ticks));
}

/// Send every bit in `bits` (one bit per byte, nonzero meaning `1`).
pub fn send_bits<HW: HwInterface>(hw: &mut HW, bits: &[u8], period_ticks: u32) {
    for &b in bits {
        send_bit(hw, b != 0, period_ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FULL_PERIOD_TICKS;

    #[derive(Default)]
    struct RecordingHw {
        ticks: u32,
        low_events: heapless::Vec<u32, 64>,
    }

    impl HwInterface for RecordingHw {
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
            let _ = self.low_events.push(self.ticks);
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
    fn one_bit_holds_field_high_for_the_whole_period_with_no_notch() {
        let mut hw = RecordingHw::default();
        send_bit(&mut hw, true, FULL_PERIOD_TICKS);
        assert_eq!(hw.ticks, FULL_PERIOD_TICKS);
        assert!(hw.low_events.is_empty());
    }

    #[test]
    fn zero_bit_notches_low_twice_within_the_period() {
        let mut hw = RecordingHw::default();
        send_bit(&mut hw, false, FULL_PERIOD_TICKS);
        assert_eq!(hw.ticks, FULL_PERIOD_TICKS);
        assert_eq!(hw.low_events.len(), 2);
        assert_eq!(hw.low_events[0], 0);
        assert_eq!(hw.low_events[1], fc_to_ticks(PULSE_1_FC));
    }

    #[test]
    fn sends_one_bit_per_entry() {
        let mut hw = RecordingHw::default();
        send_bits(&mut hw, &[1, 0, 1, 1], FULL_PERIOD_TICKS);
        assert_eq!(hw.ticks, FULL_PERIOD_TICKS * 4);
    }
}
