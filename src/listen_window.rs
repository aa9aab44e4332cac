//! Listen-window (LIW) detection and the optional Read-Mode (RM) request.
//!
//! The tag announces a listen window with a fixed four-pulse signature:
//! two rising ~2.5-period pulses followed by a falling ~3-period pulse
//! and a falling ~2-period pulse. The reader free-runs its sampler
//! looking for this signature, retrying up to [`LIW_MAX_RETRIES`] times
//! before giving up.

use crate::consts::{LIW_MAX_RETRIES, RM_BIT_COUNT, RM_GAP_MAX_FC, RM_GAP_MIN_FC, fc_to_ticks};
use crate::error::Em4x70Error;
use crate::hal::HwInterface;
use crate::modulator::send_bit;
use crate::timing::{classify_pulse, measure_pulse_length, sample_level, Edge, PulseLength};

/// Try once to read the four-pulse listen-window signature starting from
/// the current sampler state. Returns `Ok(true)` once recognized, on the
/// reasoning that a caller loops this up to the retry budget.
fn try_match_signature<HW: HwInterface>(
    hw: &mut HW,
    currently_high: bool,
) -> Result<bool, Em4x70Error> {
    let expected = [
        (PulseLength::TwoAndHalf, Edge::Rising),
        (PulseLength::TwoAndHalf, Edge::Rising),
        (PulseLength::Three, Edge::Falling),
        (PulseLength::Two, Edge::Falling),
    ];

    let mut high = currently_high;
    for (want_len, want_edge) in expected {
        let (len, edge) = measure_pulse_length(hw, high)?;
        high = matches!(edge, Edge::Rising);
        match classify_pulse(len) {
            Some(got_len) if got_len == want_len && edge == want_edge => continue,
            _ => return Ok(false),
        }
    }
    Ok(true)
}

/// Search for a listen window, retrying up to [`LIW_MAX_RETRIES`] times.
/// Returns the sampler's polarity immediately after the recognized
/// signature, ready for the caller to optionally emit an RM request or
/// start sending a command.
pub fn find_listen_window<HW: HwInterface>(hw: &mut HW) -> Result<bool, Em4x70Error> {
    let mut high = sample_level(hw, false)?;
    for attempt in 0..LIW_MAX_RETRIES {
        hw.watchdog_kick();
        if hw.host_abort_pending() || hw.button_pressed() {
            return Err(Em4x70Error::Aborted);
        }
        match try_match_signature(hw, high) {
            Ok(true) => return Ok(high),
            Ok(false) => {
                high = sample_level(hw, high)?;
                continue;
            }
            Err(Em4x70Error::PulseTimeout) if attempt + 1 < LIW_MAX_RETRIES => {
                high = sample_level(hw, high)?;
                continue;
            }
            Err(e) => return Err(e),
        }
    }
    Err(Em4x70Error::NoListenWindow)
}

/// Emit the Read-Mode request: two zero bits, after waiting the gap the
/// tag expects between the end of the listen window and the request.
pub fn send_rm_request<HW: HwInterface>(hw: &mut HW, period_ticks: u32) {
    let gap = fc_to_ticks((RM_GAP_MIN_FC + RM_GAP_MAX_FC) / 2);
    hw.wait_ticks(gap);
    for _ in 0..RM_BIT_COUNT {
        send_bit(hw, false, period_ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{PULSE_2_TICKS, PULSE_2_5_TICKS, PULSE_3_TICKS};

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
            let (len, level) = *self
                .segments
                .get(self.seg_idx)
                .unwrap_or(&(1, false));
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
    fn recognizes_exact_signature() {
        let pulses = [
            (PULSE_2_5_TICKS, true),
            (PULSE_2_5_TICKS, true),
            (PULSE_3_TICKS, false),
            (PULSE_2_TICKS, false),
            (1, true),
        ];
        let mut hw = ScriptedHw::from_pulses(&pulses);
        let result = find_listen_window(&mut hw);
        assert!(result.is_ok());
    }

    #[test]
    fn gives_up_after_retry_budget_on_pure_noise() {
        let pulses: [(u32, bool); 1] = [(4, true)];
        let mut hw = ScriptedHw::from_pulses(&pulses);
        let result = find_listen_window(&mut hw);
        assert!(result.is_err());
    }
}
