//! Pulse measurement and classification against the tick-domain constants
//! in [`crate::consts`].

use crate::consts::{
    HIGH_THRESHOLD, LOW_THRESHOLD, PULSE_1_5_TICKS, PULSE_1_TICKS, PULSE_2_5_TICKS, PULSE_2_TICKS,
    PULSE_3_TICKS, PULSE_TOLERANCE_TICKS, SIGNAL_PRESENCE_TICKS,
};
use crate::error::Em4x70Error;
use crate::hal::HwInterface;

/// Discriminate a raw ADC sample against the hysteresis band: `Some(true)`
/// above [`HIGH_THRESHOLD`], `Some(false)` below [`LOW_THRESHOLD`], `None`
/// inside the band (no new polarity information).
pub fn classify_sample(raw: u8) -> Option<bool> {
    if raw > HIGH_THRESHOLD {
        Some(true)
    } else if raw < LOW_THRESHOLD {
        Some(false)
    } else {
        None
    }
}

/// Take one discriminated sample, falling back to `previous` when the raw
/// reading falls inside the hysteresis band.
pub fn sample_level<HW: HwInterface>(hw: &mut HW, previous: bool) -> Result<bool, Em4x70Error> {
    let raw = hw.adc_sample().map_err(|_| Em4x70Error::NoSignal)?;
    Ok(classify_sample(raw).unwrap_or(previous))
}

/// Block until the signal amplitude rises above [`HIGH_THRESHOLD`], within
/// [`SIGNAL_PRESENCE_TICKS`]. Used as a pre-flight check that a tag is
/// actually in the field before the reader commits to a transaction.
pub fn await_signal_threshold<HW: HwInterface>(hw: &mut HW) -> Result<(), Em4x70Error> {
    let start = hw.now_ticks();
    loop {
        let raw = hw.adc_sample().map_err(|_| Em4x70Error::NoSignal)?;
        if raw > HIGH_THRESHOLD {
            return Ok(());
        }
        if hw.now_ticks().wrapping_sub(start) > SIGNAL_PRESENCE_TICKS {
            return Err(Em4x70Error::NoSignal);
        }
    }
}

/// Direction of the edge that terminated a measured pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// The nominal length classes a demodulated pulse can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseLength {
    One,
    OneAndHalf,
    Two,
    TwoAndHalf,
    Three,
}

impl PulseLength {
    pub const fn nominal_ticks(self) -> u32 {
        match self {
            PulseLength::One => PULSE_1_TICKS,
            PulseLength::OneAndHalf => PULSE_1_5_TICKS,
            PulseLength::Two => PULSE_2_TICKS,
            PulseLength::TwoAndHalf => PULSE_2_5_TICKS,
            PulseLength::Three => PULSE_3_TICKS,
        }
    }
}

/// Whether `measured` falls within tolerance of `nominal`.
pub fn pulse_matches(measured: u32, nominal: u32) -> bool {
    measured.abs_diff(nominal) <= PULSE_TOLERANCE_TICKS
}

/// Classify a measured pulse length against every known nominal length,
/// returning the first match (the nominal lengths are spaced far enough
/// apart given the tolerance band that at most one can match).
pub fn classify_pulse(measured: u32) -> Option<PulseLength> {
    for len in [
        PulseLength::One,
        PulseLength::OneAndHalf,
        PulseLength::Two,
        PulseLength::TwoAndHalf,
        PulseLength::Three,
    ] {
        if pulse_matches(measured, len.nominal_ticks()) {
            return Some(len);
        }
    }
    None
}

/// Upper bound, in ticks, the receiver will wait for a single edge before
/// declaring the channel dead. Set well above the longest defined pulse
/// (3 carrier periods) so a genuinely absent edge is distinguishable from
/// jitter on a long pulse.
pub const EDGE_TIMEOUT_TICKS: u32 = PULSE_3_TICKS * 2;

/// Measure the length of the next pulse on the sampled envelope: waits for
/// the channel to leave its current state, then waits for it to return,
/// returning the tick length of that excursion and the edge direction that
/// ended it.
pub fn measure_pulse_length<HW: HwInterface>(
    hw: &mut HW,
    currently_high: bool,
) -> Result<(u32, Edge), Em4x70Error> {
    let start = hw.now_ticks();
    let mut level = currently_high;
    loop {
        let raw = hw.adc_sample().map_err(|_| Em4x70Error::PulseTimeout)?;
        level = classify_sample(raw).unwrap_or(level);
        if level != currently_high {
            let elapsed = hw.now_ticks().wrapping_sub(start);
            let edge = if level { Edge::Rising } else { Edge::Falling };
            return Ok((elapsed, edge));
        }
        if hw.now_ticks().wrapping_sub(start) > EDGE_TIMEOUT_TICKS {
            return Err(Em4x70Error::PulseTimeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{PULSE_1_TICKS, PULSE_2_TICKS};

    #[test]
    fn matches_within_tolerance() {
        assert!(pulse_matches(PULSE_1_TICKS, PULSE_1_TICKS));
        assert!(pulse_matches(
            PULSE_1_TICKS + PULSE_TOLERANCE_TICKS,
            PULSE_1_TICKS
        ));
        assert!(!pulse_matches(
            PULSE_1_TICKS + PULSE_TOLERANCE_TICKS + 1,
            PULSE_1_TICKS
        ));
    }

    #[test]
    fn classifies_nominal_lengths() {
        assert_eq!(classify_pulse(PULSE_1_TICKS), Some(PulseLength::One));
        assert_eq!(classify_pulse(PULSE_2_TICKS), Some(PulseLength::Two));
        assert_eq!(classify_pulse(0), None);
    }
}
