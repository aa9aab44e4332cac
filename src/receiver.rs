//! Tag-to-reader demodulation: header detection and pulse-to-bit decode.
//!
//! Tag replies are Manchester-like: a transition exactly mid-period
//! encodes a bit directly from its direction, while the absence of a
//! mid-period transition merges two bit periods into one longer pulse.
//! Concretely, after classifying a measured pulse against the nominal
//! lengths in [`crate::timing`]:
//!
//! - a ~1-period pulse is one bit, whose value is the direction of the
//!   edge that ended it (rising = `1`, falling = `0`);
//! - a ~1.5-period pulse packs two bits: the edge direction gives the
//!   first, and Manchester's self-inverting property gives the second as
//!   its complement;
//! - a ~2-period pulse is one bit with no information in the edge
//!   direction (the period elapsed with no mid-bit transition), so it
//!   carries forward the current polarity unchanged.

use crate::buf::{new_bitvec, BitVec, BoundedPush, MAX_REPLY_BITS};
use crate::consts::FULL_PERIOD_TICKS;
use crate::error::Em4x70Error;
use crate::hal::HwInterface;
use crate::timing::{classify_pulse, measure_pulse_length, Edge, PulseLength};

fn bit_from_edge(edge: Edge) -> bool {
    matches!(edge, Edge::Rising)
}

/// Decode one measured pulse into the one or two bits it represents,
/// given the edge that terminated it.
fn pulse_to_bits(length: PulseLength, edge: Edge, out: &mut impl FnMut(bool)) {
    let first = bit_from_edge(edge);
    match length {
        PulseLength::One | PulseLength::Two => out(first),
        PulseLength::OneAndHalf => {
            out(first);
            out(!first);
        }
        PulseLength::TwoAndHalf | PulseLength::Three => {
            // Only meaningful inside a listen-window signature; a reply
            // body should never produce these lengths.
            out(first);
        }
    }
}

/// Wait for and lock onto the tag's reply header: skip 6 full periods of
/// settle time, scan up to 16 pulses for the first 1.5-period transition
/// (the header's leading edge), then consume the 3 full-period pulses that
/// make up the rest of the header before the main decode loop starts.
fn detect_header<HW: HwInterface>(hw: &mut HW, initial_high: bool) -> Result<bool, Em4x70Error> {
    hw.wait_ticks(FULL_PERIOD_TICKS * 6);

    let mut currently_high = initial_high;
    let mut found = false;
    for _ in 0..16 {
        let (len, edge) = measure_pulse_length(hw, currently_high)?;
        currently_high = matches!(edge, Edge::Rising);
        if classify_pulse(len) == Some(PulseLength::OneAndHalf) {
            found = true;
            break;
        }
    }
    if !found {
        return Err(Em4x70Error::HeaderNotFound);
    }

    for _ in 0..3 {
        let (len, edge) = measure_pulse_length(hw, currently_high)?;
        currently_high = matches!(edge, Edge::Rising);
        if classify_pulse(len) != Some(PulseLength::Two) {
            return Err(Em4x70Error::HeaderNotFound);
        }
    }
    Ok(currently_high)
}

/// Receive exactly `expected_bits` bits from the tag, bit-per-byte
/// (nonzero meaning `1`), following the header. `expected_bits` must not
/// exceed [`MAX_REPLY_BITS`] — the largest defined reply (UM2) fits
/// exactly.
pub fn receive_bits<HW: HwInterface>(
    hw: &mut HW,
    initial_high: bool,
    expected_bits: usize,
) -> Result<BitVec<MAX_REPLY_BITS>, Em4x70Error> {
    let mut currently_high = detect_header(hw, initial_high)?;
    let mut bits: BitVec<MAX_REPLY_BITS> = new_bitvec::<MAX_REPLY_BITS>();

    while bits.len() < expected_bits {
        let (len, edge) = measure_pulse_length(hw, currently_high)?;
        currently_high = matches!(edge, Edge::Rising);
        let length = classify_pulse(len).ok_or(Em4x70Error::ShortRead {
            expected: expected_bits,
            got: bits.len(),
        })?;
        let mut push = |bit: bool| bits.push_bounded(if bit { 1 } else { 0 });
        pulse_to_bits(length, edge, &mut push);
    }

    if bits.len() != expected_bits {
        return Err(Em4x70Error::ShortRead {
            expected: expected_bits,
            got: bits.len(),
        });
    }
    Ok(bits)
}

/// Pack arrival bits (as produced by [`receive_bits`]) into bytes: chunk
/// into 8-bit MSB-first groups in arrival order, then reverse the chunk
/// order so the earliest-arrived chunk becomes the last output byte.
pub fn pack_bits<const N: usize>(bits: &[u8]) -> BitVec<N> {
    let mut bytes: BitVec<N> = new_bitvec::<N>();
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &b) in chunk.iter().enumerate() {
            if b != 0 {
                byte |= 0x80 >> i;
            }
        }
        bytes.push_bounded(byte);
    }
    let len = bytes.len();
    for i in 0..len / 2 {
        bytes.swap(i, len - 1 - i);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_bits_reverses_chunk_order() {
        // Two full bytes' worth of arrival bits: 0xA5 then 0x3C, MSB first.
        let bits: [u8; 16] = [
            1, 0, 1, 0, 0, 1, 0, 1, // 0xA5
            0, 0, 1, 1, 1, 1, 0, 0, // 0x3C
        ];
        let packed: BitVec<4> = pack_bits::<4>(&bits);
        assert_eq!(&packed[..], &[0x3C, 0xA5]);
    }

    #[test]
    fn pulse_to_bits_one_and_half_yields_complementary_pair() {
        let mut out = heapless::Vec::<bool, 2>::new();
        let mut push = |b: bool| {
            let _ = out.push(b);
        };
        pulse_to_bits(PulseLength::OneAndHalf, Edge::Rising, &mut push);
        assert_eq!(&out[..], &[true, false]);
    }
}
