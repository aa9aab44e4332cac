//! Protocol timing and framing constants for the EM4x70 family.
//!
//! All tick-domain constants are derived from `TICKS_PER_FC`, the number of
//! hardware timer ticks in one tag carrier cycle (125 kHz / 12 => ~1.5 MHz
//! tick rate, matching the reader's ADC sample clock). Keeping every
//! duration as a multiple of `TICKS_PER_FC` means the receiver never has to
//! reach for floating point to classify a pulse.

/// Timer ticks per tag carrier cycle (125 kHz field, divided RF clock).
pub const TICKS_PER_FC: u32 = 12;

/// One full bit period, in carrier cycles (Manchester-like: a bit spans
/// either ~1 or ~1.5 or ~2 carrier periods depending on the encoded value).
pub const FULL_PERIOD_FC: u32 = 32;
pub const FULL_PERIOD_TICKS: u32 = FULL_PERIOD_FC * TICKS_PER_FC;

/// Length, in carrier cycles, of the low notch that opens a `0` bit on the
/// reader-to-tag link.
pub const BIT_ZERO_NOTCH_FC: u32 = 4;

/// Nominal pulse lengths, in carrier cycles, before conversion to ticks.
pub const PULSE_1_FC: u32 = 16;
pub const PULSE_1_5_FC: u32 = 24;
pub const PULSE_2_FC: u32 = 32;
pub const PULSE_2_5_FC: u32 = 40;
pub const PULSE_3_FC: u32 = 48;

/// Tolerance band, in carrier cycles, applied on both sides of a nominal
/// pulse length when classifying a measured pulse.
pub const PULSE_TOLERANCE_FC: u32 = 4;

pub const fn fc_to_ticks(fc: u32) -> u32 {
    fc * TICKS_PER_FC
}

pub const PULSE_1_TICKS: u32 = fc_to_ticks(PULSE_1_FC);
pub const PULSE_1_5_TICKS: u32 = fc_to_ticks(PULSE_1_5_FC);
pub const PULSE_2_TICKS: u32 = fc_to_ticks(PULSE_2_FC);
pub const PULSE_2_5_TICKS: u32 = fc_to_ticks(PULSE_2_5_FC);
pub const PULSE_3_TICKS: u32 = fc_to_ticks(PULSE_3_FC);
pub const PULSE_TOLERANCE_TICKS: u32 = fc_to_ticks(PULSE_TOLERANCE_FC);

/// Length, in carrier cycles, of each of the two falling pulses that make
/// up an ACK (twice a full bit period).
pub const ACK_PULSE_FC: u32 = FULL_PERIOD_FC * 2;
pub const ACK_PULSE_TICKS: u32 = fc_to_ticks(ACK_PULSE_FC);

/// ADC sample midpoint and the hysteresis band around it used to
/// discriminate a high/low envelope sample; a sample inside the band is
/// ambiguous and carries no new polarity information.
pub const SAMPLE_MIDPOINT: u8 = 127;
pub const SAMPLE_HYSTERESIS: u8 = 13;
pub const HIGH_THRESHOLD: u8 = SAMPLE_MIDPOINT + SAMPLE_HYSTERESIS;
pub const LOW_THRESHOLD: u8 = SAMPLE_MIDPOINT - SAMPLE_HYSTERESIS;

/// Field settle time after configuring the LF reader, in ticks (50 ms at
/// the reader's ~1.5 ticks/µs clock).
pub const FIELD_SETTLE_TICKS: u32 = 75_000;

/// Budget, in ticks, an operation's pre-flight check waits for the signal
/// amplitude to rise above [`HIGH_THRESHOLD`] before giving up (32 tag
/// periods).
pub const SIGNAL_PRESENCE_TICKS: u32 = FULL_PERIOD_TICKS * 32;

/// Maximum number of listen-window search attempts before giving up.
pub const LIW_MAX_RETRIES: u32 = 50;

/// Gap, in carrier cycles, the reader waits after a recognized listen
/// window before optionally emitting the Read-Mode (RM) request.
pub const RM_GAP_NOMINAL_FC: u32 = 40;
pub const RM_GAP_MIN_FC: u32 = 24;
pub const RM_GAP_MAX_FC: u32 = 48;

/// Number of zero bits that make up an RM request.
pub const RM_BIT_COUNT: usize = 2;

/// Maximum number of times a transaction-level send/listen-window sequence
/// is retried before the operation fails. Only the listen-window search
/// retries; a transaction is never re-sent mid-frame.
pub const TRANSACTION_MAX_RETRIES: u32 = 5;

/// Gap, in carrier cycles, between a WRITE command and the tag's
/// acknowledgement pulse train.
pub const T_TWA_FC: u32 = 128;
/// Gap, in carrier cycles, the reader waits for the tag to finish an
/// EEPROM write cycle before it may issue the next command.
pub const T_WEE_FC: u32 = 3_072;
/// Gap, in carrier cycles, the reader waits after a PIN write before
/// re-reading the tag's ID to confirm the unlock took effect.
pub const T_TWALB_FC: u32 = 672;

/// Byte layout of a `TagImage`, expressed as 2-byte block addresses
/// (`addr` as used on the wire in READ/WRITE commands).
pub mod blocks {
    pub const UM1_ADDR: u8 = 0;
    pub const ID_ADDR: u8 = 2;
    pub const KEY_ADDR_START: u8 = 4;
    pub const KEY_ADDR_END: u8 = 9;
    pub const RESERVED_ADDR_START: u8 = 10;
    pub const RESERVED_ADDR_END: u8 = 11;
    pub const UM2_ADDR: u8 = 12;

    /// Byte offset of a 2-byte block within a 32-byte `TagImage`.
    pub const fn block_offset(addr: u8) -> usize {
        addr as usize * 2
    }
}

/// Sizes, in bytes, of the values the host-facing API exchanges.
pub mod sizes {
    pub const UM1_LEN: usize = 4;
    pub const ID_LEN: usize = 4;
    pub const UM2_LEN: usize = 8;
    pub const KEY_LEN: usize = 12;
    pub const WORD_LEN: usize = 2;
    pub const AUTH_CHALLENGE_LEN: usize = 7;
    pub const AUTH_RESPONSE_LEN: usize = 3;
}
