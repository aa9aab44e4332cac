//! Diagnostic capture of what was sent/received during a transaction,
//! dumped (via the `log` crate) once an operation completes.

use crate::buf::{new_bitvec, BitVec, BoundedPush};

/// Largest bit sequence retained per sub-log (the longest defined reply,
/// UM2 at 64 bits, rounded up for headroom).
pub const MAX_LOG_BITS: usize = 112;

/// One half of a transaction's diagnostic trace: the tick span it covered
/// and the actual bits that crossed the wire, bit-per-byte (nonzero
/// meaning `1`).
#[derive(Debug, Clone)]
pub struct SubLog {
    pub start_tick: u32,
    pub end_tick: u32,
    bits: BitVec<MAX_LOG_BITS>,
}

impl SubLog {
    fn new() -> Self {
        Self {
            start_tick: 0,
            end_tick: 0,
            bits: new_bitvec::<MAX_LOG_BITS>(),
        }
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    fn record(&mut self, start: u32, end: u32, bits: &[u8]) {
        self.start_tick = start;
        self.end_tick = end;
        self.bits = new_bitvec::<MAX_LOG_BITS>();
        for &b in bits {
            self.bits.push_bounded(b);
        }
    }
}

impl Default for SubLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Exactly one transmit/receive pair per transaction, per spec: there is
/// no accumulation across retries, only the most recent attempt.
#[derive(Debug, Clone)]
pub struct TransactionLog {
    pub transmit: SubLog,
    pub receive: SubLog,
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionLog {
    pub fn new() -> Self {
        Self {
            transmit: SubLog::new(),
            receive: SubLog::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn record_transmit(&mut self, start: u32, end: u32, bits: &[u8]) {
        #[cfg(feature = "log")]
        log::trace!(
            "transmit at t={}..{}: {} bits",
            start,
            end,
            bits.len()
        );
        self.transmit.record(start, end, bits);
    }

    pub fn record_receive(&mut self, start: u32, end: u32, bits: &[u8]) {
        #[cfg(feature = "log")]
        log::trace!(
            "receive at t={}..{}: {} bits",
            start,
            end,
            bits.len()
        );
        self.receive.record(start, end, bits);
    }
}
