//! Error taxonomy for the reader-side protocol engine.

use thiserror::Error;

/// Everything that can go wrong while talking to an EM4x70-family tag.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Em4x70Error {
    /// No carrier edges were observed at all within the sampling window.
    #[error("no signal detected on the LF channel")]
    NoSignal,

    /// The listen-window pulse signature was never found within the retry
    /// budget.
    #[error("listen window not found after retry budget exhausted")]
    NoListenWindow,

    /// A reply was expected to begin with a recognizable header but none
    /// arrived before the pulse timeout.
    #[error("tag reply header not found")]
    HeaderNotFound,

    /// The tag's reply ended before the expected number of bits arrived.
    #[error("short read: expected {expected} bits, got {got}")]
    ShortRead { expected: usize, got: usize },

    /// The tag did not acknowledge a command that requires one.
    #[error("tag did not acknowledge command")]
    NoAck,

    /// A single pulse exceeded the maximum time the receiver will wait for
    /// an edge before declaring the channel dead.
    #[error("timed out waiting for a pulse edge")]
    PulseTimeout,

    /// The operation was cancelled by the host (button press or explicit
    /// abort request) before it completed.
    #[error("operation aborted by host")]
    Aborted,
}
