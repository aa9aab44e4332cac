//! Bounded-collection plumbing shared between the `std` and `no_std`
//! builds, mirroring the `#[cfg(feature = "std")]` / `#[cfg(not(...))]`
//! split the teacher crate uses for its own receive buffers.

#[cfg(not(feature = "std"))]
use heapless::Vec as HVec;
#[cfg(feature = "std")]
use std::vec::Vec as SVec;

/// Maximum number of bits tracked for one command bitstream (largest is
/// the WRITE command at 45 bits; rounded up for headroom).
pub const MAX_CMD_BITS: usize = 64;

/// Maximum number of bits tracked for one tag reply, bit-per-byte (the
/// largest reply is UM2 at 64 bits).
pub const MAX_REPLY_BITS: usize = 64;

#[cfg(not(feature = "std"))]
pub type BitVec<const N: usize> = HVec<u8, N>;
#[cfg(feature = "std")]
pub type BitVec<const N: usize> = SVec<u8>;

/// A push that never panics: in `no_std` builds it silently drops bits
/// once the bounded buffer is full (an over-long reply is already a
/// protocol error the caller will detect via a length check), and in
/// `std` builds it simply grows the `Vec`.
pub trait BoundedPush<T> {
    fn push_bounded(&mut self, value: T);
}

#[cfg(not(feature = "std"))]
impl<T, const N: usize> BoundedPush<T> for HVec<T, N> {
    fn push_bounded(&mut self, value: T) {
        let _ = self.push(value);
    }
}

#[cfg(feature = "std")]
impl<T> BoundedPush<T> for SVec<T> {
    fn push_bounded(&mut self, value: T) {
        self.push(value);
    }
}

pub fn new_bitvec<const N: usize>() -> BitVec<N> {
    #[cfg(not(feature = "std"))]
    {
        HVec::new()
    }
    #[cfg(feature = "std")]
    {
        SVec::new()
    }
}
