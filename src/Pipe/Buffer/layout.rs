use crossbeam_utils::{Backoff, CachePadded};
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::{AcqRel, Acquire};

use crate::Pipe::Structs::Header_Structs::HeaderSnapshot;

/// The pipe's control word: close flag, read cursor and available count
/// packed into one `u64`.
///
/// The word is only ever mutated through compare-and-swap, so producers and
/// consumers on any number of handles see one linear sequence of header
/// transitions. Padded to prevent false sharing with the storage pointer and
/// the signals that follow it.
#[repr(C, align(128))]
pub struct PackedHeader {
    bits: CachePadded<AtomicU64>,
}

impl Default for PackedHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl PackedHeader {
    pub fn new() -> Self {
        Self {
            bits: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Single atomic read of all three fields.
    #[inline]
    pub fn load(&self) -> HeaderSnapshot {
        HeaderSnapshot::decode(self.bits.load(Acquire))
    }

    /// Read-compute-commit loop.
    ///
    /// `f` sees the current header and returns the new raw word, or an error
    /// to abandon the update. The word is replaced only if it did not change
    /// since it was read; otherwise the whole sequence runs again. Returns the
    /// header that was replaced together with the one that was installed.
    pub fn update<F, E>(&self, mut f: F) -> Result<(HeaderSnapshot, HeaderSnapshot), E>
    where
        F: FnMut(HeaderSnapshot) -> Result<u64, E>,
    {
        let backoff = Backoff::new();
        let mut current = self.bits.load(Acquire);
        loop {
            let old = HeaderSnapshot::decode(current);
            let next = f(old)?;
            match self
                .bits
                .compare_exchange_weak(current, next, AcqRel, Acquire)
            {
                Ok(_) => return Ok((old, HeaderSnapshot::decode(next))),
                Err(actual) => {
                    // logical contention, retry with the fresh word
                    current = actual;
                    backoff.spin();
                }
            }
        }
    }
}
