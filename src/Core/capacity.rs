// Capacity normalisation for the pipe ring.
//
// Every physical offset is computed as `cursor & mask`, so the ring length
// must always be a power of two.

use crate::error::PipeError;

/// Capacity used when the caller asks for zero bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Smallest ring the pipe will allocate.
pub const MIN_BUFFER_SIZE: usize = 8;

/// Largest ring whose occupancy still fits the 31-bit available field.
pub const MAX_CAPACITY: usize = 1 << 30;

/// A normalised ring capacity together with its index mask.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Capacity {
    size: usize,
    mask: usize,
}

impl Capacity {
    /// Ring length in bytes (always a power of two).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// `size - 1`, used to map a logical cursor to a physical offset.
    #[inline]
    pub fn mask(&self) -> usize {
        self.mask
    }

    /// Validates an adopted storage length without rounding it.
    pub fn exact(len: usize) -> Result<Self, PipeError> {
        if len < MIN_BUFFER_SIZE || len > MAX_CAPACITY || !len.is_power_of_two() {
            return Err(PipeError::InvalidCapacity(len));
        }
        Ok(Self {
            size: len,
            mask: len - 1,
        })
    }
}

/// Number of significant bits in `x` (0 for 0).
#[inline]
pub fn bit_len(x: usize) -> u32 {
    usize::BITS - x.leading_zeros()
}

/// Rounds a requested size to the ring capacity actually allocated.
///
/// * `0` selects [`DEFAULT_BUFFER_SIZE`].
/// * Anything below [`MIN_BUFFER_SIZE`] is clamped up to it.
/// * A size that is not a power of two is rounded up to the next one.
///
/// Requests above [`MAX_CAPACITY`] are rejected.
pub fn normalize_capacity(requested: usize) -> Result<Capacity, PipeError> {
    let size = if requested == 0 {
        DEFAULT_BUFFER_SIZE
    } else if requested < MIN_BUFFER_SIZE {
        MIN_BUFFER_SIZE
    } else if requested > MAX_CAPACITY {
        return Err(PipeError::InvalidCapacity(requested));
    } else if requested & (requested - 1) != 0 {
        1usize << bit_len(requested)
    } else {
        requested
    };
    Capacity::exact(size)
}
