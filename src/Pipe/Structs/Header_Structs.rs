// Decoded view of the packed pipe header.

// no atomics in HeaderSnapshot; it is a plain copy of one header load

/// Highest bit of the header word: the pipe has been shut down.
pub const CLOSE_FLAG: u64 = 1 << 63;

/// Width mask of the read cursor and of the available count.
pub const LOW_31_BITS: u64 = (1 << 31) - 1;

/// Bit position of the read cursor inside the header word.
pub const READ_POS_SHIFT: u32 = 32;

/// One atomic read of the header word, split into its fields.
///
/// Layout of `raw`:
/// - bit 63: closed flag
/// - bits 32..=62: read cursor (logical offset mod 2^31)
/// - bit 31: unused
/// - bits 0..=30: bytes written but not yet consumed
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSnapshot {
    pub raw: u64,
    pub closed: bool,
    pub read_pos: usize,
    pub available: usize,
}

impl HeaderSnapshot {
    pub fn decode(raw: u64) -> Self {
        Self {
            raw,
            closed: raw & CLOSE_FLAG != 0,
            read_pos: ((raw >> READ_POS_SHIFT) & LOW_31_BITS) as usize,
            available: (raw & LOW_31_BITS) as usize,
        }
    }

    /// Packs the three fields back into a header word.
    pub fn pack(closed: bool, read_pos: usize, available: usize) -> u64 {
        let flag = if closed { CLOSE_FLAG } else { 0 };
        flag | (((read_pos as u64) & LOW_31_BITS) << READ_POS_SHIFT)
            | ((available as u64) & LOW_31_BITS)
    }

    /// Logical offset of the first free byte (mod 2^31).
    #[inline]
    pub fn write_pos(&self) -> usize {
        (self.read_pos + self.available) & LOW_31_BITS as usize
    }

    /// Bytes that can be produced before the ring is full.
    #[inline]
    pub fn free(&self, capacity: usize) -> usize {
        capacity.saturating_sub(self.available)
    }

    /// Header after producing `n` bytes: cursor unchanged, more available.
    pub fn with_produced(&self, n: usize) -> u64 {
        Self::pack(self.closed, self.read_pos, self.available + n)
    }

    /// Header after consuming `n` bytes: cursor advanced with 31-bit wrap,
    /// available reduced by the same amount.
    pub fn with_consumed(&self, n: usize) -> u64 {
        Self::pack(self.closed, self.read_pos + n, self.available - n)
    }

    /// Same cursor and count, close bit set.
    pub fn with_closed(&self) -> u64 {
        self.raw | CLOSE_FLAG
    }
}
