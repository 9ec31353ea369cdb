// This is the shared ring behind every pipe handle - one per pipe

use super::layout::PackedHeader;
use crate::Core::signal::Signal;

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicBool, AtomicU8};
use std::sync::Arc;

/// The shared buffer core: byte storage, packed header and the two
/// data-flow signals.
///
/// A core is created once and then shared (`Arc`) by every handle derived
/// from it. Handles never copy the storage; their only private state is an
/// optional [`HandleMutex`](crate::Pipe::mutex::HandleMutex).
///
/// ### Concurrency Design:
/// - **Header**: close flag, read cursor and available count live in one
///   atomic word and change only through compare-and-swap.
/// - **Storage**: bytes are stored in atomic cells so concurrent copies are
///   always defined; ordering comes from the acquire/release header CAS.
///   A writer copies bytes first and publishes them by raising `available`;
///   a reader copies bytes first and releases them by advancing the cursor.
/// - **Writers**: one writer at a time across all handles holds the write
///   claim for its check, copy and commit. The claim is never held while
///   blocked.
/// - **Signals**: `data_ready` wakes blocked readers, `space_free` wakes
///   blocked writers. Both coalesce and both are released on close.
pub struct SharedBuffer {
    /// Close flag, read cursor and available count.
    pub(crate) header: PackedHeader,

    /// Held by the one writer between reading free space and committing.
    pub(crate) writing: CachePadded<AtomicBool>,

    /// Ring storage, `capacity` cells long.
    pub(crate) storage: Box<[AtomicU8]>,

    /// The capacity of the ring in bytes (a power of two).
    pub(crate) capacity: usize,

    /// A bitmask used to wrap cursors around the ring.
    /// Calculated as `capacity - 1`.
    pub(crate) mask: usize,

    /// Fired after bytes are produced.
    pub(crate) data_ready: Arc<Signal>,

    /// Fired after bytes are consumed.
    pub(crate) space_free: Arc<Signal>,
}

impl std::fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_shared_buffer(self, f)
    }
}
