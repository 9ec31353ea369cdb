use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::atomic::{AtomicBool, AtomicU8};
use std::sync::Arc;

use crossbeam_utils::{Backoff, CachePadded};

use super::layout::PackedHeader;
use super::Buffer::SharedBuffer;
use crate::error::PipeError;
use crate::Core::cancel::CancelToken;
use crate::Core::capacity::{normalize_capacity, Capacity};
use crate::Core::signal::Signal;
use crate::Pipe::Structs::Header_Structs::HeaderSnapshot;

/// Why a commit did not go through.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Commit {
    /// The header moved since the copy; redo it from a fresh snapshot.
    Stale,
    /// The pipe was closed before the write was published.
    Closed,
}

/// Exclusive right to produce into a core, released on drop.
pub(crate) struct WriteClaim<'a> {
    core: &'a SharedBuffer,
}

impl Drop for WriteClaim<'_> {
    fn drop(&mut self) {
        self.core.writing.store(false, Release);
    }
}

impl SharedBuffer {
    /// Allocate a zeroed ring of `requested` bytes, rounded by
    /// [`normalize_capacity`].
    pub fn new(requested: usize) -> Result<Self, PipeError> {
        let cap = normalize_capacity(requested)?;
        let storage = (0..cap.size()).map(|_| AtomicU8::new(0)).collect();
        Ok(Self::from_parts(storage, cap))
    }

    /// Adopt an existing byte array as ring storage. Its length must already
    /// be a valid capacity; the pipe starts empty regardless of contents.
    pub fn with_storage(mem: Vec<u8>) -> Result<Self, PipeError> {
        let cap = Capacity::exact(mem.len())?;
        let storage = mem.into_iter().map(AtomicU8::new).collect();
        Ok(Self::from_parts(storage, cap))
    }

    fn from_parts(storage: Box<[AtomicU8]>, cap: Capacity) -> Self {
        tracing::debug!(capacity = cap.size(), "pipe buffer created");
        Self {
            header: PackedHeader::new(),
            writing: CachePadded::new(AtomicBool::new(false)),
            storage,
            capacity: cap.size(),
            mask: cap.mask(),
            data_ready: Arc::new(Signal::new()),
            space_free: Arc::new(Signal::new()),
        }
    }

    /// Buffer size in bytes, fixed after creation.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn mask(&self) -> usize {
        self.mask
    }

    /// One atomic read of close flag, read cursor and available count.
    #[inline]
    pub fn load_header(&self) -> HeaderSnapshot {
        self.header.load()
    }

    /// Compare-and-swap updater over the header; see [`PackedHeader::update`].
    pub fn update_header<F, E>(&self, f: F) -> Result<(HeaderSnapshot, HeaderSnapshot), E>
    where
        F: FnMut(HeaderSnapshot) -> Result<u64, E>,
    {
        self.header.update(f)
    }

    /// Pure read of the close bit.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.header.load().closed
    }

    /// Rejects a transfer that no amount of waiting could satisfy.
    #[inline]
    pub fn check_transfer(&self, requested: usize) -> Result<(), PipeError> {
        if requested > self.capacity {
            return Err(PipeError::Overcapacity {
                requested,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Set the close bit. The call that flips it releases both data-flow
    /// signals and returns `true`; every later call is a no-op returning
    /// `false`.
    pub fn close(&self) -> bool {
        let res = self.header.update(|hs| {
            if hs.closed {
                return Err(());
            }
            Ok(hs.with_closed())
        });
        match res {
            Ok((old, _)) => {
                tracing::debug!(
                    read_pos = old.read_pos,
                    available = old.available,
                    "pipe buffer closed"
                );
                self.data_ready.release();
                self.space_free.release();
                true
            }
            Err(()) => false,
        }
    }

    /// Take the write claim, spinning while another writer holds it.
    ///
    /// Holders only check, copy and commit, so the wait is short.
    pub(crate) fn claim_write(&self) -> WriteClaim<'_> {
        let backoff = Backoff::new();
        while self
            .writing
            .compare_exchange_weak(false, true, Acquire, Relaxed)
            .is_err()
        {
            backoff.snooze();
        }
        WriteClaim { core: self }
    }

    /// Publish `n` bytes copied at `seen.write_pos()`.
    ///
    /// Goes through only while the write position is unchanged and the
    /// bytes still fit, so `available` never exceeds the capacity. Readers
    /// may move the cursor concurrently; that frees space but never moves
    /// the write position.
    pub(crate) fn commit_write(
        &self,
        seen: HeaderSnapshot,
        n: usize,
    ) -> Result<HeaderSnapshot, Commit> {
        let capacity = self.capacity;
        let (_, new) = self.header.update(|hs| {
            if hs.closed {
                return Err(Commit::Closed);
            }
            if hs.write_pos() != seen.write_pos() || hs.available + n > capacity {
                return Err(Commit::Stale);
            }
            Ok(hs.with_produced(n))
        })?;
        Ok(new)
    }

    /// Release `n` bytes copied from `seen.read_pos`.
    ///
    /// Only succeeds while the cursor is still where the copy started, so two
    /// readers can never both consume the same bytes.
    pub(crate) fn commit_read(
        &self,
        seen: HeaderSnapshot,
        n: usize,
    ) -> Result<HeaderSnapshot, Commit> {
        let (_, new) = self.header.update(|hs| {
            if hs.read_pos != seen.read_pos || hs.available < n {
                return Err(Commit::Stale);
            }
            Ok(hs.with_consumed(n))
        })?;
        Ok(new)
    }

    /// Copy `src` into the ring starting at logical offset `pos`.
    pub(crate) fn copy_in(&self, pos: usize, src: &[u8]) {
        for (i, byte) in src.iter().enumerate() {
            self.storage[(pos + i) & self.mask].store(*byte, Relaxed);
        }
    }

    /// Copy `dst.len()` bytes out of the ring starting at logical offset `pos`.
    pub(crate) fn copy_out(&self, pos: usize, dst: &mut [u8]) {
        for (i, byte) in dst.iter_mut().enumerate() {
            *byte = self.storage[(pos + i) & self.mask].load(Relaxed);
        }
    }

    /// Block until a writer might find more free space.
    pub(crate) fn wait_space(&self, cancel: Option<&CancelToken>) -> Result<(), PipeError> {
        match cancel {
            Some(token) => self.space_free.wait_cancellable(token),
            None => self.space_free.wait(),
        }
    }

    /// Block until a reader might find more data.
    pub(crate) fn wait_data(&self, cancel: Option<&CancelToken>) -> Result<(), PipeError> {
        match cancel {
            Some(token) => self.data_ready.wait_cancellable(token),
            None => self.data_ready.wait(),
        }
    }

    /// Signal readers that new data is available
    #[inline]
    pub fn signal_consumer(&self) {
        self.data_ready.notify();
    }

    /// Signal writers that space was freed
    #[inline]
    pub fn signal_producer(&self) {
        self.space_free.notify();
    }

    pub fn data_ready(&self) -> &Arc<Signal> {
        &self.data_ready
    }

    pub fn space_free(&self) -> &Arc<Signal> {
        &self.space_free
    }
}
