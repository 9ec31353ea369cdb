// Per-handle hybrid spin/park mutex.

use std::fmt;
use std::sync::atomic::Ordering::{Acquire, Relaxed, SeqCst};
use std::sync::atomic::{AtomicBool, AtomicU32};
use std::sync::Arc;

use crate::error::PipeError;
use crate::Core::cancel::CancelToken;
use crate::Core::signal::Signal;
use crate::Pipe::Buffer::SharedBuffer;

/// Spin iterations attempted before parking on the release signal.
pub const DEFAULT_SPIN_LIMIT: u32 = 100;

/// Serialises multi-step operations issued concurrently through one handle.
///
/// Every synchronized handle owns its own instance; handles derived from the
/// same core never contend on each other's mutex. Cross-handle consistency
/// of the header comes from its compare-and-swap protocol alone.
///
/// - **Fast path**: one CAS from unlocked to locked.
/// - **Slow path**: register as waiting, spin with `yield_now`, then park
///   on the private release signal and retry.
/// - **Release**: clear the flag; if anybody waits, deposit one coalesced
///   wake-up. No FIFO order is promised.
pub struct HandleMutex {
    locked: AtomicBool,
    waiting: AtomicU32,
    released: Arc<Signal>,
    spin_limit: u32,
}

impl HandleMutex {
    pub fn new(spin_limit: u32) -> Self {
        Self {
            locked: AtomicBool::new(false),
            waiting: AtomicU32::new(0),
            released: Arc::new(Signal::new()),
            spin_limit,
        }
    }

    // release stores `locked` then loads `waiting`; acquire does the reverse
    #[inline]
    fn try_acquire(&self) -> bool {
        !self.locked.load(SeqCst)
            && self
                .locked
                .compare_exchange(false, true, SeqCst, SeqCst)
                .is_ok()
    }

    /// Take the lock, parking if necessary. Fails with end-of-stream once
    /// the buffer is observed closed while waiting, or with the token's
    /// cause if `cancel` fires first.
    pub fn acquire(
        &self,
        core: &SharedBuffer,
        cancel: Option<&CancelToken>,
    ) -> Result<(), PipeError> {
        // fast path
        if self.try_acquire() {
            return Ok(());
        }
        // slow path
        self.waiting.fetch_add(1, SeqCst);
        let res = self.acquire_slow(core, cancel);
        self.waiting.fetch_sub(1, SeqCst);
        res
    }

    fn acquire_slow(
        &self,
        core: &SharedBuffer,
        cancel: Option<&CancelToken>,
    ) -> Result<(), PipeError> {
        loop {
            // a release before we registered saw no waiters and sent no wake-up
            if self.try_acquire() {
                return Ok(());
            }
            // first spin some
            for _ in 0..self.spin_limit {
                if self.try_acquire() {
                    return Ok(());
                }
                std::thread::yield_now();
            }
            if core.is_closed() {
                return Err(PipeError::EndOfStream);
            }
            // then wait notification
            tracing::trace!(waiting = self.waiting.load(Relaxed), "handle lock: parking");
            match cancel {
                Some(token) => self.released.wait_cancellable(token)?,
                None => self.released.wait()?,
            }
            if core.is_closed() {
                return Err(PipeError::EndOfStream);
            }
        }
    }

    /// Drop the lock and wake one parked waiter, if any.
    ///
    /// After close a release hands every parked waiter end-of-stream instead,
    /// so waiters on handles that did not perform the close still return.
    pub fn release(&self, core: &SharedBuffer) {
        self.locked.store(false, SeqCst);
        if self.waiting.load(SeqCst) == 0 {
            return;
        }
        if core.is_closed() {
            self.released.release();
        } else {
            self.released.notify();
        }
    }

    /// Release every parked waiter with end-of-stream.
    pub(crate) fn shutdown(&self) {
        self.released.release();
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Acquire)
    }

    /// Callers currently in the slow path.
    pub fn waiting(&self) -> u32 {
        self.waiting.load(Acquire)
    }

    pub fn spin_limit(&self) -> u32 {
        self.spin_limit
    }

    #[cfg(test)]
    pub(crate) fn release_signal(&self) -> &Arc<Signal> {
        &self.released
    }
}

impl fmt::Debug for HandleMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_handle_mutex(self, f)
    }
}

/// RAII guard returned by [`Handle::lock`](crate::Pipe::Handle::lock).
///
/// Unlocks on drop. On an unsynchronized handle the guard holds nothing.
#[must_use = "the handle lock is released as soon as the guard is dropped"]
pub struct HandleGuard<'a> {
    pub(crate) mutex: Option<&'a HandleMutex>,
    pub(crate) core: &'a SharedBuffer,
}

impl Drop for HandleGuard<'_> {
    fn drop(&mut self) {
        if let Some(mutex) = self.mutex {
            mutex.release(self.core);
        }
    }
}
