// Single-slot wake-up queue.
//
// The whole signal is one futex word:
//   bit 0      - a wake-up token is pending
//   bit 1      - released (buffer shut down), sticky
//   bits 2..32 - interrupt epoch, bumped to kick sleepers without a token

use std::fmt;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering::{AcqRel, Acquire};
use std::sync::Arc;

use super::cancel::CancelToken;
use super::futex::{futex_wait, futex_wake_all, futex_wake_one};
use crate::error::PipeError;

const PENDING: u32 = 1;
const RELEASED: u32 = 1 << 1;
const EPOCH_UNIT: u32 = 1 << 2;

/// A coalescing wake-up signal.
///
/// `notify` deposits at most one token; further notifications before a
/// waiter takes it are dropped. `release` wakes everybody, now and forever
/// after, with [`PipeError::EndOfStream`].
pub struct Signal {
    word: AtomicU32,
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal {
    pub fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Deposits a token. Returns `false` when one was already pending or the
    /// signal has been released.
    pub fn notify(&self) -> bool {
        let prev = self.word.fetch_or(PENDING, AcqRel);
        if prev & (PENDING | RELEASED) != 0 {
            return false;
        }
        futex_wake_one(&self.word);
        true
    }

    /// Blocks until a token is taken or the signal is released.
    pub fn wait(&self) -> Result<(), PipeError> {
        self.wait_until(None)
    }

    /// Like [`wait`](Self::wait), but gives up with the token's cause once
    /// `token` is cancelled.
    pub fn wait_cancellable(self: &Arc<Self>, token: &CancelToken) -> Result<(), PipeError> {
        let _watch = token.watch(self);
        self.wait_until(Some(token))
    }

    fn wait_until(&self, cancel: Option<&CancelToken>) -> Result<(), PipeError> {
        loop {
            let cur = self.word.load(Acquire);
            if cur & RELEASED != 0 {
                return Err(PipeError::EndOfStream);
            }
            if cur & PENDING != 0 {
                if self
                    .word
                    .compare_exchange_weak(cur, cur & !PENDING, AcqRel, Acquire)
                    .is_ok()
                {
                    return Ok(());
                }
                continue;
            }
            if let Some(cause) = cancel.and_then(CancelToken::cause) {
                return Err(PipeError::Cancelled(cause));
            }
            tracing::trace!("signal: parking");
            futex_wait(&self.word, cur);
        }
    }

    /// Permanently releases every current and future waiter. Returns `true`
    /// only for the call that performed the release.
    pub fn release(&self) -> bool {
        let prev = self.word.fetch_or(RELEASED, AcqRel);
        futex_wake_all(&self.word);
        prev & RELEASED == 0
    }

    /// Wakes sleepers so they re-check their exit conditions. Leaves the
    /// token and release bits untouched.
    pub(crate) fn interrupt(&self) {
        self.word.fetch_add(EPOCH_UNIT, AcqRel);
        futex_wake_all(&self.word);
    }

    pub fn is_pending(&self) -> bool {
        self.word.load(Acquire) & PENDING != 0
    }

    pub fn is_released(&self) -> bool {
        self.word.load(Acquire) & RELEASED != 0
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_signal(self, f)
    }
}
