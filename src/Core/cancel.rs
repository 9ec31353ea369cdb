// Cancellation tokens for blocking pipe operations.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::signal::Signal;
use crate::error::{CancelCause, Canceled};

/// A cloneable, thread-safe cancellation token.
///
/// Binding a token to a wait aborts only that wait; the pipe itself and
/// other waiters are unaffected.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    cause: Mutex<Option<CancelCause>>,
    // Signals with a thread currently parked on behalf of this token.
    watchers: Mutex<Vec<Weak<Signal>>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels with the default [`Canceled`] cause.
    pub fn cancel(&self) {
        self.cancel_with(Canceled);
    }

    /// Cancels with a caller-supplied cause. Only the first cause sticks.
    pub fn cancel_with<E>(&self, err: E)
    where
        E: Error + Send + Sync + 'static,
    {
        {
            let mut cause = self.inner.cause.lock();
            if cause.is_some() {
                return;
            }
            *cause = Some(Arc::new(err));
            self.inner.cancelled.store(true, Ordering::Release);
        }

        let watchers = std::mem::take(&mut *self.inner.watchers.lock());
        tracing::trace!(watchers = watchers.len(), "cancel token fired");
        for sig in watchers.iter().filter_map(Weak::upgrade) {
            sig.interrupt();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// The cause recorded by the first cancellation, if any.
    pub fn cause(&self) -> Option<CancelCause> {
        if !self.is_cancelled() {
            return None;
        }
        self.inner.cause.lock().clone()
    }

    /// Registers `sig` to be interrupted on cancellation for as long as the
    /// returned guard lives.
    pub(crate) fn watch(&self, sig: &Arc<Signal>) -> Watch<'_> {
        self.inner.watchers.lock().push(Arc::downgrade(sig));
        Watch {
            token: self,
            sig: Arc::downgrade(sig),
        }
    }
}

pub(crate) struct Watch<'a> {
    token: &'a CancelToken,
    sig: Weak<Signal>,
}

impl Drop for Watch<'_> {
    fn drop(&mut self) {
        let mut watchers = self.token.inner.watchers.lock();
        if let Some(pos) = watchers.iter().position(|w| w.ptr_eq(&self.sig)) {
            watchers.swap_remove(pos);
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_cancel_token(self, f)
    }
}
