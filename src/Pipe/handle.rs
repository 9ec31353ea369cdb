use std::fmt;
use std::sync::Arc;

use super::mutex::{HandleGuard, HandleMutex, DEFAULT_SPIN_LIMIT};
use crate::error::PipeError;
use crate::Core::cancel::CancelToken;
use crate::Pipe::Buffer::SharedBuffer;
use crate::Pipe::Structs::Header_Structs::HeaderSnapshot;

/// A caller-facing view onto a [`SharedBuffer`].
///
/// Handles are created by [`PipeBuilder`](crate::Pipe::PipeBuilder) (owning a
/// fresh core) or by [`Handle::derive`] (sharing an existing one). A
/// synchronized handle carries its own [`HandleMutex`] so several threads can
/// issue multi-step reads or writes through it without interleaving.
pub struct Handle {
    core: Arc<SharedBuffer>,
    mutex: Option<HandleMutex>,
}

impl Handle {
    pub(crate) fn new(core: Arc<SharedBuffer>, synchronized: bool, spin_limit: u32) -> Self {
        Self {
            core,
            mutex: synchronized.then(|| HandleMutex::new(spin_limit)),
        }
    }

    /// A new handle over the same storage, header and data signals.
    ///
    /// With `synchronized` the new handle gets an independent mutex; it does
    /// not serialise against this handle's mutex.
    pub fn derive(&self, synchronized: bool) -> Handle {
        let spin_limit = self
            .mutex
            .as_ref()
            .map_or(DEFAULT_SPIN_LIMIT, HandleMutex::spin_limit);
        tracing::debug!(
            synchronized,
            handles = Arc::strong_count(&self.core) + 1,
            "pipe handle derived"
        );
        Handle::new(Arc::clone(&self.core), synchronized, spin_limit)
    }

    /// Buffer size in bytes, fixed after creation.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    /// Shut the pipe down. Always succeeds; only the first call across all
    /// handles has any effect.
    ///
    /// The closing call releases the data-flow signals and, when this handle
    /// is synchronized, its own lock signal.
    pub fn close(&self) -> Result<(), PipeError> {
        if self.core.close() {
            if let Some(mutex) = &self.mutex {
                mutex.shutdown();
            }
        }
        Ok(())
    }

    pub fn is_synchronized(&self) -> bool {
        self.mutex.is_some()
    }

    /// Bytes produced but not yet consumed.
    pub fn available(&self) -> usize {
        self.core.load_header().available
    }

    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    pub fn load_header(&self) -> HeaderSnapshot {
        self.core.load_header()
    }

    /// The shared core, for callers building their own read/write paths.
    pub fn core(&self) -> &Arc<SharedBuffer> {
        &self.core
    }

    pub fn mutex(&self) -> Option<&HandleMutex> {
        self.mutex.as_ref()
    }

    /// Take this handle's lock. Returns immediately on an unsynchronized
    /// handle.
    pub fn lock(&self) -> Result<HandleGuard<'_>, PipeError> {
        self.lock_with(None)
    }

    /// Like [`lock`](Self::lock), but abandons the wait once `token` fires.
    pub fn lock_cancellable(&self, token: &CancelToken) -> Result<HandleGuard<'_>, PipeError> {
        self.lock_with(Some(token))
    }

    pub(crate) fn lock_with(
        &self,
        cancel: Option<&CancelToken>,
    ) -> Result<HandleGuard<'_>, PipeError> {
        if let Some(mutex) = &self.mutex {
            mutex.acquire(&self.core, cancel)?;
        }
        Ok(HandleGuard {
            mutex: self.mutex.as_ref(),
            core: &self.core,
        })
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_handle(self, f)
    }
}
