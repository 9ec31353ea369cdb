use std::sync::Arc;

use super::mutex::DEFAULT_SPIN_LIMIT;
use super::Handle;
use crate::error::PipeError;
use crate::Pipe::Buffer::SharedBuffer;

pub struct PipeBuilder {
    capacity: usize,
    synchronized: bool,
    spin_limit: u32,
    storage: Option<Vec<u8>>,
}

impl Default for PipeBuilder {
    fn default() -> Self {
        Self {
            capacity: 0, // 32KB default
            synchronized: false,
            spin_limit: DEFAULT_SPIN_LIMIT,
            storage: None,
        }
    }
}

impl PipeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested ring size; rounded up to a power of two, at least 8 bytes.
    pub fn with_capacity(mut self, size: usize) -> Self {
        self.capacity = size;
        self
    }

    /// Give the handle its own mutex so it can be shared between threads
    /// doing concurrent reads or writes.
    pub fn synchronized(mut self, synchronized: bool) -> Self {
        self.synchronized = synchronized;
        self
    }

    pub fn with_spin_limit(mut self, spins: u32) -> Self {
        self.spin_limit = spins;
        self
    }

    /// Adopt `mem` as ring storage instead of allocating. Overrides
    /// `with_capacity`; the length must be a power of two.
    pub fn with_storage(mut self, mem: Vec<u8>) -> Self {
        self.storage = Some(mem);
        self
    }

    pub fn build(self) -> Result<Handle, PipeError> {
        let core = match self.storage {
            Some(mem) => SharedBuffer::with_storage(mem)?,
            None => SharedBuffer::new(self.capacity)?,
        };
        Ok(Handle::new(Arc::new(core), self.synchronized, self.spin_limit))
    }
}
