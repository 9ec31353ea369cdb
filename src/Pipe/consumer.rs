// Read side of the pipe: copy bytes out, then release them in the header.

use std::io;

use super::Handle;
use crate::error::PipeError;
use crate::Core::cancel::CancelToken;

impl Handle {
    /// Reads up to `buf.len()` bytes, blocking while the pipe is empty.
    ///
    /// Bytes still buffered at close are drained first.
    ///
    /// # Returns
    /// * `Ok(n)` with `1 <= n <= buf.len()` (or 0 for an empty `buf`)
    /// * `Err(EndOfStream)` once the pipe is closed and empty
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, PipeError> {
        self.read_with(buf, 1, None)
    }

    pub fn read_cancellable(&self, buf: &mut [u8], token: &CancelToken) -> Result<usize, PipeError> {
        self.read_with(buf, 1, Some(token))
    }

    /// Reads exactly `buf.len()` bytes in one step.
    ///
    /// Fails with `Overcapacity` if `buf` is longer than the ring, and with
    /// `EndOfStream` if the pipe closes before that many bytes are buffered.
    pub fn read_full(&self, buf: &mut [u8]) -> Result<usize, PipeError> {
        self.core().check_transfer(buf.len())?;
        self.read_with(buf, buf.len(), None)
    }

    pub fn read_full_cancellable(
        &self,
        buf: &mut [u8],
        token: &CancelToken,
    ) -> Result<usize, PipeError> {
        self.core().check_transfer(buf.len())?;
        self.read_with(buf, buf.len(), Some(token))
    }

    fn read_with(
        &self,
        buf: &mut [u8],
        min: usize,
        cancel: Option<&CancelToken>,
    ) -> Result<usize, PipeError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let core = self.core();

        loop {
            if let Some(n) = self.try_read(buf, min, cancel)? {
                return Ok(n);
            }
            match core.wait_data(cancel) {
                Ok(()) | Err(PipeError::EndOfStream) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// One check, copy and commit under the handle lock. `Ok(None)` means
    /// fewer than `min` bytes were buffered; the lock is dropped on return.
    fn try_read(
        &self,
        buf: &mut [u8],
        min: usize,
        cancel: Option<&CancelToken>,
    ) -> Result<Option<usize>, PipeError> {
        let core = self.core();
        let _guard = self.lock_with(cancel)?;
        loop {
            let hs = core.load_header();
            if hs.available < min {
                if hs.closed {
                    return Err(PipeError::EndOfStream);
                }
                return Ok(None);
            }
            let n = hs.available.min(buf.len());
            core.copy_out(hs.read_pos, &mut buf[..n]);
            match core.commit_read(hs, n) {
                Ok(after) => {
                    core.signal_producer();
                    if after.available > 0 {
                        // pass the wake-up on to the next reader
                        core.signal_consumer();
                    }
                    return Ok(Some(n));
                }
                Err(_) => continue,
            }
        }
    }
}

/// End of stream reads as `Ok(0)`.
impl io::Read for &Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Handle::read(self, buf) {
            Ok(n) => Ok(n),
            Err(PipeError::EndOfStream) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl io::Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut &*self, buf)
    }
}
