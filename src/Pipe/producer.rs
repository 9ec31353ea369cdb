// Write side of the pipe: copy bytes in, then publish them in the header.

use std::io;

use super::Handle;
use crate::error::PipeError;
use crate::Core::cancel::CancelToken;
use crate::Pipe::Buffer::Buffer_impl::Commit;

impl Handle {
    /// Writes all of `data`, blocking until the ring has room for it.
    ///
    /// # Returns
    /// * `Ok(data.len())` once every byte is published
    /// * `Err(Overcapacity)` if `data` is longer than the ring
    /// * `Err(EndOfStream)` if the pipe is or becomes closed
    pub fn write(&self, data: &[u8]) -> Result<usize, PipeError> {
        self.write_with(data, None)
    }

    /// Like [`write`](Self::write), but gives up with the token's cause when
    /// `token` fires while blocked.
    pub fn write_cancellable(&self, data: &[u8], token: &CancelToken) -> Result<usize, PipeError> {
        self.write_with(data, Some(token))
    }

    fn write_with(&self, data: &[u8], cancel: Option<&CancelToken>) -> Result<usize, PipeError> {
        let core = self.core();
        core.check_transfer(data.len())?;

        loop {
            if self.try_write(data, cancel)? {
                return Ok(data.len());
            }
            // Full: wait for a reader; on release re-check and report close.
            match core.wait_space(cancel) {
                Ok(()) | Err(PipeError::EndOfStream) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// One check, copy and commit under the handle lock and the core's
    /// write claim. `Ok(false)` means the ring lacked room; neither lock is
    /// held on return.
    fn try_write(&self, data: &[u8], cancel: Option<&CancelToken>) -> Result<bool, PipeError> {
        let core = self.core();
        let _guard = self.lock_with(cancel)?;
        let _claim = core.claim_write();
        loop {
            let hs = core.load_header();
            if hs.closed {
                return Err(PipeError::EndOfStream);
            }
            if data.is_empty() {
                return Ok(true);
            }
            if hs.free(core.capacity()) < data.len() {
                return Ok(false);
            }
            core.copy_in(hs.write_pos(), data);
            match core.commit_write(hs, data.len()) {
                Ok(after) => {
                    core.signal_consumer();
                    if after.free(core.capacity()) > 0 {
                        // pass the wake-up on to the next writer
                        core.signal_producer();
                    }
                    return Ok(true);
                }
                Err(Commit::Stale) => continue,
                Err(Commit::Closed) => return Err(PipeError::EndOfStream),
            }
        }
    }
}

/// Writes at most `capacity` bytes per call.
impl io::Write for &Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.capacity());
        Ok(Handle::write(self, &buf[..n])?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
