//! Error type shared by every pipe operation.

use std::error::Error;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// The reason a cancellable wait was aborted, returned to the caller as-is.
pub type CancelCause = Arc<dyn Error + Send + Sync>;

/// Default cause recorded by [`CancelToken::cancel`](crate::Core::cancel::CancelToken::cancel).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation canceled")]
pub struct Canceled;

#[derive(Error, Debug, Clone)]
pub enum PipeError {
    /// A single transfer asked for more bytes than the ring can ever hold.
    #[error("pipe: buffer overcap ({requested} > {capacity})")]
    Overcapacity { requested: usize, capacity: usize },

    /// The buffer was closed.
    #[error("pipe: end of stream")]
    EndOfStream,

    /// A bound cancellation token fired while the caller was blocked.
    #[error("{0}")]
    Cancelled(CancelCause),

    /// The ring length cannot be encoded in the packed header.
    #[error("pipe: invalid capacity {0} (must be a power of two in 8..=1073741824)")]
    InvalidCapacity(usize),
}

impl PipeError {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, PipeError::EndOfStream)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipeError::Cancelled(_))
    }

    /// The cancellation cause, if this error came from a cancelled wait.
    pub fn cancel_cause(&self) -> Option<&CancelCause> {
        match self {
            PipeError::Cancelled(cause) => Some(cause),
            _ => None,
        }
    }
}

impl From<PipeError> for io::Error {
    fn from(err: PipeError) -> Self {
        let kind = match &err {
            PipeError::Overcapacity { .. } | PipeError::InvalidCapacity(_) => {
                io::ErrorKind::InvalidInput
            }
            PipeError::EndOfStream => io::ErrorKind::BrokenPipe,
            PipeError::Cancelled(_) => io::ErrorKind::Interrupted,
        };
        io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = PipeError::Overcapacity {
            requested: 100,
            capacity: 64,
        };
        assert_eq!(err.to_string(), "pipe: buffer overcap (100 > 64)");
        assert_eq!(PipeError::EndOfStream.to_string(), "pipe: end of stream");
    }

    #[test]
    fn cancelled_surfaces_cause_verbatim() {
        let cause: CancelCause = Arc::new(io::Error::new(io::ErrorKind::TimedOut, "deadline"));
        let err = PipeError::Cancelled(cause.clone());
        assert_eq!(err.to_string(), "deadline");
        assert!(Arc::ptr_eq(err.cancel_cause().unwrap(), &cause));
        assert!(err.is_cancelled());
        assert!(!err.is_end_of_stream());
    }

    #[test]
    fn io_kinds() {
        let io_err: io::Error = PipeError::EndOfStream.into();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
        let io_err: io::Error = PipeError::InvalidCapacity(3).into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);
        let io_err: io::Error = PipeError::Cancelled(Arc::new(Canceled)).into();
        assert_eq!(io_err.kind(), io::ErrorKind::Interrupted);
    }
}
