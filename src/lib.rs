//! A fixed-capacity, closable, in-process byte pipe.
//!
//! Producers append bytes, consumers remove them in FIFO order, and either
//! side blocks when the ring is full or empty. Position and occupancy live in
//! one packed atomic header updated by compare-and-swap, wake-ups go through
//! coalescing futex signals, and a handle may carry its own hybrid spin/park
//! mutex for multi-threaded use.
//!
//! ```
//! use dmxp_pipe::PipeBuilder;
//!
//! let writer = PipeBuilder::new().with_capacity(1000).build().unwrap();
//! let reader = writer.derive(false);
//! assert_eq!(reader.capacity(), 1024);
//!
//! writer.write(b"ping").unwrap();
//! let mut buf = [0u8; 4];
//! assert_eq!(reader.read(&mut buf).unwrap(), 4);
//! assert_eq!(&buf, b"ping");
//!
//! writer.close().unwrap();
//! assert!(reader.read(&mut buf).unwrap_err().is_end_of_stream());
//! ```

#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod Pipe;
#[allow(non_snake_case)]
mod Debug {
    pub mod StructDebug;
}

pub mod error;
pub mod ffi;

pub use error::{CancelCause, Canceled, PipeError};
pub use Core::cancel::CancelToken;
pub use Pipe::{Handle, HandleGuard, PipeBuilder};
