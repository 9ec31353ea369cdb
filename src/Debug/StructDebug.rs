use std::fmt;

use crate::Core::cancel::CancelToken;
use crate::Core::signal::Signal;
use crate::Pipe::Buffer::SharedBuffer;
use crate::Pipe::{Handle, HandleMutex};

/// Debug function for SharedBuffer
///
/// Shows capacity and the decoded header; never dumps the ring contents.
pub fn debug_shared_buffer(buffer: &SharedBuffer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let hs = buffer.load_header();
    f.debug_struct("SharedBuffer")
        .field("storage", &format_args!("0x{:x}", buffer.storage.as_ptr() as usize))
        .field("capacity", &buffer.capacity())
        .field("closed", &hs.closed)
        .field("read_pos", &hs.read_pos)
        .field("available", &hs.available)
        .finish_non_exhaustive()
}

/// Debug function for Handle
///
/// Shows:
/// - Underlying SharedBuffer
/// - Whether the handle is synchronized, and its mutex state
pub fn debug_handle(handle: &Handle, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Handle")
        .field("core", handle.core())
        .field("mutex", &handle.mutex())
        .finish()
}

pub fn debug_handle_mutex(mutex: &HandleMutex, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HandleMutex")
        .field("locked", &mutex.is_locked())
        .field("waiting", &mutex.waiting())
        .field("spin_limit", &mutex.spin_limit())
        .finish()
}

pub fn debug_signal(signal: &Signal, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Signal")
        .field("pending", &signal.is_pending())
        .field("released", &signal.is_released())
        .finish()
}

pub fn debug_cancel_token(token: &CancelToken, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CancelToken")
        .field("cancelled", &token.is_cancelled())
        .finish_non_exhaustive()
}
