use crate::error::PipeError;
use crate::Pipe::{Handle, PipeBuilder};
use std::ptr;

// Error codes
pub const DMXP_SUCCESS: i32 = 0;
pub const DMXP_ERROR_NULL_POINTER: i32 = -1;
pub const DMXP_ERROR_INVALID_ARG: i32 = -2;
pub const DMXP_ERROR_OVERCAPACITY: i32 = -3;
pub const DMXP_ERROR_END_OF_STREAM: i32 = -4;
pub const DMXP_ERROR_INTERNAL: i32 = -6;

/// Handle to a pipe end (opaque pointer)
pub struct PipeHandle {
    inner: Handle,
}

fn error_code(err: &PipeError) -> i32 {
    match err {
        PipeError::Overcapacity { .. } => DMXP_ERROR_OVERCAPACITY,
        PipeError::EndOfStream => DMXP_ERROR_END_OF_STREAM,
        PipeError::InvalidCapacity(_) => DMXP_ERROR_INVALID_ARG,
        PipeError::Cancelled(_) => DMXP_ERROR_INTERNAL,
    }
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

/// Create a new pipe.
///
/// # Arguments
/// * `capacity` - Requested size in bytes (0 for the 32KB default).
/// * `synchronized` - Give the handle its own lock for multi-threaded use.
///
/// # Returns
/// * Pointer to `PipeHandle`, or NULL on failure.
#[no_mangle]
pub extern "C" fn dmxp_pipe_new(capacity: usize, synchronized: bool) -> *mut PipeHandle {
    match PipeBuilder::new()
        .with_capacity(capacity)
        .synchronized(synchronized)
        .build()
    {
        Ok(handle) => Box::into_raw(Box::new(PipeHandle { inner: handle })),
        Err(e) => {
            tracing::error!(error = %e, "FFI: failed to build pipe");
            ptr::null_mut()
        }
    }
}

/// Derive another handle over the same pipe.
///
/// # Returns
/// * Pointer to a new `PipeHandle`, or NULL if `handle` is NULL.
#[no_mangle]
pub extern "C" fn dmxp_pipe_derive(handle: *const PipeHandle, synchronized: bool) -> *mut PipeHandle {
    if handle.is_null() {
        return ptr::null_mut();
    }
    let source = unsafe { &(*handle).inner };
    Box::into_raw(Box::new(PipeHandle {
        inner: source.derive(synchronized),
    }))
}

/// Free a pipe handle. Does not close the pipe.
#[no_mangle]
pub extern "C" fn dmxp_pipe_free(handle: *mut PipeHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle); // Dropped automatically
        }
    }
}

// -----------------------------------------------------------------------------
// Data path
// -----------------------------------------------------------------------------

/// Write `len` bytes, blocking until they fit.
///
/// # Returns
/// * Number of bytes written on success, negative error code otherwise.
#[no_mangle]
pub extern "C" fn dmxp_pipe_write(handle: *const PipeHandle, data: *const u8, len: usize) -> isize {
    if handle.is_null() || (data.is_null() && len != 0) {
        return DMXP_ERROR_NULL_POINTER as isize;
    }
    let pipe = unsafe { &(*handle).inner };
    let slice: &[u8] = if len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(data, len) }
    };

    match pipe.write(slice) {
        Ok(n) => n as isize,
        Err(e) => error_code(&e) as isize,
    }
}

/// Read up to `len` bytes, blocking while the pipe is empty.
///
/// # Returns
/// * Number of bytes read on success.
/// * DMXP_ERROR_END_OF_STREAM once the pipe is closed and drained.
#[no_mangle]
pub extern "C" fn dmxp_pipe_read(handle: *const PipeHandle, out_buf: *mut u8, len: usize) -> isize {
    if handle.is_null() || (out_buf.is_null() && len != 0) {
        return DMXP_ERROR_NULL_POINTER as isize;
    }
    let pipe = unsafe { &(*handle).inner };
    let slice: &mut [u8] = if len == 0 {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(out_buf, len) }
    };

    match pipe.read(slice) {
        Ok(n) => n as isize,
        Err(e) => error_code(&e) as isize,
    }
}

// -----------------------------------------------------------------------------
// State
// -----------------------------------------------------------------------------

/// Close the pipe. Idempotent.
#[no_mangle]
pub extern "C" fn dmxp_pipe_close(handle: *const PipeHandle) -> i32 {
    if handle.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }
    let pipe = unsafe { &(*handle).inner };
    match pipe.close() {
        Ok(()) => DMXP_SUCCESS,
        Err(e) => error_code(&e),
    }
}

/// # Returns
/// * 1 if closed, 0 if open, negative error code on NULL.
#[no_mangle]
pub extern "C" fn dmxp_pipe_is_closed(handle: *const PipeHandle) -> i32 {
    if handle.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }
    let pipe = unsafe { &(*handle).inner };
    pipe.is_closed() as i32
}

/// Capacity in bytes, or 0 on NULL.
#[no_mangle]
pub extern "C" fn dmxp_pipe_capacity(handle: *const PipeHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    let pipe = unsafe { &(*handle).inner };
    pipe.capacity()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_c_abi() {
        let w = dmxp_pipe_new(10, false);
        assert!(!w.is_null());
        assert_eq!(dmxp_pipe_capacity(w), 16);
        let r = dmxp_pipe_derive(w, true);

        let msg = b"hello";
        assert_eq!(dmxp_pipe_write(w, msg.as_ptr(), msg.len()), 5);
        let mut out = [0u8; 8];
        assert_eq!(dmxp_pipe_read(r, out.as_mut_ptr(), out.len()), 5);
        assert_eq!(&out[..5], msg);

        let big = [0u8; 17];
        assert_eq!(
            dmxp_pipe_write(w, big.as_ptr(), big.len()),
            DMXP_ERROR_OVERCAPACITY as isize
        );
        assert_eq!(dmxp_pipe_close(r), DMXP_SUCCESS);
        assert_eq!(dmxp_pipe_is_closed(w), 1);
        assert_eq!(
            dmxp_pipe_read(r, out.as_mut_ptr(), out.len()),
            DMXP_ERROR_END_OF_STREAM as isize
        );

        dmxp_pipe_free(r);
        dmxp_pipe_free(w);
    }

    #[test]
    fn null_handles() {
        assert_eq!(dmxp_pipe_close(ptr::null()), DMXP_ERROR_NULL_POINTER);
        assert_eq!(dmxp_pipe_capacity(ptr::null()), 0);
        assert!(dmxp_pipe_derive(ptr::null(), false).is_null());
        assert!(dmxp_pipe_new(usize::MAX, false).is_null());
    }
}
