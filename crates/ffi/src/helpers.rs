use crate::error::{with_last_error_mut, DefaultMuphysError, MuphysError, MuphysErrorCode};
use muphys_core::Real;
use std::ffi::CString;
use std::slice;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl MuphysError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Record an error in thread-local storage and return its code.
#[inline]
pub(crate) fn track_error(error: &impl MuphysError) -> MuphysErrorCode {
    tracing::debug!(code = ?error.code(), "{}", error.msg());
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
/// Called on successful operations.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = MuphysErrorCode::Ok;
    });
}

/// Copy a caller-owned buffer of `len` doubles into kernel precision.
///
/// # Safety
/// `ptr` must be null or valid for reads of `len` consecutive `f64`.
pub(crate) unsafe fn read_buffer(
    ptr: *const f64,
    len: usize,
    name: &str,
) -> Result<Vec<Real>, DefaultMuphysError> {
    if ptr.is_null() {
        return Err(DefaultMuphysError::null_pointer(name));
    }
    let values = unsafe { slice::from_raw_parts(ptr, len) };
    Ok(values.iter().map(|&v| v as Real).collect())
}

/// Copy kernel values back into a caller-owned buffer.
///
/// # Safety
/// `ptr` must be non-null and valid for writes of `values.len()` consecutive
/// `f64`, with no other live reference to that memory.
pub(crate) unsafe fn write_buffer(ptr: *mut f64, values: &[Real]) {
    let out = unsafe { slice::from_raw_parts_mut(ptr, values.len()) };
    for (dst, &src) in out.iter_mut().zip(values) {
        *dst = f64::from(src);
    }
}
