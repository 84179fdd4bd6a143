use muphys_core::GridError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// - `code()` - Returns the error code passed across the FFI boundary
/// - `msg()` - Returns the error message for diagnostics
pub(crate) trait MuphysError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> MuphysErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Error raised by an FFI entry point, with its code and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultMuphysError {
    code: MuphysErrorCode,
    msg: String,
}

impl DefaultMuphysError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"t"`, `"params"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: MuphysErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for grid extents or a column range that cannot be used.
    pub fn invalid_dimensions(message: String) -> Self {
        Self {
            code: MuphysErrorCode::InvalidDimensions,
            msg: message,
        }
    }

    /// Create error for a parameter value outside its domain.
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: MuphysErrorCode::InvalidParameter,
            msg: message,
        }
    }
}

impl From<GridError> for DefaultMuphysError {
    fn from(error: GridError) -> Self {
        Self::invalid_dimensions(error.to_string())
    }
}

impl MuphysError for DefaultMuphysError {
    fn code(&self) -> MuphysErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by the microphysics functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuphysErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Grid extents are zero or overflow, or the column range does not fit the grid.
    InvalidDimensions = 2,

    /// Invalid parameter passed to function (e.g. a non-finite or non-positive time step).
    InvalidParameter = 3,
}

impl From<DefaultMuphysError> for MuphysErrorCode {
    fn from(error: DefaultMuphysError) -> Self {
        error.code
    }
}

thread_local! {
    /// Most recent FFI error of this thread (C string, error code).
    /// The `CString` is kept here so the pointer handed to C stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, MuphysErrorCode)> = const { RefCell::new((None, MuphysErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, MuphysErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, MuphysErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if the last call on this thread failed.
/// - `null` if the last call succeeded or no call has been made.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```c
/// MuphysErrorCode err = muphys_graupel(&params, nlev, ncells, 0, ncells, ...);
/// if (err != Ok) {
///     const char* error = muphys_get_last_error();
///     if (error) {
///         fprintf(stderr, "graupel failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn muphys_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code of this thread.
///
/// Returns `Ok` (0) if the last call succeeded or no call has been made.
#[no_mangle]
pub extern "C" fn muphys_get_last_error_code() -> MuphysErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
