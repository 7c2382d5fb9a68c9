//! FFI error codes and the thread-local last-error message.

use std::cell::RefCell;
use std::ffi::{c_char, CString};

use crate::component::ComponentError;
use crate::registry::RegistryError;

/// Status codes returned by every `ek_*` function.
///
/// 0 is success; failures are negative and stable across releases, as
/// host bridges switch on these values.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EkErrorCode {
    Ok = 0,
    NullPointer = -1,
    InvalidArgument = -2,
    NotFound = -3,
    OutOfMemory = -4,
    InvalidState = -5,
    NotInitialized = -6,
    ModelLoadFailed = -7,
    Internal = -99,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record a message for [`ek_last_error`] on this thread.
pub(crate) fn set_last_error(msg: impl Into<String>) {
    let msg = msg.into();
    // Interior nuls cannot round-trip through a C string; strip them.
    let cstr = CString::new(msg.replace('\0', ""))
        .unwrap_or_else(|_| CString::new("error message unavailable").unwrap_or_default());
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(cstr));
}

pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Last error message recorded on this thread, or null if none.
///
/// The pointer is valid until the next `ek_*` call on this thread;
/// callers must copy, not retain.
#[no_mangle]
pub extern "C" fn ek_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(std::ptr::null())
    })
}

/// Clear the thread-local last error message.
#[no_mangle]
pub extern "C" fn ek_clear_last_error() {
    clear_last_error();
}

impl From<&RegistryError> for EkErrorCode {
    fn from(err: &RegistryError) -> Self {
        match err {
            RegistryError::InvalidArgument(_) => Self::InvalidArgument,
            RegistryError::NotFound(_) => Self::NotFound,
            RegistryError::OutOfMemory => Self::OutOfMemory,
        }
    }
}

impl From<&ComponentError> for EkErrorCode {
    fn from(err: &ComponentError) -> Self {
        match err {
            ComponentError::NotInitialized => Self::NotInitialized,
            ComponentError::InvalidArgument(_) => Self::InvalidArgument,
            ComponentError::InvalidState { .. } => Self::InvalidState,
            ComponentError::ModelLoadFailed(_) => Self::ModelLoadFailed,
        }
    }
}

/// Record the error message and return the matching code.
pub(crate) fn fail_registry(err: RegistryError) -> EkErrorCode {
    let code = EkErrorCode::from(&err);
    set_last_error(err.to_string());
    code
}

pub(crate) fn fail_component(err: ComponentError) -> EkErrorCode {
    let code = EkErrorCode::from(&err);
    set_last_error(err.to_string());
    code
}

pub(crate) fn fail_null(what: &str) -> EkErrorCode {
    set_last_error(format!("null pointer argument: {what}"));
    EkErrorCode::NullPointer
}
