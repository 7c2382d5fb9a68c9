//! LLM component functions for the C ABI.

use std::ffi::{c_char, CStr, CString};

use crate::component::{ComponentError, LlmComponent};
use crate::config::EnvConfig;

use super::error::{clear_last_error, fail_component, fail_null, set_last_error, EkErrorCode};
use super::types::{free_lora_info_array, lora_info_to_c, EkLoraAdapterInfo};

/// Opaque component handle for host bridges.
pub struct EkLlmComponent {
    inner: LlmComponent,
}

unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, EkErrorCode> {
    if ptr.is_null() {
        return Err(fail_null(what));
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| {
        fail_component(ComponentError::InvalidArgument(format!("invalid UTF-8 in {what}")))
    })
}

unsafe fn optional_str<'a>(ptr: *const c_char, what: &str) -> Result<Option<&'a str>, EkErrorCode> {
    if ptr.is_null() {
        return Ok(None);
    }
    read_str(ptr, what).map(Some)
}

/// Create an LLM component configured from `EDGEKIT_*` environment
/// variables. The handle must be released with
/// [`ek_llm_component_destroy`].
///
/// # Safety
/// `out_handle` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_create(
    out_handle: *mut *mut EkLlmComponent,
) -> EkErrorCode {
    if out_handle.is_null() {
        return fail_null("out_handle");
    }
    clear_last_error();
    let config = EnvConfig::load();
    let component = Box::new(EkLlmComponent { inner: LlmComponent::new(config.engine) });
    *out_handle = Box::into_raw(component);
    tracing::info!("LLM component created");
    EkErrorCode::Ok
}

/// Destroy the component, releasing the native handle and all adapter
/// bookkeeping. Null is a no-op.
///
/// # Safety
/// `handle` must be null or a live pointer from
/// [`ek_llm_component_create`].
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_destroy(handle: *mut EkLlmComponent) {
    if handle.is_null() {
        return;
    }
    let component = Box::from_raw(handle);
    component.inner.destroy();
}

/// Load a model from `path`, replacing any loaded one. `model_name` is
/// optional display metadata and may be null.
///
/// # Safety
/// `handle` must be live; string arguments must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_load_model(
    handle: *mut EkLlmComponent,
    path: *const c_char,
    model_id: *const c_char,
    model_name: *const c_char,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    clear_last_error();
    let path = match read_str(path, "path") {
        Ok(s) => s,
        Err(code) => return code,
    };
    let model_id = match read_str(model_id, "model_id") {
        Ok(s) => s,
        Err(code) => return code,
    };
    let model_name = match optional_str(model_name, "model_name") {
        Ok(s) => s,
        Err(code) => return code,
    };
    match (*handle).inner.load_model(path, model_id, model_name) {
        Ok(()) => EkErrorCode::Ok,
        Err(err) => fail_component(err),
    }
}

/// Unload the current model. No-op when idle. Null handle is a no-op.
///
/// # Safety
/// `handle` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_unload(handle: *mut EkLlmComponent) {
    if handle.is_null() {
        return;
    }
    (*handle).inner.unload();
}

/// True if a model is loaded. Never blocks behind a mutation; a null
/// handle reads as false.
///
/// # Safety
/// `handle` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_is_loaded(handle: *const EkLlmComponent) -> bool {
    if handle.is_null() {
        return false;
    }
    (*handle).inner.is_loaded()
}

/// Id of the loaded model, or null when none. The caller releases a
/// non-null result with [`ek_string_free`].
///
/// # Safety
/// `handle` must be live; `out_model_id` must be valid.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_current_model_id(
    handle: *const EkLlmComponent,
    out_model_id: *mut *mut c_char,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    if out_model_id.is_null() {
        return fail_null("out_model_id");
    }
    clear_last_error();
    *out_model_id = match (*handle).inner.current_model_id() {
        Some(id) => match CString::new(id) {
            Ok(s) => s.into_raw(),
            Err(_) => {
                set_last_error("interior nul in model id");
                return EkErrorCode::Internal;
            }
        },
        None => std::ptr::null_mut(),
    };
    EkErrorCode::Ok
}

/// Cooperatively cancel any in-flight generation. Null is a no-op.
///
/// # Safety
/// `handle` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_cancel(handle: *const EkLlmComponent) {
    if handle.is_null() {
        return;
    }
    (*handle).inner.cancel();
}

/// Apply a LoRA adapter at `scale`. Requires a loaded model.
///
/// # Safety
/// `handle` must be live; `path` must be a valid string.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_load_lora(
    handle: *mut EkLlmComponent,
    path: *const c_char,
    scale: f32,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    clear_last_error();
    let path = match read_str(path, "path") {
        Ok(s) => s,
        Err(code) => return code,
    };
    match (*handle).inner.load_lora_adapter(path, scale) {
        Ok(()) => EkErrorCode::Ok,
        Err(err) => fail_component(err),
    }
}

/// Remove one applied adapter by path.
///
/// # Safety
/// `handle` must be live; `path` must be a valid string.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_remove_lora(
    handle: *mut EkLlmComponent,
    path: *const c_char,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    clear_last_error();
    let path = match read_str(path, "path") {
        Ok(s) => s,
        Err(code) => return code,
    };
    match (*handle).inner.remove_lora_adapter(path) {
        Ok(()) => EkErrorCode::Ok,
        Err(err) => fail_component(err),
    }
}

/// Remove all adapter bookkeeping. Safe with none applied.
///
/// # Safety
/// `handle` must be live.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_clear_lora(handle: *mut EkLlmComponent) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    clear_last_error();
    match (*handle).inner.clear_lora_adapters() {
        Ok(()) => EkErrorCode::Ok,
        Err(err) => fail_component(err),
    }
}

/// Check whether the adapter at `path` could be applied to the loaded
/// model. Returns true when compatible. When incompatible and
/// `out_message` is non-null, `*out_message` receives an explanatory
/// string the caller releases with [`ek_string_free`] (null when
/// compatible).
///
/// # Safety
/// `handle` must be null or live; `path` null or valid; `out_message`
/// null or valid.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_check_lora_compat(
    handle: *const EkLlmComponent,
    path: *const c_char,
    out_message: *mut *mut c_char,
) -> bool {
    if !out_message.is_null() {
        *out_message = std::ptr::null_mut();
    }
    if handle.is_null() {
        if !out_message.is_null() {
            if let Ok(msg) = CString::new("invalid handle") {
                *out_message = msg.into_raw();
            }
        }
        return false;
    }
    let path = if path.is_null() {
        ""
    } else {
        CStr::from_ptr(path).to_str().unwrap_or("")
    };
    let (compatible, message) = (*handle).inner.check_lora_compatibility(path);
    if let (false, Some(msg), false) = (compatible, message, out_message.is_null()) {
        if let Ok(msg) = CString::new(msg.replace('\0', "")) {
            *out_message = msg.into_raw();
        }
    }
    compatible
}

/// Snapshot the adapter bookkeeping into a caller-owned array of
/// [`EkLoraAdapterInfo`]. Empty bookkeeping yields a null array and
/// zero count. Release with [`ek_lora_info_array_free`].
///
/// # Safety
/// `handle`, `out_infos` and `out_count` must be valid.
#[no_mangle]
pub unsafe extern "C" fn ek_llm_component_get_lora_info(
    handle: *const EkLlmComponent,
    out_infos: *mut *mut EkLoraAdapterInfo,
    out_count: *mut usize,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    if out_infos.is_null() || out_count.is_null() {
        return fail_null("out_infos/out_count");
    }
    clear_last_error();
    let infos = (*handle).inner.get_lora_info();
    match lora_info_to_c(&infos) {
        Ok((ptr, count)) => {
            *out_infos = ptr;
            *out_count = count;
            EkErrorCode::Ok
        }
        Err(err) => {
            set_last_error(err.to_string());
            EkErrorCode::Internal
        }
    }
}

/// Free an array returned by [`ek_llm_component_get_lora_info`].
/// Null is a no-op.
///
/// # Safety
/// `(infos, count)` must be null or an unfreed pair from this ABI.
#[no_mangle]
pub unsafe extern "C" fn ek_lora_info_array_free(infos: *mut EkLoraAdapterInfo, count: usize) {
    free_lora_info_array(infos, count);
}

/// Free a string returned by this ABI (model id, compat message).
/// Null is a no-op.
///
/// # Safety
/// `s` must be null or an unfreed string pointer from this ABI.
#[no_mangle]
pub unsafe extern "C" fn ek_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
