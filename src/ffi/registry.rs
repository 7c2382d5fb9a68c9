//! Adapter registry functions for the C ABI.

use std::ffi::{c_char, CStr};

use crate::registry::{AdapterRegistry, RegistryError};

use super::error::{clear_last_error, fail_null, fail_registry, EkErrorCode};
use super::types::{entry_from_c, entry_to_c, free_c_entry, EkAdapterEntry};

/// Opaque registry handle for host bridges.
pub struct EkAdapterRegistry {
    inner: AdapterRegistry,
}

unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, EkErrorCode> {
    if ptr.is_null() {
        return Err(fail_null(what));
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| {
        fail_registry(RegistryError::InvalidArgument(format!("invalid UTF-8 in {what}")))
    })
}

/// Create a new, empty adapter registry.
///
/// # Safety
/// `out_handle` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ek_adapter_registry_create(
    out_handle: *mut *mut EkAdapterRegistry,
) -> EkErrorCode {
    if out_handle.is_null() {
        return fail_null("out_handle");
    }
    clear_last_error();
    let registry = Box::new(EkAdapterRegistry { inner: AdapterRegistry::new() });
    *out_handle = Box::into_raw(registry);
    tracing::info!("adapter registry created");
    EkErrorCode::Ok
}

/// Destroy a registry and release every stored entry.
/// Null is a no-op; the handle must not be used afterwards.
///
/// # Safety
/// `handle` must be null or a live pointer from
/// [`ek_adapter_registry_create`].
#[no_mangle]
pub unsafe extern "C" fn ek_adapter_registry_destroy(handle: *mut EkAdapterRegistry) {
    if handle.is_null() {
        return;
    }
    drop(Box::from_raw(handle));
    tracing::debug!("adapter registry destroyed");
}

/// Register an adapter entry. The entry is deep-copied; the caller
/// retains ownership of `entry` and all its strings. An existing entry
/// with the same id is replaced.
///
/// # Safety
/// `handle` must be live; `entry` must point to a valid
/// [`EkAdapterEntry`] whose pointer fields are null or valid strings.
#[no_mangle]
pub unsafe extern "C" fn ek_adapter_registry_register(
    handle: *mut EkAdapterRegistry,
    entry: *const EkAdapterEntry,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    if entry.is_null() {
        return fail_null("entry");
    }
    clear_last_error();
    let parsed = match entry_from_c(&*entry) {
        Ok(e) => e,
        Err(err) => return fail_registry(err),
    };
    match (*handle).inner.register(&parsed) {
        Ok(()) => EkErrorCode::Ok,
        Err(err) => fail_registry(err),
    }
}

/// Remove an adapter entry by id.
///
/// # Safety
/// `handle` must be live; `adapter_id` must be a valid string.
#[no_mangle]
pub unsafe extern "C" fn ek_adapter_registry_remove(
    handle: *mut EkAdapterRegistry,
    adapter_id: *const c_char,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    clear_last_error();
    let adapter_id = match read_str(adapter_id, "adapter_id") {
        Ok(s) => s,
        Err(code) => return code,
    };
    match (*handle).inner.remove(adapter_id) {
        Ok(()) => EkErrorCode::Ok,
        Err(err) => fail_registry(err),
    }
}

/// Look up one adapter entry. On success `*out_entry` is a deep copy
/// the caller must release with [`ek_adapter_entry_free`].
///
/// # Safety
/// `handle` must be live; `adapter_id` and `out_entry` must be valid.
#[no_mangle]
pub unsafe extern "C" fn ek_adapter_registry_get(
    handle: *mut EkAdapterRegistry,
    adapter_id: *const c_char,
    out_entry: *mut *mut EkAdapterEntry,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    if out_entry.is_null() {
        return fail_null("out_entry");
    }
    clear_last_error();
    let adapter_id = match read_str(adapter_id, "adapter_id") {
        Ok(s) => s,
        Err(code) => return code,
    };
    let entry = match (*handle).inner.get(adapter_id) {
        Ok(e) => e,
        Err(err) => return fail_registry(err),
    };
    match entry_to_c(&entry) {
        Ok(ptr) => {
            *out_entry = ptr;
            EkErrorCode::Ok
        }
        Err(err) => fail_registry(err),
    }
}

/// Copy `entries` into a caller-owned C array, rolling back on failure.
unsafe fn entries_out(
    entries: Vec<crate::registry::AdapterEntry>,
    out_entries: *mut *mut *mut EkAdapterEntry,
    out_count: *mut usize,
) -> EkErrorCode {
    *out_count = 0;
    *out_entries = std::ptr::null_mut();
    if entries.is_empty() {
        return EkErrorCode::Ok;
    }

    let mut converted: Vec<*mut EkAdapterEntry> = Vec::with_capacity(entries.len());
    for entry in &entries {
        match entry_to_c(entry) {
            Ok(ptr) => converted.push(ptr),
            Err(err) => {
                for ptr in converted {
                    free_c_entry(ptr);
                }
                return fail_registry(err);
            }
        }
    }
    let count = converted.len();
    let array: Box<[*mut EkAdapterEntry]> = converted.into_boxed_slice();
    *out_entries = Box::into_raw(array) as *mut *mut EkAdapterEntry;
    *out_count = count;
    EkErrorCode::Ok
}

/// Get all adapter entries, ordered by id. An empty registry yields a
/// null array and zero count with `Ok`. The caller releases the result
/// with [`ek_adapter_entry_array_free`].
///
/// # Safety
/// `handle`, `out_entries` and `out_count` must be valid.
#[no_mangle]
pub unsafe extern "C" fn ek_adapter_registry_get_all(
    handle: *mut EkAdapterRegistry,
    out_entries: *mut *mut *mut EkAdapterEntry,
    out_count: *mut usize,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    if out_entries.is_null() || out_count.is_null() {
        return fail_null("out_entries/out_count");
    }
    clear_last_error();
    match (*handle).inner.get_all() {
        Ok(entries) => entries_out(entries, out_entries, out_count),
        Err(err) => fail_registry(err),
    }
}

/// Get the entries whose compatible-model list contains `model_id`.
/// Same ownership contract as [`ek_adapter_registry_get_all`].
///
/// # Safety
/// `handle`, `model_id`, `out_entries` and `out_count` must be valid.
#[no_mangle]
pub unsafe extern "C" fn ek_adapter_registry_get_for_model(
    handle: *mut EkAdapterRegistry,
    model_id: *const c_char,
    out_entries: *mut *mut *mut EkAdapterEntry,
    out_count: *mut usize,
) -> EkErrorCode {
    if handle.is_null() {
        return fail_null("handle");
    }
    if out_entries.is_null() || out_count.is_null() {
        return fail_null("out_entries/out_count");
    }
    clear_last_error();
    let model_id = match read_str(model_id, "model_id") {
        Ok(s) => s,
        Err(code) => return code,
    };
    match (*handle).inner.get_for_model(model_id) {
        Ok(entries) => entries_out(entries, out_entries, out_count),
        Err(err) => fail_registry(err),
    }
}

/// Free one entry returned by [`ek_adapter_registry_get`].
/// Null is a no-op.
///
/// # Safety
/// `entry` must be null or an unfreed pointer from this ABI.
#[no_mangle]
pub unsafe extern "C" fn ek_adapter_entry_free(entry: *mut EkAdapterEntry) {
    free_c_entry(entry);
}

/// Free an entry array returned by the get-all/get-for-model calls.
/// Null is a no-op.
///
/// # Safety
/// `(entries, count)` must be null or an unfreed pair from this ABI.
#[no_mangle]
pub unsafe extern "C" fn ek_adapter_entry_array_free(
    entries: *mut *mut EkAdapterEntry,
    count: usize,
) {
    if entries.is_null() {
        return;
    }
    let array = Box::from_raw(std::ptr::slice_from_raw_parts_mut(entries, count));
    for &ptr in array.iter() {
        free_c_entry(ptr);
    }
}
