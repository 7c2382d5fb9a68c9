//! C ABI surface tests.
//!
//! Drives the `ek_*` functions the way a host bridge would: handles
//! through out-params, negative status codes, thread-local last-error,
//! and one free function per allocation.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use edgekit_core::ffi::{
    ek_adapter_entry_array_free, ek_adapter_entry_free, ek_adapter_registry_create,
    ek_adapter_registry_destroy, ek_adapter_registry_get, ek_adapter_registry_get_all,
    ek_adapter_registry_get_for_model, ek_adapter_registry_register, ek_adapter_registry_remove,
    ek_clear_last_error, ek_last_error, ek_llm_component_create, ek_llm_component_destroy,
    ek_llm_component_get_lora_info, ek_llm_component_is_loaded, ek_llm_component_load_lora,
    ek_llm_component_load_model, ek_llm_component_check_lora_compat, ek_lora_info_array_free,
    ek_string_free, EkAdapterEntry, EkAdapterRegistry, EkErrorCode, EkLlmComponent,
    EkLoraAdapterInfo,
};

fn leak_cstr(s: &str) -> *mut c_char {
    CString::new(s).unwrap().into_raw()
}

unsafe fn last_error_string() -> Option<String> {
    let ptr = ek_last_error();
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// A caller-side entry struct. The registry deep-copies on register, so
/// the caller keeps ownership of these allocations and frees them after
/// the call.
unsafe fn make_caller_entry(id: &str, models: &[&str]) -> EkAdapterEntry {
    let model_ptrs: Vec<*mut c_char> = models.iter().map(|m| leak_cstr(m)).collect();
    let count = model_ptrs.len();
    let models_ptr = if count == 0 {
        ptr::null_mut()
    } else {
        Box::into_raw(model_ptrs.into_boxed_slice()) as *mut *mut c_char
    };
    EkAdapterEntry {
        id: leak_cstr(id),
        name: leak_cstr("Test Adapter"),
        description: ptr::null_mut(),
        download_url: ptr::null_mut(),
        filename: leak_cstr("adapter.gguf"),
        compatible_model_ids: models_ptr,
        compatible_model_count: count,
        file_size: 4096,
        default_scale: 0.75,
    }
}

unsafe fn free_caller_entry(entry: EkAdapterEntry) {
    for field in [entry.id, entry.name, entry.description, entry.download_url, entry.filename] {
        if !field.is_null() {
            drop(CString::from_raw(field));
        }
    }
    if !entry.compatible_model_ids.is_null() {
        let models = Box::from_raw(ptr::slice_from_raw_parts_mut(
            entry.compatible_model_ids,
            entry.compatible_model_count,
        ));
        for &m in models.iter() {
            drop(CString::from_raw(m));
        }
    }
}

#[test]
fn test_error_code_values_are_stable() {
    assert_eq!(EkErrorCode::Ok as i32, 0);
    assert_eq!(EkErrorCode::NullPointer as i32, -1);
    assert_eq!(EkErrorCode::InvalidArgument as i32, -2);
    assert_eq!(EkErrorCode::NotFound as i32, -3);
    assert_eq!(EkErrorCode::OutOfMemory as i32, -4);
    assert_eq!(EkErrorCode::InvalidState as i32, -5);
    assert_eq!(EkErrorCode::NotInitialized as i32, -6);
    assert_eq!(EkErrorCode::ModelLoadFailed as i32, -7);
    assert_eq!(EkErrorCode::Internal as i32, -99);
}

#[test]
fn test_null_handles_are_rejected() {
    unsafe {
        let entry = make_caller_entry("a", &[]);
        assert_eq!(
            ek_adapter_registry_register(ptr::null_mut(), &entry),
            EkErrorCode::NullPointer
        );
        assert!(last_error_string().is_some());
        free_caller_entry(entry);

        let mut out: *mut EkAdapterEntry = ptr::null_mut();
        let id = CString::new("a").unwrap();
        assert_eq!(
            ek_adapter_registry_get(ptr::null_mut(), id.as_ptr(), &mut out),
            EkErrorCode::NullPointer
        );

        // Null destroys are explicit no-ops.
        ek_adapter_registry_destroy(ptr::null_mut());
        ek_llm_component_destroy(ptr::null_mut());
    }
}

#[test]
fn test_last_error_lifecycle() {
    unsafe {
        let mut handle: *mut EkAdapterRegistry = ptr::null_mut();
        // Provoke an error, read it, then observe it cleared by the
        // next successful call.
        assert_eq!(
            ek_adapter_registry_register(ptr::null_mut(), ptr::null()),
            EkErrorCode::NullPointer
        );
        assert!(last_error_string().unwrap().contains("handle"));

        assert_eq!(ek_adapter_registry_create(&mut handle), EkErrorCode::Ok);
        assert!(last_error_string().is_none());

        ek_clear_last_error();
        assert!(ek_last_error().is_null());
        ek_adapter_registry_destroy(handle);
    }
}

#[test]
fn test_registry_register_get_round_trip() {
    unsafe {
        let mut registry = ptr::null_mut();
        assert_eq!(ek_adapter_registry_create(&mut registry), EkErrorCode::Ok);

        let entry = make_caller_entry("lora1", &["modelA", "modelB"]);
        assert_eq!(ek_adapter_registry_register(registry, &entry), EkErrorCode::Ok);
        free_caller_entry(entry);

        let mut out: *mut EkAdapterEntry = ptr::null_mut();
        let id = CString::new("lora1").unwrap();
        assert_eq!(ek_adapter_registry_get(registry, id.as_ptr(), &mut out), EkErrorCode::Ok);
        assert!(!out.is_null());

        let got = &*out;
        assert_eq!(CStr::from_ptr(got.id).to_str().unwrap(), "lora1");
        assert_eq!(CStr::from_ptr(got.name).to_str().unwrap(), "Test Adapter");
        assert!(got.description.is_null());
        assert_eq!(got.compatible_model_count, 2);
        let models = std::slice::from_raw_parts(got.compatible_model_ids, 2);
        assert_eq!(CStr::from_ptr(models[0]).to_str().unwrap(), "modelA");
        assert_eq!(CStr::from_ptr(models[1]).to_str().unwrap(), "modelB");
        assert_eq!(got.file_size, 4096);
        assert_eq!(got.default_scale, 0.75);

        ek_adapter_entry_free(out);
        ek_adapter_registry_destroy(registry);
    }
}

#[test]
fn test_registry_get_absent_is_not_found() {
    unsafe {
        let mut registry = ptr::null_mut();
        assert_eq!(ek_adapter_registry_create(&mut registry), EkErrorCode::Ok);

        let mut out: *mut EkAdapterEntry = ptr::null_mut();
        let id = CString::new("missing").unwrap();
        assert_eq!(
            ek_adapter_registry_get(registry, id.as_ptr(), &mut out),
            EkErrorCode::NotFound
        );
        assert!(out.is_null());
        assert!(last_error_string().unwrap().contains("missing"));

        assert_eq!(
            ek_adapter_registry_remove(registry, id.as_ptr()),
            EkErrorCode::NotFound
        );

        ek_adapter_registry_destroy(registry);
    }
}

#[test]
fn test_registry_enumeration_through_c_arrays() {
    unsafe {
        let mut registry = ptr::null_mut();
        assert_eq!(ek_adapter_registry_create(&mut registry), EkErrorCode::Ok);

        for (id, models) in [
            ("lora1", vec!["modelA", "modelB"]),
            ("lora2", vec!["modelB"]),
            ("lora3", vec![]),
        ] {
            let entry = make_caller_entry(id, &models);
            assert_eq!(ek_adapter_registry_register(registry, &entry), EkErrorCode::Ok);
            free_caller_entry(entry);
        }

        let mut entries: *mut *mut EkAdapterEntry = ptr::null_mut();
        let mut count = 0usize;
        assert_eq!(
            ek_adapter_registry_get_all(registry, &mut entries, &mut count),
            EkErrorCode::Ok
        );
        assert_eq!(count, 3);
        // Enumeration is ordered by id.
        let all = std::slice::from_raw_parts(entries, count);
        assert_eq!(CStr::from_ptr((*all[0]).id).to_str().unwrap(), "lora1");
        assert_eq!(CStr::from_ptr((*all[2]).id).to_str().unwrap(), "lora3");
        ek_adapter_entry_array_free(entries, count);

        let model = CString::new("modelB").unwrap();
        let mut entries = ptr::null_mut();
        let mut count = 0usize;
        assert_eq!(
            ek_adapter_registry_get_for_model(registry, model.as_ptr(), &mut entries, &mut count),
            EkErrorCode::Ok
        );
        assert_eq!(count, 2);
        ek_adapter_entry_array_free(entries, count);

        // Freeing a null array is a no-op.
        ek_adapter_entry_array_free(ptr::null_mut(), 0);

        ek_adapter_registry_destroy(registry);
    }
}

#[test]
fn test_register_rejects_empty_id() {
    unsafe {
        let mut registry = ptr::null_mut();
        assert_eq!(ek_adapter_registry_create(&mut registry), EkErrorCode::Ok);

        let entry = make_caller_entry("", &[]);
        assert_eq!(
            ek_adapter_registry_register(registry, &entry),
            EkErrorCode::InvalidArgument
        );
        free_caller_entry(entry);

        ek_adapter_registry_destroy(registry);
    }
}

#[test]
fn test_component_create_and_lora_before_model() {
    unsafe {
        let mut component: *mut EkLlmComponent = ptr::null_mut();
        assert_eq!(ek_llm_component_create(&mut component), EkErrorCode::Ok);
        assert!(!ek_llm_component_is_loaded(component));

        let path = CString::new("a.gguf").unwrap();
        assert_eq!(
            ek_llm_component_load_lora(component, path.as_ptr(), 0.8),
            EkErrorCode::InvalidState
        );
        assert!(last_error_string().is_some());

        let mut infos: *mut EkLoraAdapterInfo = ptr::null_mut();
        let mut count = 0usize;
        assert_eq!(
            ek_llm_component_get_lora_info(component, &mut infos, &mut count),
            EkErrorCode::Ok
        );
        assert_eq!(count, 0);
        ek_lora_info_array_free(infos, count);

        ek_llm_component_destroy(component);
    }
}

#[test]
fn test_component_load_model_failure_code() {
    unsafe {
        let mut component: *mut EkLlmComponent = ptr::null_mut();
        assert_eq!(ek_llm_component_create(&mut component), EkErrorCode::Ok);

        let path = CString::new("/nonexistent/base.gguf").unwrap();
        let model_id = CString::new("m1").unwrap();
        assert_eq!(
            ek_llm_component_load_model(component, path.as_ptr(), model_id.as_ptr(), ptr::null()),
            EkErrorCode::ModelLoadFailed
        );
        assert!(last_error_string().unwrap().contains("base.gguf"));
        assert!(!ek_llm_component_is_loaded(component));

        ek_llm_component_destroy(component);
    }
}

#[test]
fn test_component_check_compat_message_ownership() {
    unsafe {
        let mut component: *mut EkLlmComponent = ptr::null_mut();
        assert_eq!(ek_llm_component_create(&mut component), EkErrorCode::Ok);

        let path = CString::new("a.gguf").unwrap();
        let mut message: *mut c_char = ptr::null_mut();
        let compatible = ek_llm_component_check_lora_compat(component, path.as_ptr(), &mut message);
        assert!(!compatible);
        assert!(!message.is_null());
        assert!(CStr::from_ptr(message).to_str().unwrap().contains("no model loaded"));
        ek_string_free(message);

        // Null out_message means the caller only wants the verdict.
        assert!(!ek_llm_component_check_lora_compat(component, path.as_ptr(), ptr::null_mut()));

        ek_llm_component_destroy(component);
    }
}

#[test]
fn test_is_loaded_on_null_handle() {
    unsafe {
        assert!(!ek_llm_component_is_loaded(ptr::null()));
    }
}

#[test]
fn test_string_free_null_is_noop() {
    unsafe {
        ek_string_free(ptr::null_mut());
    }
}
