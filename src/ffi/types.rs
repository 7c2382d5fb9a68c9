//! C-compatible mirrors of the core types and their ownership codec.
//!
//! Outbound conversion allocates every string independently; the
//! matching free walks the fields and is null-safe, so a caller can
//! free any value this module produced exactly once. Conversion builds
//! all allocations before handing any of them to C, so a failure midway
//! drops the partial set automatically and nothing leaks.

use std::ffi::{c_char, CStr, CString};

use crate::component::LoraAdapterInfo;
use crate::registry::{AdapterEntry, RegistryError};

/// C mirror of [`AdapterEntry`]. All strings are owned, UTF-8,
/// nul-terminated; optional fields are null when absent.
#[repr(C)]
pub struct EkAdapterEntry {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub description: *mut c_char,
    pub download_url: *mut c_char,
    pub filename: *mut c_char,
    pub compatible_model_ids: *mut *mut c_char,
    pub compatible_model_count: usize,
    pub file_size: i64,
    pub default_scale: f32,
}

/// C mirror of [`LoraAdapterInfo`].
#[repr(C)]
pub struct EkLoraAdapterInfo {
    pub path: *mut c_char,
    pub scale: f32,
    pub applied: bool,
}

/// Read a required C string field.
///
/// # Safety
/// `ptr` must be null or a valid nul-terminated string.
unsafe fn required_str(ptr: *const c_char, field: &str) -> Result<String, RegistryError> {
    if ptr.is_null() {
        return Err(RegistryError::InvalidArgument(format!("{field} is required")));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_string)
        .map_err(|_| RegistryError::InvalidArgument(format!("invalid UTF-8 in {field}")))
}

unsafe fn optional_str(ptr: *const c_char, field: &str) -> Result<Option<String>, RegistryError> {
    if ptr.is_null() {
        return Ok(None);
    }
    required_str(ptr, field).map(Some)
}

/// Validate and copy a caller-populated entry into an owned
/// [`AdapterEntry`]. The caller retains ownership of `entry`.
///
/// # Safety
/// All pointer fields of `entry` must be null or valid nul-terminated
/// strings; `compatible_model_ids` must point to at least
/// `compatible_model_count` elements.
pub(super) unsafe fn entry_from_c(entry: &EkAdapterEntry) -> Result<AdapterEntry, RegistryError> {
    let id = required_str(entry.id, "adapter id")?;
    if id.is_empty() {
        return Err(RegistryError::InvalidArgument("adapter id is required".into()));
    }

    let mut compatible_model_ids = Vec::with_capacity(entry.compatible_model_count);
    if entry.compatible_model_count > 0 {
        if entry.compatible_model_ids.is_null() {
            return Err(RegistryError::InvalidArgument(
                "compatible_model_ids is null but count is non-zero".into(),
            ));
        }
        for i in 0..entry.compatible_model_count {
            let ptr = *entry.compatible_model_ids.add(i);
            compatible_model_ids.push(required_str(ptr, "compatible model id")?);
        }
    }

    Ok(AdapterEntry {
        id,
        name: optional_str(entry.name, "name")?,
        description: optional_str(entry.description, "description")?,
        download_url: optional_str(entry.download_url, "download_url")?,
        filename: optional_str(entry.filename, "filename")?,
        compatible_model_ids,
        file_size: entry.file_size,
        default_scale: entry.default_scale,
    })
}

fn to_c_string(s: &str) -> Result<CString, RegistryError> {
    CString::new(s)
        .map_err(|_| RegistryError::InvalidArgument("interior nul in string field".into()))
}

fn to_c_string_opt(s: &Option<String>) -> Result<Option<CString>, RegistryError> {
    match s {
        Some(s) => to_c_string(s).map(Some),
        None => Ok(None),
    }
}

fn into_raw_opt(s: Option<CString>) -> *mut c_char {
    s.map(CString::into_raw).unwrap_or(std::ptr::null_mut())
}

/// Deep-copy an [`AdapterEntry`] into a heap-allocated C entry.
///
/// All CStrings are built first; only once every allocation succeeded
/// are they committed to raw pointers, so a failure leaves nothing for
/// the caller to free.
pub(super) fn entry_to_c(entry: &AdapterEntry) -> Result<*mut EkAdapterEntry, RegistryError> {
    let id = to_c_string(&entry.id)?;
    let name = to_c_string_opt(&entry.name)?;
    let description = to_c_string_opt(&entry.description)?;
    let download_url = to_c_string_opt(&entry.download_url)?;
    let filename = to_c_string_opt(&entry.filename)?;

    let mut models = Vec::with_capacity(entry.compatible_model_ids.len());
    for model_id in &entry.compatible_model_ids {
        models.push(to_c_string(model_id)?);
    }

    // Everything allocated; commit.
    let model_ptrs: Box<[*mut c_char]> =
        models.into_iter().map(CString::into_raw).collect();
    let compatible_model_count = model_ptrs.len();
    let compatible_model_ids = if compatible_model_count == 0 {
        std::ptr::null_mut()
    } else {
        Box::into_raw(model_ptrs) as *mut *mut c_char
    };

    let out = Box::new(EkAdapterEntry {
        id: id.into_raw(),
        name: into_raw_opt(name),
        description: into_raw_opt(description),
        download_url: into_raw_opt(download_url),
        filename: into_raw_opt(filename),
        compatible_model_ids,
        compatible_model_count,
        file_size: entry.file_size,
        default_scale: entry.default_scale,
    });
    Ok(Box::into_raw(out))
}

unsafe fn free_c_str(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Release a heap entry produced by [`entry_to_c`], field by field.
///
/// # Safety
/// `entry` must be null or a pointer previously returned by
/// [`entry_to_c`] that has not been freed yet.
pub(super) unsafe fn free_c_entry(entry: *mut EkAdapterEntry) {
    if entry.is_null() {
        return;
    }
    let entry = Box::from_raw(entry);
    free_c_str(entry.id);
    free_c_str(entry.name);
    free_c_str(entry.description);
    free_c_str(entry.download_url);
    free_c_str(entry.filename);
    if !entry.compatible_model_ids.is_null() {
        let models = Box::from_raw(std::ptr::slice_from_raw_parts_mut(
            entry.compatible_model_ids,
            entry.compatible_model_count,
        ));
        for &ptr in models.iter() {
            free_c_str(ptr);
        }
    }
}

/// Convert adapter bookkeeping into a caller-owned C array.
pub(super) fn lora_info_to_c(
    infos: &[LoraAdapterInfo],
) -> Result<(*mut EkLoraAdapterInfo, usize), RegistryError> {
    if infos.is_empty() {
        return Ok((std::ptr::null_mut(), 0));
    }
    let mut paths = Vec::with_capacity(infos.len());
    for info in infos {
        paths.push(to_c_string(&info.path)?);
    }
    let out: Box<[EkLoraAdapterInfo]> = infos
        .iter()
        .zip(paths)
        .map(|(info, path)| EkLoraAdapterInfo {
            path: path.into_raw(),
            scale: info.scale,
            applied: info.applied,
        })
        .collect();
    let count = out.len();
    Ok((Box::into_raw(out) as *mut EkLoraAdapterInfo, count))
}

/// Release an array produced by [`lora_info_to_c`].
///
/// # Safety
/// `(infos, count)` must originate from [`lora_info_to_c`] and not
/// have been freed already.
pub(super) unsafe fn free_lora_info_array(infos: *mut EkLoraAdapterInfo, count: usize) {
    if infos.is_null() {
        return;
    }
    let infos = Box::from_raw(std::ptr::slice_from_raw_parts_mut(infos, count));
    for info in infos.iter() {
        free_c_str(info.path);
    }
}
