//! C ABI for host bridges (Kotlin/JNI, Swift).
//!
//! Conventions, shared by every `ek_*` function:
//!
//! - Status is returned as [`EkErrorCode`]; data goes through out-params.
//! - Null handles and null out-params are rejected with `NullPointer`
//!   and a thread-local message readable via [`ek_last_error`].
//! - Every returned allocation is owned by the caller and has exactly
//!   one matching free function (`ek_adapter_entry_free`,
//!   `ek_adapter_entry_array_free`, `ek_lora_info_array_free`,
//!   `ek_string_free`). Freeing null is a no-op.
//! - Destroy functions accept null and double-destroy as no-ops.

mod component;
mod error;
mod logging;
mod registry;
mod types;

pub use component::{
    ek_llm_component_cancel, ek_llm_component_check_lora_compat, ek_llm_component_clear_lora,
    ek_llm_component_create, ek_llm_component_current_model_id, ek_llm_component_destroy,
    ek_llm_component_get_lora_info, ek_llm_component_is_loaded, ek_llm_component_load_lora,
    ek_llm_component_load_model, ek_llm_component_remove_lora, ek_llm_component_unload,
    ek_lora_info_array_free, ek_string_free, EkLlmComponent,
};
pub use error::{ek_clear_last_error, ek_last_error, EkErrorCode};
pub use logging::ek_configure_logging;
pub use registry::{
    ek_adapter_entry_array_free, ek_adapter_entry_free, ek_adapter_registry_create,
    ek_adapter_registry_destroy, ek_adapter_registry_get, ek_adapter_registry_get_all,
    ek_adapter_registry_get_for_model, ek_adapter_registry_register,
    ek_adapter_registry_remove, EkAdapterRegistry,
};
pub use types::{EkAdapterEntry, EkLoraAdapterInfo};
