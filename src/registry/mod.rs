//! LoRA adapter metadata registry.
//!
//! A catalog of adapter descriptors, independent from which adapters are
//! currently applied to a loaded model. Apps register adapters at startup
//! with explicit compatible model ids; host SDKs then query "which
//! adapters work with this model" without per-platform detection logic.
//!
//! The registry is metadata only. The runtime compatibility check
//! (`LlmComponent::check_lora_compatibility`) remains the safety net at
//! load time.

mod entry;
mod store;

pub use entry::AdapterEntry;
pub use store::{AdapterRegistry, RegistryError};
