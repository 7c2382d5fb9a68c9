//! EdgeKit native core
//!
//! The platform-independent core of an on-device AI SDK. Host bridges
//! (Kotlin, Swift) bind to the C ABI in [`ffi`]; everything above that
//! boundary (UI, downloads, persistence) lives in the host layers.
//!
//! # Components
//!
//! - **Adapter registry** ([`registry`]): a thread-safe catalog of LoRA
//!   adapter descriptors. The registry owns all stored data; every value
//!   it returns is an independent deep copy.
//! - **LLM component** ([`component`]): the lifecycle state machine around
//!   a native inference handle, covering model load/unload and the stack
//!   of applied LoRA adapters.
//! - **Engine** ([`engine`]): the GGUF backend. Real inference requires
//!   the `gguf` feature (llama-cpp-2); without it the engine performs
//!   metadata-level loads so lifecycle bookkeeping still works.
//!
//! # Ownership across the boundary
//!
//! Nothing returned through [`ffi`] borrows from internal state. Every
//! returned allocation has exactly one matching free function and must be
//! released exactly once by the caller.

pub mod component;
pub mod config;
pub mod engine;
pub mod ffi;
pub mod registry;
pub mod telemetry;

pub use component::{ComponentError, ComponentState, LlmComponent, LoraAdapterInfo};
pub use config::EnvConfig;
pub use engine::{EngineConfig, EngineError, GgufEngine};
pub use registry::{AdapterEntry, AdapterRegistry, RegistryError};
