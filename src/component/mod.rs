//! LLM component: the lifecycle state machine around the native engine.

mod error;
mod llm;
mod state;

pub use error::ComponentError;
pub use llm::LlmComponent;
pub use state::{ComponentState, LoraAdapterInfo};
