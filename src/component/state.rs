//! Component lifecycle states and per-adapter bookkeeping.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an [`LlmComponent`](super::LlmComponent).
///
/// Transitions: `Idle → ModelLoaded → Idle` any number of times, then
/// `Destroyed` (terminal). Invalid transitions are rejected with a typed
/// error rather than silently ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    /// Created, no model loaded.
    Idle,
    /// A model is loaded and ready for generation.
    ModelLoaded {
        model_id: String,
        model_name: Option<String>,
    },
    /// The native handle has been released. Terminal.
    Destroyed,
}

impl ComponentState {
    /// Short state name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ModelLoaded { .. } => "model-loaded",
            Self::Destroyed => "destroyed",
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        matches!(self, Self::ModelLoaded { .. })
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

/// Bookkeeping record for one LoRA adapter known to the component.
///
/// `applied` is true only while the adapter is active on the current
/// inference context; unloading or replacing the model flips it to
/// false without dropping the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraAdapterInfo {
    pub path: String,
    pub scale: f32,
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names() {
        assert_eq!(ComponentState::Idle.name(), "idle");
        assert_eq!(ComponentState::Destroyed.name(), "destroyed");
        let loaded = ComponentState::ModelLoaded {
            model_id: "m1".into(),
            model_name: None,
        };
        assert_eq!(loaded.name(), "model-loaded");
        assert!(loaded.is_model_loaded());
        assert!(!loaded.is_destroyed());
    }
}
