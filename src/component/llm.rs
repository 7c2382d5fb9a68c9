//! The LLM component state machine.
//!
//! A single-owner serialized actor: at most one mutating operation
//! (load, unload, adapter add/remove/clear) runs at a time behind one
//! mutex. Read-only queries (`is_loaded`, `current_model_id`) and
//! `cancel` are served off separate atomics/locks so they never block
//! behind a long-running mutation such as a model load.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::engine::{EngineConfig, GgufEngine};

use super::error::ComponentError;
use super::state::{ComponentState, LoraAdapterInfo};

struct Inner {
    state: ComponentState,
    engine: GgufEngine,
    adapters: Vec<LoraAdapterInfo>,
}

/// Lifecycle state machine owning a native inference handle.
pub struct LlmComponent {
    inner: Mutex<Inner>,
    // Mirrors of the loaded state, readable without the mutation lock.
    loaded: AtomicBool,
    model_id: RwLock<Option<String>>,
    // Token for the in-flight generation loop; re-armed on model load.
    cancel: Mutex<CancellationToken>,
}

impl LlmComponent {
    /// Create an idle component with an engine built from `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ComponentState::Idle,
                engine: GgufEngine::new(config),
                adapters: Vec::new(),
            }),
            loaded: AtomicBool::new(false),
            model_id: RwLock::new(None),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Load a model, replacing any previously loaded one.
    ///
    /// The inference context is recreated, so adapters applied to the
    /// previous model are not silently reapplied: their bookkeeping
    /// survives with `applied = false` and the caller re-applies the
    /// ones it still wants.
    pub fn load_model(
        &self,
        path: &str,
        model_id: &str,
        model_name: Option<&str>,
    ) -> Result<(), ComponentError> {
        if path.is_empty() {
            return Err(ComponentError::InvalidArgument("model path is empty".into()));
        }
        if model_id.is_empty() {
            return Err(ComponentError::InvalidArgument("model id is empty".into()));
        }

        let mut inner = self.inner.lock();
        if inner.state.is_destroyed() {
            return Err(ComponentError::invalid_state("load_model", "component destroyed"));
        }

        inner
            .engine
            .load_model(Path::new(path))
            .map_err(|e| ComponentError::ModelLoadFailed(e.to_string()))?;

        for adapter in &mut inner.adapters {
            adapter.applied = false;
        }
        inner.state = ComponentState::ModelLoaded {
            model_id: model_id.to_string(),
            model_name: model_name.map(str::to_string),
        };

        *self.model_id.write() = Some(model_id.to_string());
        self.loaded.store(true, Ordering::Release);
        *self.cancel.lock() = CancellationToken::new();

        tracing::info!(model_id, path, "model loaded");
        Ok(())
    }

    /// Unload the current model. No-op when already idle or destroyed.
    ///
    /// Adapter bookkeeping is kept (marked not applied); only an
    /// explicit [`clear_lora_adapters`](Self::clear_lora_adapters)
    /// removes it.
    pub fn unload(&self) {
        let mut inner = self.inner.lock();
        if inner.state.is_destroyed() {
            return;
        }
        inner.engine.unload();
        for adapter in &mut inner.adapters {
            adapter.applied = false;
        }
        if inner.state.is_model_loaded() {
            tracing::info!("model unloaded");
        }
        inner.state = ComponentState::Idle;

        self.loaded.store(false, Ordering::Release);
        *self.model_id.write() = None;
    }

    /// Apply a LoRA adapter to the loaded model.
    ///
    /// Requires `ModelLoaded`. On success the adapter is stacked (or its
    /// scale updated if the path was already known) and marked applied.
    pub fn load_lora_adapter(&self, path: &str, scale: f32) -> Result<(), ComponentError> {
        if path.is_empty() {
            return Err(ComponentError::InvalidArgument("adapter path is empty".into()));
        }

        let mut inner = self.inner.lock();
        if !inner.state.is_model_loaded() {
            return Err(ComponentError::invalid_state(
                "load_lora_adapter",
                format!("requires a loaded model, state is {}", inner.state.name()),
            ));
        }

        inner
            .engine
            .apply_adapter(Path::new(path), scale)
            .map_err(|e| ComponentError::ModelLoadFailed(e.to_string()))?;

        match inner.adapters.iter_mut().find(|a| a.path == path) {
            Some(existing) => {
                existing.scale = scale;
                existing.applied = true;
            }
            None => inner.adapters.push(LoraAdapterInfo {
                path: path.to_string(),
                scale,
                applied: true,
            }),
        }
        tracing::info!(path, scale, "LoRA adapter loaded");
        Ok(())
    }

    /// Remove one adapter's bookkeeping (and native state, if any).
    ///
    /// Fails with `InvalidState` if the path was never applied.
    pub fn remove_lora_adapter(&self, path: &str) -> Result<(), ComponentError> {
        if path.is_empty() {
            return Err(ComponentError::InvalidArgument("adapter path is empty".into()));
        }

        let mut inner = self.inner.lock();
        if inner.state.is_destroyed() {
            return Err(ComponentError::invalid_state("remove_lora_adapter", "component destroyed"));
        }
        if !inner.adapters.iter().any(|a| a.path == path) {
            return Err(ComponentError::invalid_state(
                "remove_lora_adapter",
                format!("adapter was never applied: {path}"),
            ));
        }
        inner.engine.remove_adapter(Path::new(path));
        inner.adapters.retain(|a| a.path != path);
        tracing::info!(path, "LoRA adapter removed");
        Ok(())
    }

    /// Drop all adapter bookkeeping and native adapter state.
    ///
    /// Safe to call with none applied.
    pub fn clear_lora_adapters(&self) -> Result<(), ComponentError> {
        let mut inner = self.inner.lock();
        if inner.state.is_destroyed() {
            return Err(ComponentError::invalid_state("clear_lora_adapters", "component destroyed"));
        }
        inner.engine.clear_adapters();
        inner.adapters.clear();
        Ok(())
    }

    /// Check whether an adapter could be applied to the loaded model.
    ///
    /// Pure query, never mutates. Without an active model it reports
    /// incompatible with an explanatory message rather than failing.
    pub fn check_lora_compatibility(&self, path: &str) -> (bool, Option<String>) {
        if path.is_empty() {
            return (false, Some("adapter path is empty".to_string()));
        }
        let inner = self.inner.lock();
        if inner.state.is_destroyed() {
            return (false, Some("component destroyed".to_string()));
        }
        if !inner.state.is_model_loaded() {
            return (false, Some("no model loaded to check against".to_string()));
        }
        match inner.engine.check_adapter(Path::new(path)) {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        }
    }

    /// Snapshot of every adapter record (applied or not).
    pub fn get_lora_info(&self) -> Vec<LoraAdapterInfo> {
        self.inner.lock().adapters.clone()
    }

    /// Cooperative cancellation of any in-flight generation.
    ///
    /// Sets the component's cancellation token, which the generation
    /// loop consults at its suspension points. Cannot preempt a
    /// load/unload in progress; no-op when nothing is in flight.
    pub fn cancel(&self) {
        self.cancel.lock().cancel();
    }

    /// Token the generation loop should observe. Re-armed on each
    /// successful model load.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    /// True if a model is loaded. Never blocks behind a mutation.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Id of the loaded model, if any. Never blocks behind a mutation.
    pub fn current_model_id(&self) -> Option<String> {
        self.model_id.read().clone()
    }

    /// Current lifecycle state name (diagnostics).
    pub fn state_name(&self) -> &'static str {
        self.inner.lock().state.name()
    }

    /// Release the native handle and all bookkeeping. Idempotent:
    /// calling destroy again (or any further mutation) is rejected
    /// without double-releasing anything.
    pub fn destroy(&self) {
        let mut inner = self.inner.lock();
        if inner.state.is_destroyed() {
            return;
        }
        inner.engine.unload();
        inner.adapters.clear();
        inner.state = ComponentState::Destroyed;

        self.loaded.store(false, Ordering::Release);
        *self.model_id.write() = None;
        self.cancel.lock().cancel();
        tracing::debug!("LLM component destroyed");
    }
}

impl Default for LlmComponent {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
