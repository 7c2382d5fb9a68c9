//! llama-cpp-2 backend for GGUF models and LoRA adapters.
//!
//! Holds the loaded model and the adapters initialized against it.
//! Inference contexts are created per generation call and pick up the
//! current adapter set, so adapter transitions here take effect on the
//! next context without touching in-flight state.

use std::path::{Path, PathBuf};

use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::LlamaModel;
use llama_cpp_2::model::LlamaLoraAdapter;

use super::{EngineConfig, EngineError};

struct ActiveAdapter {
    path: PathBuf,
    // Held so the native adapter outlives every context it is set on.
    #[allow(dead_code)]
    adapter: LlamaLoraAdapter,
    scale: f32,
}

/// Loaded llama-cpp-2 model plus its applied adapters.
pub(super) struct LlamaEngineInner {
    #[allow(dead_code)]
    backend: LlamaBackend,
    model: LlamaModel,
    adapters: Vec<ActiveAdapter>,
    // Context parameters, consumed when generation creates a context.
    #[allow(dead_code)]
    n_ctx: u32,
    #[allow(dead_code)]
    n_threads: i32,
}

// SAFETY: LlamaModel and LlamaBackend are Send+Sync in llama-cpp-2.
unsafe impl Send for LlamaEngineInner {}
unsafe impl Sync for LlamaEngineInner {}

impl LlamaEngineInner {
    /// Load a GGUF model from disk.
    pub(super) fn load(path: &Path, config: &EngineConfig) -> Result<Self, EngineError> {
        let backend = LlamaBackend::init()
            .map_err(|e| EngineError::LoadFailed(format!("backend init: {e}")))?;
        let model_params =
            LlamaModelParams::default().with_n_gpu_layers(config.n_gpu_layers);
        let model = LlamaModel::load_from_file(&backend, path, &model_params)
            .map_err(|e| EngineError::LoadFailed(format!("load: {e}")))?;
        Ok(Self {
            backend,
            model,
            adapters: Vec::new(),
            n_ctx: config.n_ctx,
            n_threads: super::resolve_threads(config.n_threads),
        })
    }

    /// Initialize a LoRA adapter against the loaded model and record it
    /// for application to subsequently created contexts.
    ///
    /// Re-applying an already active path only updates its scale.
    pub(super) fn apply_adapter(&mut self, path: &Path, scale: f32) -> Result<(), EngineError> {
        if let Some(existing) = self.adapters.iter_mut().find(|a| a.path == path) {
            existing.scale = scale;
            return Ok(());
        }
        let adapter = self
            .model
            .lora_adapter_init(path)
            .map_err(|e| EngineError::AdapterFailed(format!("{}: {e}", path.display())))?;
        self.adapters.push(ActiveAdapter { path: path.to_path_buf(), adapter, scale });
        Ok(())
    }

    pub(super) fn remove_adapter(&mut self, path: &Path) {
        self.adapters.retain(|a| a.path != path);
    }

    pub(super) fn clear_adapters(&mut self) {
        self.adapters.clear();
    }

    /// Probe whether the adapter file initializes against this model.
    ///
    /// The probe adapter is dropped immediately; engine state is not
    /// mutated.
    pub(super) fn check_adapter(&self, path: &Path) -> Result<(), String> {
        match self.model.lora_adapter_init(path) {
            Ok(_probe) => Ok(()),
            Err(e) => Err(format!("incompatible LoRA adapter: {e}")),
        }
    }
}
