//! GGUF inference engine.
//!
//! Wraps the llama-cpp-2 backend behind the `gguf` feature. Without the
//! feature the engine still performs metadata-level loads (file checks,
//! size bookkeeping) so the component lifecycle above it behaves the
//! same; only actual weight loading and decoding require the backend.

#[cfg(feature = "gguf")]
mod llama;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Magic bytes at the start of every GGUF file.
const GGUF_MAGIC: &[u8; 4] = b"GGUF";

/// Errors raised by the native engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Model load failed: {0}")]
    LoadFailed(String),

    #[error("Adapter load failed: {0}")]
    AdapterFailed(String),

    #[error("No model loaded")]
    NoModel,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Context window size in tokens.
    pub n_ctx: u32,
    /// Inference threads (0 = resolve from CPU count).
    pub n_threads: u32,
    /// Layers to offload to GPU (0 = CPU only).
    pub n_gpu_layers: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { n_ctx: 2048, n_threads: 0, n_gpu_layers: 0 }
    }
}

/// Resolve a thread count, using the CPU count when `n` is 0.
///
/// Capped at 16: inference is memory-bound and more threads show
/// diminishing returns on high-core systems.
pub(crate) fn resolve_threads(n: u32) -> i32 {
    if n == 0 {
        let optimal = num_cpus::get().clamp(1, 16);
        i32::try_from(optimal).unwrap_or(4)
    } else {
        i32::try_from(n).unwrap_or(4)
    }
}

/// The native inference handle.
///
/// Owns the loaded model (if any) and the set of LoRA adapters applied
/// to it. Model and adapter transitions are synchronous: the underlying
/// inference context is recreated before the call returns, so reads
/// after a transition observe a consistent state.
pub struct GgufEngine {
    config: EngineConfig,
    loaded_path: Option<PathBuf>,
    model_size: u64,
    #[cfg(feature = "gguf")]
    inner: Option<llama::LlamaEngineInner>,
}

impl GgufEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            loaded_path: None,
            model_size: 0,
            #[cfg(feature = "gguf")]
            inner: None,
        }
    }

    /// Load a GGUF model, replacing any previously loaded one.
    ///
    /// The previous model and its inference context are released only
    /// after the new model validated; a failed load leaves the engine
    /// unchanged.
    pub fn load_model(&mut self, path: &Path) -> Result<(), EngineError> {
        validate_gguf_file(path).map_err(EngineError::LoadFailed)?;
        let size = std::fs::metadata(path)
            .map_err(|e| EngineError::LoadFailed(format!("{}: {e}", path.display())))?
            .len();

        #[cfg(feature = "gguf")]
        {
            let inner = llama::LlamaEngineInner::load(path, &self.config)?;
            self.inner = Some(inner);
        }

        self.loaded_path = Some(path.to_path_buf());
        self.model_size = size;
        tracing::info!(path = %path.display(), size_bytes = size, "GGUF model loaded");
        Ok(())
    }

    /// Release the loaded model and its inference context.
    pub fn unload(&mut self) {
        #[cfg(feature = "gguf")]
        {
            self.inner = None;
        }
        if self.loaded_path.take().is_some() {
            tracing::info!("GGUF model unloaded");
        }
        self.model_size = 0;
    }

    /// True if a model is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded_path.is_some()
    }

    /// Size of the loaded model file in bytes (0 if none).
    pub fn model_size(&self) -> u64 {
        self.model_size
    }

    /// Apply a LoRA adapter at the given scale.
    ///
    /// Requires a loaded model. The inference context is recreated with
    /// the adapter applied before this returns.
    pub fn apply_adapter(&mut self, path: &Path, scale: f32) -> Result<(), EngineError> {
        if !self.is_loaded() {
            return Err(EngineError::NoModel);
        }
        validate_gguf_file(path).map_err(EngineError::AdapterFailed)?;

        #[cfg(feature = "gguf")]
        if let Some(inner) = &mut self.inner {
            inner.apply_adapter(path, scale)?;
        }

        tracing::info!(path = %path.display(), scale, "LoRA adapter applied");
        Ok(())
    }

    /// Remove a previously applied adapter. No-op if the backend holds
    /// no native state for the path (e.g. after a model replace).
    pub fn remove_adapter(&mut self, path: &Path) {
        #[cfg(feature = "gguf")]
        if let Some(inner) = &mut self.inner {
            inner.remove_adapter(path);
        }
        #[cfg(not(feature = "gguf"))]
        let _ = path;
    }

    /// Remove all applied adapters. Safe with none applied.
    pub fn clear_adapters(&mut self) {
        #[cfg(feature = "gguf")]
        if let Some(inner) = &mut self.inner {
            inner.clear_adapters();
        }
    }

    /// Check whether an adapter file could be applied to the loaded
    /// model. Pure query: never mutates engine state.
    ///
    /// Returns `Ok(())` when compatible, otherwise an explanatory
    /// message.
    pub fn check_adapter(&self, path: &Path) -> Result<(), String> {
        if !self.is_loaded() {
            return Err("no model loaded to check against".to_string());
        }
        validate_gguf_file(path)?;

        #[cfg(feature = "gguf")]
        if let Some(inner) = &self.inner {
            return inner.check_adapter(path);
        }

        Ok(())
    }
}

/// Validate that `path` exists and starts with the GGUF magic.
fn validate_gguf_file(path: &Path) -> Result<(), String> {
    let mut file = File::open(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)
        .map_err(|_| format!("{}: file too short for GGUF header", path.display()))?;
    if &magic != GGUF_MAGIC {
        return Err(format!("{}: not a GGUF file", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gguf_fixture(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(b"GGUFxxxx-test-fixture").unwrap();
        path
    }

    #[test]
    fn load_requires_existing_file() {
        let mut engine = GgufEngine::new(EngineConfig::default());
        let err = engine.load_model(Path::new("/nonexistent/model.gguf")).unwrap_err();
        assert!(matches!(err, EngineError::LoadFailed(_)));
        assert!(!engine.is_loaded());
    }

    #[test]
    fn load_rejects_non_gguf_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.gguf");
        File::create(&path).unwrap().write_all(b"not a model").unwrap();

        let mut engine = GgufEngine::new(EngineConfig::default());
        let err = engine.load_model(&path).unwrap_err();
        assert!(err.to_string().contains("not a GGUF file"));
    }

    #[cfg(not(feature = "gguf"))]
    #[test]
    fn metadata_load_and_unload() {
        let dir = tempfile::tempdir().unwrap();
        let path = gguf_fixture(&dir, "base.gguf");

        let mut engine = GgufEngine::new(EngineConfig::default());
        engine.load_model(&path).unwrap();
        assert!(engine.is_loaded());
        assert!(engine.model_size() > 0);

        engine.unload();
        assert!(!engine.is_loaded());
        assert_eq!(engine.model_size(), 0);
    }

    #[test]
    fn adapter_requires_model() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = gguf_fixture(&dir, "a.gguf");

        let mut engine = GgufEngine::new(EngineConfig::default());
        let err = engine.apply_adapter(&adapter, 0.5).unwrap_err();
        assert!(matches!(err, EngineError::NoModel));
    }

    #[test]
    fn check_adapter_without_model_reports_message() {
        let engine = GgufEngine::new(EngineConfig::default());
        let msg = engine.check_adapter(Path::new("a.gguf")).unwrap_err();
        assert!(msg.contains("no model loaded"));
    }

    #[test]
    fn thread_resolution() {
        assert!(resolve_threads(0) >= 1);
        assert!(resolve_threads(0) <= 16);
        assert_eq!(resolve_threads(6), 6);
    }
}
