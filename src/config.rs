//! Core configuration loading from environment variables.
//!
//! All values are loaded from `EDGEKIT_*` environment variables with
//! sensible defaults. Invalid values fall back to defaults without
//! crashing; the host bridge is expected to set these before the first
//! component is created.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `EDGEKIT_N_CTX` | 2048 | GGUF context window size (tokens) |
//! | `EDGEKIT_N_THREADS` | 0 | Inference threads (0 = auto) |
//! | `EDGEKIT_N_GPU_LAYERS` | 0 | Layers offloaded to GPU |
//! | `EDGEKIT_LOG_LEVEL` | info | tracing filter for core logging |

use crate::engine::EngineConfig;

/// Core configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub engine: EngineConfig,
    pub log_level: String,
}

impl EnvConfig {
    /// Load configuration, falling back to defaults for anything
    /// missing or unparseable.
    pub fn load() -> Self {
        Self {
            engine: EngineConfig {
                n_ctx: parse_u32("EDGEKIT_N_CTX", 2048),
                n_threads: parse_u32("EDGEKIT_N_THREADS", 0),
                n_gpu_layers: parse_u32("EDGEKIT_N_GPU_LAYERS", 0),
            },
            log_level: std::env::var("EDGEKIT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::load()
    }
}

/// Parse a `u32` env var, returning `default` on missing or invalid.
fn parse_u32(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u32>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        // Relies on the test environment not defining EDGEKIT_* vars.
        let config = EnvConfig::load();
        assert_eq!(config.engine.n_ctx, 2048);
        assert_eq!(config.engine.n_gpu_layers, 0);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn invalid_value_falls_back() {
        std::env::set_var("EDGEKIT_TEST_BOGUS", "not-a-number");
        assert_eq!(parse_u32("EDGEKIT_TEST_BOGUS", 7), 7);
        std::env::remove_var("EDGEKIT_TEST_BOGUS");
    }
}
