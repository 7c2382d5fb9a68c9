//! Telemetry: logging initialization for the core.

mod logging;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
