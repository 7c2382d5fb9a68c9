//! Logging configuration entry point for host bridges.

use std::ffi::{c_char, CStr};
use std::path::PathBuf;

use crate::telemetry::{init_logging, LogConfig, LogError, LogFormat};

use super::error::{clear_last_error, set_last_error, EkErrorCode};

/// Initialize core logging. `level` is a tracing filter directive
/// (e.g. "info", "edgekit_core=debug"); null means the `EDGEKIT_LOG_LEVEL`
/// default. `log_file` is an optional file path; null logs to stderr.
///
/// Calling again after a successful initialization returns `Ok` and
/// leaves the existing subscriber in place.
///
/// # Safety
/// `level` and `log_file` must be null or valid nul-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn ek_configure_logging(
    level: *const c_char,
    log_file: *const c_char,
) -> EkErrorCode {
    clear_last_error();
    let level = if level.is_null() {
        crate::config::EnvConfig::load().log_level
    } else {
        match CStr::from_ptr(level).to_str() {
            Ok(s) => s.to_string(),
            Err(_) => {
                set_last_error("invalid UTF-8 in log level");
                return EkErrorCode::InvalidArgument;
            }
        }
    };
    let output_path = if log_file.is_null() {
        None
    } else {
        match CStr::from_ptr(log_file).to_str() {
            Ok(s) => Some(PathBuf::from(s)),
            Err(_) => {
                set_last_error("invalid UTF-8 in log file path");
                return EkErrorCode::InvalidArgument;
            }
        }
    };

    let config = LogConfig { format: LogFormat::Json, level, output_path };
    match init_logging(&config) {
        Ok(()) => EkErrorCode::Ok,
        // Hosts may route through here more than once; keep it idempotent.
        Err(LogError::AlreadyInitialized) => EkErrorCode::Ok,
        Err(err @ LogError::InvalidFilter(_)) => {
            set_last_error(err.to_string());
            EkErrorCode::InvalidArgument
        }
        Err(err) => {
            set_last_error(err.to_string());
            EkErrorCode::Internal
        }
    }
}
