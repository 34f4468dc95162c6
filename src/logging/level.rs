use crate::error::{EloverblikError, Result};
use tracing::Level;

/// Parse a log level name, case-insensitive. `WARNING` is accepted as an
/// alias for `WARN`.
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(EloverblikError::config(format!(
            "Invalid log level: {}",
            level_str
        ))),
    }
}
