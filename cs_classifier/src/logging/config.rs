//! Logging configuration
//!
//! Compile-time limits come from `config::compile_time::logging`; user
//! preferences come from `config::runtime::LoggingPreferences`.

use crate::config::compile_time::logging::*;
use crate::config::runtime::LoggingPreferences;

/// Preferences from `CSC_*` environment variables, or defaults
pub fn get_runtime_preferences() -> LoggingPreferences {
    LoggingPreferences::default()
}

pub fn get_memory_logger_capacity() -> usize {
    MEMORY_LOGGER_CAPACITY
}

/// Validate compile-time limits against each other
pub fn validate_config() -> Result<(), String> {
    if MAX_LOG_EVENTS_PER_FILE > MEMORY_LOGGER_CAPACITY {
        return Err("Max log events per file exceeds memory logger capacity".to_string());
    }
    if MAX_LOG_MESSAGE_LENGTH < 80 {
        return Err(format!(
            "Max log message length too small: {}",
            MAX_LOG_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(validate_config().is_ok());
    }
}
