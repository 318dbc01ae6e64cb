//! Forwards classifier log events to the `log` facade

use cs_classifier::logging::{LogEvent, LogLevel, Logger};

pub struct LogBridge;

impl LogBridge {
    pub fn level_of(level: LogLevel) -> log::Level {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }

    /// The classifier level matching a `log` filter name
    pub fn min_level(filter: &str) -> LogLevel {
        cs_classifier::config::runtime::parse_log_level(filter).unwrap_or(LogLevel::Warning)
    }
}

impl Logger for LogBridge {
    fn log(&self, event: &LogEvent) {
        let level = Self::level_of(event.level);
        if !log::log_enabled!(target: "cs_classifier", level) {
            return;
        }
        if event.context.is_empty() {
            log::log!(target: "cs_classifier", level, "{}", event.format());
        } else {
            let context = event
                .context
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join(" ");
            log::log!(target: "cs_classifier", level, "{} ({})", event.format(), context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogBridge::level_of(LogLevel::Warning), log::Level::Warn);
        assert_eq!(LogBridge::min_level("debug"), LogLevel::Debug);
        assert_eq!(LogBridge::min_level("nonsense"), LogLevel::Warning);
    }
}
