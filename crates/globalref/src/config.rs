//! Library configuration read from the process environment

use std::env;

use crate::error::Result;
use crate::logging::{LogFormat, LogLevel, LogOptions};

/// Environment variable selecting the log level.
pub const LOG_LEVEL_VAR: &str = "GLOBALREF_LOG_LEVEL";

/// Environment variable selecting the log format.
pub const LOG_FORMAT_VAR: &str = "GLOBALREF_LOG_FORMAT";

/// Configuration applied when the library is loaded.
///
/// The reference operations themselves take no configuration; this only
/// controls the ambient layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Logging setup
    pub log: LogOptions,
}

impl BridgeConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with a custom log level.
    pub fn with_log_level(level: LogLevel) -> Self {
        Self {
            log: LogOptions {
                level,
                ..LogOptions::DEFAULT
            },
        }
    }

    /// Read `GLOBALREF_LOG_LEVEL` and `GLOBALREF_LOG_FORMAT`.
    ///
    /// Unset variables keep their defaults; set but unrecognised values are
    /// errors.
    pub fn from_env() -> Result<Self> {
        let level = env::var_os(LOG_LEVEL_VAR).map(|v| v.to_string_lossy().into_owned());
        let format = env::var_os(LOG_FORMAT_VAR).map(|v| v.to_string_lossy().into_owned());
        Self::new().with_overrides(level.as_deref(), format.as_deref())
    }

    /// Apply textual overrides on top of `self`.
    pub fn with_overrides(mut self, level: Option<&str>, format: Option<&str>) -> Result<Self> {
        if let Some(spec) = level {
            self.log.level = spec.trim().parse::<LogLevel>()?;
        }
        if let Some(spec) = format {
            self.log.format = spec.trim().parse::<LogFormat>()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn test_default_is_quiet_text() {
        let config = BridgeConfig::new();
        assert_eq!(config.log.level, LogLevel::Warn);
        assert_eq!(config.log.resolved().format, LogFormat::Text);
    }

    #[test]
    fn test_overrides_apply() {
        let config = BridgeConfig::new()
            .with_overrides(Some(" trace "), Some("json"))
            .unwrap();
        assert_eq!(config.log.level, LogLevel::Trace);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_overrides_keep_base() {
        let base = BridgeConfig::with_log_level(LogLevel::Debug);
        let config = base.with_overrides(None, None).unwrap();
        assert_eq!(config, base);
    }

    #[test]
    fn test_bad_override_is_an_error() {
        let err = BridgeConfig::new()
            .with_overrides(Some("chatty"), None)
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidLogLevel(_)));

        let err = BridgeConfig::new()
            .with_overrides(None, Some("yaml"))
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidLogFormat(_)));
    }
}
