//! File-based logging configuration
//!
//! ```json
//! {
//!   "product_name_short": "billing",
//!   "sampling": { "tick": 1000, "first": 100, "thereafter": 100 },
//!   "console": { "enabled": true, "level": "debug" },
//!   "file": { "enabled": true }
//! }
//! ```
//!
//! Every key is optional. Sinks not mentioned stay disabled.

use super::{
    config::{with_product_name_short, with_sampling, LoggingOption},
    error::{LoggerError, Result},
    level::LogLevel,
    logger::{Logger, DEBUG_CONSOLE_SINK, FILE_SINK, JSON_STDOUT_SINK},
    sampling::SamplingOptions,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSettings {
    pub enabled: bool,
    /// Keep the built-in default level when absent
    pub level: Option<LogLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub product_name_short: Option<String>,
    pub sampling: Option<SamplingOptions>,
    pub console: SinkSettings,
    pub json_stdout: SinkSettings,
    pub file: SinkSettings,
}

impl LoggingSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The product name becomes the file sink's file name, so it must be a
    /// plain, non-empty name.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.product_name_short {
            if name.trim().is_empty() {
                return Err(LoggerError::config("product_name_short", "must not be empty"));
            }
            if name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(LoggerError::config(
                    "product_name_short",
                    format!("'{}' is not a plain file name", name),
                ));
            }
        }
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logging settings",
                path.display().to_string(),
                e,
            )
        })?;
        Self::from_json_str(&json)
    }

    /// The options these settings contribute to [`Logger::start`]
    pub fn options(&self) -> Vec<LoggingOption> {
        let mut opts = Vec::with_capacity(2);
        if let Some(name) = &self.product_name_short {
            opts.push(with_product_name_short(name.clone()));
        }
        if let Some(sampling) = self.sampling {
            opts.push(with_sampling(sampling));
        }
        opts
    }

    fn sinks(&self) -> [(&'static str, &SinkSettings); 3] {
        [
            (DEBUG_CONSOLE_SINK, &self.console),
            (JSON_STDOUT_SINK, &self.json_stdout),
            (FILE_SINK, &self.file),
        ]
    }
}

impl Logger {
    /// Start the logger with `settings`, then apply each built-in sink's
    /// enable flag and level.
    ///
    /// On an already started logger the start options are ignored but the
    /// per-sink settings still apply.
    pub fn apply_settings(&self, settings: &LoggingSettings) {
        self.start(settings.options());
        for (name, sink) in settings.sinks() {
            if let Some(level) = sink.level {
                self.set_log_level(name, level);
            }
            self.set_sink_enabled(name, sink.enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_settings() {
        let settings = LoggingSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, LoggingSettings::default());
        assert!(settings.options().is_empty());
    }

    #[test]
    fn test_parse_full_settings() {
        let settings = LoggingSettings::from_json_str(
            r#"{
                "product_name_short": "billing",
                "sampling": { "tick": 500, "first": 10, "thereafter": 50 },
                "console": { "enabled": true, "level": "debug" },
                "file": { "enabled": true, "level": "warn" }
            }"#,
        )
        .unwrap();

        assert_eq!(settings.product_name_short.as_deref(), Some("billing"));
        assert_eq!(
            settings.sampling,
            Some(SamplingOptions {
                tick: Duration::from_millis(500),
                first: 10,
                thereafter: 50,
            })
        );
        assert_eq!(settings.console.level, Some(LogLevel::Debug));
        assert!(!settings.json_stdout.enabled);
        assert_eq!(settings.options().len(), 2);
    }

    #[test]
    fn test_product_name_must_be_a_file_name() {
        for json in [
            r#"{"product_name_short": ""}"#,
            r#"{"product_name_short": "  "}"#,
            r#"{"product_name_short": "../etc/app"}"#,
            r#"{"product_name_short": "a\\b"}"#,
            r#"{"product_name_short": ".."}"#,
        ] {
            let err = LoggingSettings::from_json_str(json).unwrap_err();
            assert!(
                matches!(err, LoggerError::InvalidConfiguration { .. }),
                "{} gave {:?}",
                json,
                err
            );
        }
        assert!(LoggingSettings::from_json_str(r#"{"product_name_short": "billing-v2"}"#).is_ok());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = LoggingSettings::from_json_str(r#"{"consol": {}}"#).unwrap_err();
        assert!(matches!(err, LoggerError::JsonError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = LoggingSettings::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, LoggerError::IoOperation { .. }));
    }

    #[test]
    fn test_apply_settings_configures_built_ins() {
        let logger = Logger::new();
        let settings = LoggingSettings {
            product_name_short: Some("settings-test".to_string()),
            console: SinkSettings {
                enabled: false,
                level: Some(LogLevel::Warn),
            },
            file: SinkSettings {
                enabled: false,
                level: Some(LogLevel::Fatal),
            },
            ..Default::default()
        };
        logger.apply_settings(&settings);

        let config = logger.config();
        assert_eq!(config.options().product_name_short, "settings-test");
        assert_eq!(config.sink(DEBUG_CONSOLE_SINK).unwrap().level(), LogLevel::Warn);
        assert_eq!(config.sink(FILE_SINK).unwrap().level(), LogLevel::Fatal);
        assert_eq!(config.sink(JSON_STDOUT_SINK).unwrap().level(), LogLevel::Info);
        assert!(config.sinks().all(|s| !s.is_enabled()));
    }
}
