//! Logging configuration and initialisation.
//!
//! Messages at [`LogConfig::level`] and above are printed to standard error;
//! a `RUST_LOG` directive takes precedence over the configured level for
//! that output. When a log file is configured, messages at
//! [`LogConfig::log_file_level`] and above are additionally written to that
//! file, so the file can capture debug output while the terminal stays
//! quiet.
//!
//! # Example
//!
//! ```no_run
//! use ensembl_common::logging::{init_logging, LogConfig, LogLevel};
//!
//! let config = LogConfig::default()
//!     .with_level(LogLevel::Info)
//!     .with_log_file("run.log");
//! // Keep the guard alive until the end of the program so buffered
//! // records are flushed to the file.
//! let _guard = init_logging(&config).unwrap();
//! tracing::info!("written to both stderr and the log file");
//! tracing::debug!("written to the log file only");
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer,
};

pub use tracing_appender::non_blocking::WorkerGuard;

use crate::error::{Result, UtilsError};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = UtilsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(UtilsError::config(format!("Invalid log level: {s}"))),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum log level for the standard error output
    pub level: LogLevel,

    /// Log file where to also write logging messages
    pub log_file: Option<PathBuf>,

    /// Minimum log level for the log file
    pub log_file_level: LogLevel,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            log_file: None,
            log_file_level: LogLevel::Debug,
        }
    }
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `LOG_LEVEL`: Log level for standard error (trace, debug, info, warn, error)
    /// - `LOG_FILE`: Log file path
    /// - `LOG_FILE_LEVEL`: Log level for the log file
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.level = level.parse()?;
        }

        if let Ok(path) = std::env::var("LOG_FILE") {
            config.log_file = Some(PathBuf::from(path));
        }

        if let Ok(level) = std::env::var("LOG_FILE_LEVEL") {
            config.log_file_level = level.parse()?;
        }

        Ok(config)
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_log_file_level(mut self, level: LogLevel) -> Self {
        self.log_file_level = level;
        self
    }
}

/// Initialise the global logging system.
///
/// This sets up the global tracing subscriber and should only be called once
/// at application startup. The returned guard must be kept alive while the
/// program runs when a log file is configured.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter(config.level));

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_ansi(false)
                .with_filter(LevelFilter::from_level(
                    config.log_file_level.to_tracing_level(),
                ));

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| UtilsError::config(format!("Failed to initialise logging: {e}")))?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(stderr_layer)
                .try_init()
                .map_err(|e| UtilsError::config(format!("Failed to initialise logging: {e}")))?;

            Ok(None)
        }
    }
}

/// Filter for the standard error output: `RUST_LOG` wins when set, the
/// configured level applies otherwise.
fn stderr_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_filter_falls_back_to_config_level() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(stderr_filter(LogLevel::Info).to_string(), "info");
        assert_eq!(stderr_filter(LogLevel::Error).to_string(), "error");
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("Info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("ERROR".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("invalid".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_round_trip() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.log_file, None);
        assert_eq!(config.log_file_level, LogLevel::Debug);
    }

    #[test]
    fn test_config_builders() {
        let config = LogConfig::new()
            .with_level(LogLevel::Info)
            .with_log_file("/tmp/test.log")
            .with_log_file_level(LogLevel::Trace);
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/test.log")));
        assert_eq!(config.log_file_level, LogLevel::Trace);
    }
}
