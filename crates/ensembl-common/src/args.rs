//! Reusable `clap` argument groups and value parsers.
//!
//! [`LogArgs`] can be flattened into any binary's argument struct to get the
//! standard logging flags, and the path parsers validate file system
//! arguments at parse time rather than deep inside the program.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use ensembl_common::args::{existing_path, init_logging_with_args, LogArgs};
//! use std::path::PathBuf;
//!
//! #[derive(Parser)]
//! struct Cli {
//!     /// Path to the file to process
//!     #[arg(long, value_parser = existing_path)]
//!     src: PathBuf,
//!
//!     #[command(flatten)]
//!     log: LogArgs,
//! }
//!
//! let cli = Cli::parse();
//! let _guard = init_logging_with_args(&cli.log).unwrap();
//! ```

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::logging::{init_logging, LogConfig, LogLevel, WorkerGuard};

/// Standard logging arguments shared by Ensembl command line tools
#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Minimum severity of the messages printed to stderr
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    pub log_level: LogLevel,

    /// Also write logging messages to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Minimum severity of the messages written to the log file
    #[arg(long, default_value = "debug", value_name = "LEVEL")]
    pub log_file_level: LogLevel,

    /// Shortcut for --log-level debug
    #[arg(long, conflicts_with = "log_level")]
    pub debug: bool,
}

impl LogArgs {
    /// Build the logging configuration from the parsed arguments.
    pub fn to_config(&self) -> LogConfig {
        let level = if self.debug {
            LogLevel::Debug
        } else {
            self.log_level
        };
        LogConfig {
            level,
            log_file: self.log_file.clone(),
            log_file_level: self.log_file_level,
        }
    }
}

/// Initialise the logging system from parsed [`LogArgs`].
pub fn init_logging_with_args(args: &LogArgs) -> Result<Option<WorkerGuard>> {
    init_logging(&args.to_config())
}

/// Value parser for source paths: the path must exist and be readable.
pub fn existing_path(value: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(format!("path '{value}' does not exist"));
    }
    Ok(path)
}

/// Value parser for destination paths: the parent directory must exist so
/// the path can be created.
pub fn writable_dst_path(value: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(value);
    match path.parent() {
        // An empty parent means a relative path in the working directory
        Some(parent) if parent.as_os_str().is_empty() => Ok(path),
        Some(parent) if parent.is_dir() => Ok(path),
        Some(parent) => Err(format!(
            "parent directory '{}' does not exist",
            parent.display()
        )),
        None => Err(format!("'{value}' is not a usable destination path")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        log: LogArgs,
    }

    #[test]
    fn test_log_args_defaults() {
        let cli = TestCli::parse_from(["test"]);
        let config = cli.log.to_config();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.log_file, None);
        assert_eq!(config.log_file_level, LogLevel::Debug);
    }

    #[test]
    fn test_log_args_explicit_level() {
        let cli = TestCli::parse_from(["test", "--log-level", "info"]);
        assert_eq!(cli.log.to_config().level, LogLevel::Info);
    }

    #[test]
    fn test_log_args_debug_flag() {
        let cli = TestCli::parse_from(["test", "--debug"]);
        assert_eq!(cli.log.to_config().level, LogLevel::Debug);
    }

    #[test]
    fn test_log_args_debug_conflicts_with_level() {
        let result = TestCli::try_parse_from(["test", "--debug", "--log-level", "info"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_args_file() {
        let cli = TestCli::parse_from(["test", "--log-file", "out.log", "--log-file-level", "trace"]);
        let config = cli.log.to_config();
        assert_eq!(config.log_file, Some(PathBuf::from("out.log")));
        assert_eq!(config.log_file_level, LogLevel::Trace);
    }

    #[test]
    fn test_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");
        assert!(existing_path(path.to_str().unwrap()).is_err());
        std::fs::write(&path, "content").unwrap();
        assert_eq!(existing_path(path.to_str().unwrap()).unwrap(), path);
    }

    #[test]
    fn test_writable_dst_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new_dir");
        assert_eq!(writable_dst_path(path.to_str().unwrap()).unwrap(), path);
        let nested = dir.path().join("missing").join("new_dir");
        assert!(writable_dst_path(nested.to_str().unwrap()).is_err());
        assert!(writable_dst_path("relative_name").is_ok());
    }
}
