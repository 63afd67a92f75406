//! Ensembl Common Library
//!
//! Shared building blocks used across the Ensembl workspace members:
//!
//! - **Error Handling**: the common [`UtilsError`] type and [`Result`] alias
//! - **Logging**: `tracing`-based logging initialisation ([`logging`])
//! - **CLI Helpers**: reusable `clap` argument groups and path validators ([`args`])
//! - **Archives**: transparent access to gzip/tar/zip files ([`archive`])
//! - **Remote Files**: read and parse remote files as if they were local ([`remote`])
//! - **REST Client**: a retrying JSON REST client for pipeline steps ([`hive`])
//!
//! # Example
//!
//! ```no_run
//! use ensembl_common::logging::{init_logging, LogConfig};
//! use ensembl_common::Result;
//!
//! fn main() -> Result<()> {
//!     let _guard = init_logging(&LogConfig::default())?;
//!     tracing::info!("Application started");
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod args;
pub mod error;
pub mod hive;
pub mod logging;
pub mod remote;

// Re-export commonly used types
pub use error::{Result, UtilsError};
