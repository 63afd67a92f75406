//! Error types shared across the Ensembl utility crates.

use thiserror::Error;

/// Result type alias for utility operations
pub type Result<T> = std::result::Result<T, UtilsError>;

/// Main error type for the utility crates
#[derive(Error, Debug)]
pub enum UtilsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}. Check the URL and your network connection.")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} received from '{url}'")]
    ResponseStatus { status: u16, url: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse env content: {0}")]
    EnvParse(#[from] dotenvy::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive error for '{path}': {message}")]
    Archive { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl UtilsError {
    /// Create an archive error with file context
    pub fn archive(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
