//! Seamlessly load the content of a remote file as if it was located locally.
//!
//! # Example
//!
//! ```no_run
//! use ensembl_common::remote::{RemoteFileFormat, RemoteFileLoader};
//!
//! # async fn demo() -> ensembl_common::Result<()> {
//! let loader = RemoteFileLoader::new(RemoteFileFormat::Json);
//! let content = loader.load("https://example.com/config.json").await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, UtilsError};

/// Formats the loader knows how to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteFileFormat {
    Json,
    Yaml,
    /// Dotenv-style `KEY=value` lines
    Env,
    /// No parsing, return the body as-is
    #[default]
    Raw,
}

/// Parsed content of a remote file
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteContent {
    Json(serde_json::Value),
    Yaml(serde_yaml::Value),
    Env(HashMap<String, String>),
    Raw(String),
}

impl RemoteContent {
    /// The raw text, available whichever format was requested via [`RemoteContent::Raw`]
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            RemoteContent::Raw(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            RemoteContent::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_yaml(&self) -> Option<&serde_yaml::Value> {
        match self {
            RemoteContent::Yaml(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_env(&self) -> Option<&HashMap<String, String>> {
        match self {
            RemoteContent::Env(map) => Some(map),
            _ => None,
        }
    }
}

/// Fetches a remote file over HTTP and parses it into [`RemoteContent`]
#[derive(Debug, Clone, Default)]
pub struct RemoteFileLoader {
    format: RemoteFileFormat,
    client: reqwest::Client,
}

impl RemoteFileLoader {
    pub fn new(format: RemoteFileFormat) -> Self {
        Self {
            format,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch `url` and parse the body following the configured format.
    ///
    /// Any non-successful HTTP status is reported as an error.
    pub async fn load(&self, url: &str) -> Result<RemoteContent> {
        debug!(url, format = ?self.format, "Loading remote file");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UtilsError::ResponseStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        self.parse(&body)
    }

    fn parse(&self, content: &str) -> Result<RemoteContent> {
        match self.format {
            RemoteFileFormat::Json => Ok(RemoteContent::Json(serde_json::from_str(content)?)),
            RemoteFileFormat::Yaml => Ok(RemoteContent::Yaml(serde_yaml::from_str(content)?)),
            RemoteFileFormat::Env => {
                let mut values = HashMap::new();
                for item in dotenvy::from_read_iter(content.as_bytes()) {
                    let (key, value) = item?;
                    values.insert(key, value);
                }
                Ok(RemoteContent::Env(values))
            }
            RemoteFileFormat::Raw => Ok(RemoteContent::Raw(content.to_string())),
        }
    }
}
