//! Error types for database operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// The database URL could not be parsed
    #[error("Invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The database URL names a dialect this crate does not support
    #[error("Unsupported database dialect '{0}'. Use a 'sqlite' or 'mysql' URL.")]
    UnsupportedDialect(String),

    /// Requested table is not part of the reflected schema
    #[error("Table '{0}' not found in database")]
    TableNotFound(String),

    /// A `meta` table lookup returned no row
    #[error("Meta key '{0}' not present in the 'meta' table")]
    MetaKeyNotFound(String),

    /// A `meta` table lookup returned multiple rows
    #[error("Meta key '{0}' returned multiple rows from the 'meta' table")]
    MetaKeyAmbiguous(String),

    /// A `meta` value could not be interpreted
    #[error("Invalid value '{value}' for meta key '{key}'")]
    InvalidMetaValue { key: String, value: String },

    /// The dump directory for a unit-test database does not exist
    #[error("Dump directory '{0}' not found")]
    DumpDirNotFound(PathBuf),

    /// The mandatory schema file is missing from the dump directory
    #[error("Schema file 'table.sql' not found in dump directory '{0}'")]
    SchemaFileNotFound(PathBuf),

    /// Importing a table dump failed
    #[error("Data loading failed: {0}")]
    DataLoading(String),

    /// File system operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Create a data loading error with table context
    pub fn data_loading(table: &str, message: impl std::fmt::Display) -> Self {
        Self::DataLoading(format!("table '{table}': {message}"))
    }
}
