//! Error types for taxonomy queries.

use thiserror::Error;

/// Result type alias for taxonomy operations
pub type TaxonomyResult<T> = std::result::Result<T, TaxonomyError>;

/// Taxonomy query errors
#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// The query matched no taxonomy node
    #[error("No matching taxonomy node found")]
    NoResultFound,

    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),
}
