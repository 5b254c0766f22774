//! Database error types for csl-db.

use csl_core::errors::ReviewError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Storage failures surface to callers as the retryable `Unavailable`
/// taxon. The store never retries on its own.
impl From<DatabaseError> for ReviewError {
    fn from(e: DatabaseError) -> Self {
        Self::Unavailable(e.to_string())
    }
}
