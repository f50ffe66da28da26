//! Error types for the SQLite backend.
//!
//! Errors from the metadata layer and the configuration layer are folded into
//! [`StoreError`] so that callers deal with a single type.

use thiserror::Error;

/// Errors raised by bootstrap, migration and CRUD calls.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Bad or unsupported configuration, or a connection that never came up.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller input rejected before any SQL ran.
    #[error("validation error: {0}")]
    Validation(String),

    /// A statement could not be assembled.
    #[error("build error: {0}")]
    Build(String),

    /// A stored value could not be converted.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// SQLite reported an error.
    #[error("database error: {0}")]
    Backend(#[from] rusqlite::Error),

    /// A migration statement failed.
    #[error("migration of table '{table}' failed on `{statement}`: {source}")]
    Migration {
        /// Table being migrated.
        table: String,
        /// Statement that failed.
        statement: String,
        /// Backend error.
        source: rusqlite::Error,
    },

    /// Work was skipped because the operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// No pooled connection became available in time, or a new one could
    /// not be opened.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl From<tablemap_core::Error> for StoreError {
    fn from(err: tablemap_core::Error) -> Self {
        match err {
            tablemap_core::Error::Validation(msg) => StoreError::Validation(msg),
            tablemap_core::Error::Decode { .. } => StoreError::Conversion(err.to_string()),
            other => StoreError::Build(other.to_string()),
        }
    }
}

impl From<tablemap_db::DatabaseError> for StoreError {
    fn from(err: tablemap_db::DatabaseError) -> Self {
        StoreError::Configuration(err.to_string())
    }
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_keep_their_category() {
        let err: StoreError = tablemap_core::Error::Validation("zero entities passed".into()).into();
        assert!(matches!(err, StoreError::Validation(ref m) if m == "zero entities passed"));

        let err: StoreError = tablemap_core::Error::Build("bad".into()).into();
        assert!(matches!(err, StoreError::Build(_)));

        let err: StoreError = tablemap_core::Error::Decode {
            expected: "i64",
            found: "text",
        }
        .into();
        assert!(matches!(err, StoreError::Conversion(_)));
    }

    #[test]
    fn test_config_errors_become_configuration() {
        let err: StoreError = tablemap_db::DatabaseError::UnsupportedDriver("oracle".into()).into();
        assert!(matches!(err, StoreError::Configuration(ref m) if m.contains("oracle")));
    }
}
