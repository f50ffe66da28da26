//! Error types for metadata registration and statement construction.
//!
//! Every failure in this crate happens before any I/O: a bad registration,
//! a condition that cannot be rendered, or a value that cannot be decoded
//! into the requested Rust type.

use thiserror::Error;

/// Errors raised while registering tables or building statements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Caller input rejected before any statement was built.
    #[error("validation error: {0}")]
    Validation(String),

    /// SQL assembly failed on malformed input.
    #[error("build error: {0}")]
    Build(String),

    /// A table or column name is not a plain SQL identifier.
    #[error("invalid identifier '{0}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier(String),

    /// Two fields of the same table map to one column.
    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn {
        /// Owning table.
        table: String,
        /// Offending column name.
        column: String,
    },

    /// The entity exposes no accessor for a registered field.
    #[error("entity for table '{table}' has no accessor for field '{field}'")]
    MissingAccessor {
        /// Owning table.
        table: String,
        /// Accessor name that failed to resolve.
        field: String,
    },

    /// A stored value could not be converted to the requested type.
    #[error("cannot decode {found} as {expected}")]
    Decode {
        /// Rust type that was requested.
        expected: &'static str,
        /// Kind of value that was found.
        found: &'static str,
    },
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Returns `true` if `name` is a bare SQL identifier that is safe to splice
/// into statement text.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates an identifier, returning [`Error::InvalidIdentifier`] on failure.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(is_identifier("users"));
        assert!(is_identifier("_tmp"));
        assert!(is_identifier("created_at2"));
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("drop;--"));
        assert!(!is_identifier("hello world"));
        assert!(!is_identifier("a.b"));
    }
}
