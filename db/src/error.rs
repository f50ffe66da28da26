//! Error types for configuration and schema-file handling.

use thiserror::Error;

/// Errors raised while loading configuration or schema files.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A schema file describes a table the registry rejects.
    #[error(transparent)]
    Core(#[from] tablemap_core::Error),

    /// The configured driver name is not recognized.
    #[error("unsupported driver '{0}'")]
    UnsupportedDriver(String),

    /// A configuration value is missing or out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
