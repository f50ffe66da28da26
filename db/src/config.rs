//! Backend connection configuration.
//!
//! Defines the YAML-serializable settings used to open a database: which
//! driver to use, where the database lives, how long to keep retrying the
//! first connection and how many connections to pool.
//!
//! # Example YAML
//!
//! ```yaml
//! driver: sqlite
//! name: /var/lib/app/app.db
//! timeout: 10
//! retry_interval_ms: 500
//! max_connections: 8
//! ```
//!
//! Network drivers additionally take `network`, `host`, `port`, `user` and
//! `password`.

use std::fmt;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tablemap_core::Dialect;

use crate::error::{DatabaseError, Result};

/// Name SQLite uses for a private in-memory database.
pub const MEMORY_DATABASE: &str = ":memory:";

/// Database driver named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    Postgres,
    MySql,
    Sqlite,
}

impl Driver {
    /// SQL dialect spoken by the driver.
    pub fn dialect(&self) -> Dialect {
        match self {
            Driver::Postgres => Dialect::Postgres,
            Driver::MySql => Dialect::MySql,
            Driver::Sqlite => Dialect::Sqlite,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::MySql => "mysql",
            Driver::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "mysql" => Ok(Driver::MySql),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            _ => Err(DatabaseError::UnsupportedDriver(s.to_string())),
        }
    }
}

fn default_driver() -> String {
    Driver::Sqlite.as_str().to_string()
}

fn default_network() -> String {
    "tcp".to_string()
}

fn default_name() -> String {
    MEMORY_DATABASE.to_string()
}

fn default_timeout() -> u64 {
    5
}

fn default_retry_interval_ms() -> u64 {
    1000
}

fn default_max_connections() -> usize {
    50
}

/// Connection settings.
///
/// Loaded from YAML with [`DbConfig::load`]; every field has a default, so an
/// empty document describes a private in-memory SQLite database.
///
/// # Examples
///
/// ```
/// use tablemap_db::{DbConfig, Driver};
///
/// let config: DbConfig = serde_yaml::from_str("driver: sqlite\nname: app.db\n").unwrap();
/// assert_eq!(config.driver().unwrap(), Driver::Sqlite);
/// assert_eq!(config.timeout().as_secs(), 5);
/// assert!(!config.is_memory());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Driver name: `postgres`, `mysql` or `sqlite`.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Transport for network drivers (`tcp`, `unix`).
    #[serde(default = "default_network", alias = "net")]
    pub network: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Database name; for SQLite, the file path or `:memory:`.
    #[serde(default = "default_name")]
    pub name: String,
    /// Seconds to keep retrying the first connection.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Milliseconds between connection attempts.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections", alias = "max_conn")]
    pub max_connections: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            network: default_network(),
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            name: default_name(),
            timeout: default_timeout(),
            retry_interval_ms: default_retry_interval_ms(),
            max_connections: default_max_connections(),
        }
    }
}

impl DbConfig {
    /// SQLite configuration for the database file at `path`.
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self {
            name: path.as_ref().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    /// Private in-memory SQLite configuration.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](DatabaseError::Io) if the file cannot be read, or
    /// [`Yaml`](DatabaseError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](DatabaseError::Io) if the file cannot be written, or
    /// [`Yaml`](DatabaseError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Parses the driver name.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedDriver`](DatabaseError::UnsupportedDriver) for an
    /// unknown name.
    pub fn driver(&self) -> Result<Driver> {
        self.driver.parse()
    }

    /// Checks that the configuration can be used to connect.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedDriver`](DatabaseError::UnsupportedDriver) or
    /// [`InvalidConfig`](DatabaseError::InvalidConfig).
    pub fn validate(&self) -> Result<()> {
        let driver = self.driver()?;
        if self.name.trim().is_empty() {
            return Err(DatabaseError::InvalidConfig(
                "database name must not be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(DatabaseError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.retry_interval_ms == 0 {
            return Err(DatabaseError::InvalidConfig(
                "retry_interval_ms must be at least 1".to_string(),
            ));
        }
        if driver != Driver::Sqlite && self.host.trim().is_empty() {
            return Err(DatabaseError::InvalidConfig(format!(
                "driver '{driver}' requires a host"
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Returns `true` for a private in-memory SQLite database.
    pub fn is_memory(&self) -> bool {
        self.name == MEMORY_DATABASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
driver: postgres
net: tcp
host: db.internal
port: 5432
user: app
password: secret
name: app
timeout: 30
retry_interval_ms: 250
max_conn: 16
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: DbConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.driver().unwrap(), Driver::Postgres);
        assert_eq!(config.network, "tcp");
        assert_eq!(config.port, 5432);
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.retry_interval(), Duration::from_millis(250));
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_document_is_memory_sqlite() {
        let config: DbConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, DbConfig::memory());
        assert!(config.is_memory());
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_driver() {
        let config = DbConfig {
            driver: "oracle".into(),
            ..DbConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DatabaseError::UnsupportedDriver(ref d)) if d == "oracle"
        ));
    }

    #[test]
    fn test_invalid_values() {
        let config = DbConfig {
            max_connections: 0,
            ..DbConfig::default()
        };
        assert!(matches!(config.validate(), Err(DatabaseError::InvalidConfig(_))));

        let config = DbConfig {
            driver: "mysql".into(),
            ..DbConfig::default()
        };
        assert!(matches!(config.validate(), Err(DatabaseError::InvalidConfig(_))));
    }

    #[test]
    fn test_driver_dialect() {
        assert_eq!("sqlite3".parse::<Driver>().unwrap().dialect(), Dialect::Sqlite);
        assert_eq!(Driver::MySql.dialect(), Dialect::MySql);
    }
}
