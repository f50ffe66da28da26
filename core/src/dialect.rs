//! SQL dialect differences.
//!
//! Only the handful of places where the supported backends disagree live
//! here: placeholder style, row-lock syntax, upsert grammar and the catalog
//! used to discover live columns.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// PostgreSQL: `$N` placeholders, `ON CONFLICT` upserts.
    #[default]
    Postgres,
    /// MySQL: `?` placeholders, `ON DUPLICATE KEY UPDATE` upserts.
    MySql,
    /// SQLite: `?N` placeholders, `ON CONFLICT` upserts, no row locks.
    Sqlite,
}

impl Dialect {
    /// Placeholder for the `n`-th parameter (1-based).
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${n}"),
            Dialect::MySql => "?".to_string(),
            Dialect::Sqlite => format!("?{n}"),
        }
    }

    /// Row-lock modifier appended to a select, if the backend has one.
    ///
    /// SQLite serializes writers at the database level, so selects carry no
    /// modifier there.
    pub fn row_lock(&self) -> Option<&'static str> {
        match self {
            Dialect::Postgres | Dialect::MySql => Some("FOR UPDATE"),
            Dialect::Sqlite => None,
        }
    }

    /// Quotes `name` as a delimited identifier.
    ///
    /// Only generated names need this; registered table and column names are
    /// plain identifiers and render bare.
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Whether upserts use `ON CONFLICT (…)` rather than MySQL's
    /// `ON DUPLICATE KEY UPDATE`.
    pub fn has_on_conflict(&self) -> bool {
        !matches!(self, Dialect::MySql)
    }

    /// Catalog schema holding `database`'s tables.
    pub fn catalog_schema<'a>(&self, database: &'a str) -> &'a str {
        match self {
            Dialect::Postgres => "public",
            Dialect::MySql => database,
            Dialect::Sqlite => "main",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(Error::Validation(format!("unknown dialect '{other}'"))),
        }
    }
}
