//! Declarative schema files.
//!
//! A schema file lists tables as [`TableSpec`] records, so that tools can
//! migrate or inspect a database without compiling entity types:
//!
//! ```yaml
//! tables:
//!   - name: users
//!     on_create:
//!       - CREATE VIEW active_users AS SELECT * FROM users WHERE active = 1
//!     fields:
//!       - { name: id, column: id, type: INTEGER PRIMARY KEY, ops: id }
//!       - { name: email, column: email, type: TEXT, default: not null, index: "index,unique", ops: "create,conflict" }
//! ```
//!
//! [`SchemaFile::from_dir`] merges every `*.yml` / `*.yaml` file of a
//! directory, in file-name order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tablemap_core::{Registry, TableSpec};
use tracing::debug;

use crate::error::Result;

/// Where a [`SchemaFile`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchemaSource {
    /// Built in memory.
    #[default]
    Inline,
    /// A single YAML file.
    File(PathBuf),
    /// Every YAML file of a directory.
    Directory(PathBuf),
}

/// Parsed schema description.
///
/// # Examples
///
/// ```
/// use tablemap_db::SchemaFile;
///
/// let schema = SchemaFile::from_yaml(r#"
/// tables:
///   - name: tags
///     fields:
///       - { name: id, column: id, type: INTEGER PRIMARY KEY, ops: id }
///       - { name: label, column: label, type: TEXT, ops: create }
/// "#).unwrap();
/// let registry = schema.registry().unwrap();
/// assert!(registry.table("tags").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub tables: Vec<TableSpec>,
    #[serde(skip)]
    source: SchemaSource,
}

impl SchemaFile {
    pub fn new(tables: Vec<TableSpec>) -> Self {
        Self {
            tables,
            source: SchemaSource::Inline,
        }
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`Yaml`](crate::DatabaseError::Yaml) if parsing fails.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a single YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::DatabaseError::Io) if the file cannot be read,
    /// or [`Yaml`](crate::DatabaseError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut schema: SchemaFile = serde_yaml::from_reader(reader)?;
        debug!(path = %path.display(), tables = schema.tables.len(), "loaded schema file");
        schema.source = SchemaSource::File(path.to_path_buf());
        Ok(schema)
    }

    /// Loads and concatenates every YAML file in `path`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), for the directory and each file.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if matches!(
                file_path.extension().and_then(|e| e.to_str()),
                Some("yml" | "yaml")
            ) {
                files.push(file_path);
            }
        }
        files.sort();

        let mut tables = Vec::new();
        for file in files {
            tables.extend(Self::load(&file)?.tables);
        }
        Ok(Self {
            tables,
            source: SchemaSource::Directory(path.to_path_buf()),
        })
    }

    /// Loads `path` as a directory or a single file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            Self::load(path)
        }
    }

    /// Builds a registry with one dynamic entity per table.
    ///
    /// A table listed twice takes its metadata from the later entry.
    ///
    /// # Errors
    ///
    /// Returns [`Core`](crate::DatabaseError::Core) if a table is rejected.
    pub fn registry(&self) -> Result<Registry> {
        let registry = self
            .tables
            .iter()
            .fold(Registry::builder(), |builder, spec| builder.shared(spec.prototype()))
            .build()?;
        Ok(registry)
    }

    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().rev().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseError;
    use tablemap_core::Operation;

    const USERS: &str = r#"
tables:
  - name: users
    fields:
      - { name: id, column: id, type: INTEGER PRIMARY KEY, ops: id }
      - { name: email, column: email, type: TEXT, default: not null, index: "index,unique", ops: "create,conflict" }
      - { name: scratch }
"#;

    #[test]
    fn test_from_yaml_builds_registry() {
        let schema = SchemaFile::from_yaml(USERS).unwrap();
        let registry = schema.registry().unwrap();
        let users = registry.table("users").unwrap();
        assert_eq!(users.operation_columns(Operation::All), vec!["id", "email"]);
        assert_eq!(users.constraints().len(), 1);
        assert_eq!(schema.source(), &SchemaSource::Inline);
    }

    #[test]
    fn test_invalid_identifier_surfaces_as_core_error() {
        let yaml = r#"
tables:
  - name: "bad name"
    fields:
      - { name: id, column: id, type: INTEGER }
"#;
        let schema = SchemaFile::from_yaml(yaml).unwrap();
        assert!(matches!(schema.registry(), Err(DatabaseError::Core(_))));
    }

    #[test]
    fn test_from_dir_orders_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yml"), USERS).unwrap();
        std::fs::write(
            dir.path().join("a.yaml"),
            "tables:\n  - name: tags\n    fields:\n      - { name: id, column: id, type: INTEGER }\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let schema = SchemaFile::open(dir.path()).unwrap();
        let names: Vec<_> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["tags", "users"]);
        assert!(matches!(schema.source(), SchemaSource::Directory(_)));
    }

    #[test]
    fn test_later_duplicate_wins() {
        let yaml = r#"
tables:
  - name: t
    fields:
      - { name: a, column: a, type: TEXT }
  - name: t
    fields:
      - { name: b, column: b, type: TEXT }
"#;
        let schema = SchemaFile::from_yaml(yaml).unwrap();
        assert_eq!(schema.table("t").unwrap().fields[0].name, "b");
        let registry = schema.registry().unwrap();
        assert!(registry.table("t").unwrap().field("b").is_some());
    }
}
