//! Table metadata registry.
//!
//! Entities describe their columns declaratively through [`FieldSpec`]
//! records. [`Registry::builder`] turns those descriptions into one immutable
//! [`Table`] per table name, which is then shared read-only by the migration
//! engine and every CRUD call.
//!
//! # Markers
//!
//! Each [`FieldSpec`] carries the same markers a mapped field would declare:
//!
//! - `column`: column name; a field without one is not mapped;
//! - `sql_type` / `default`: raw SQL clauses used verbatim in DDL;
//! - `index`: `"index"` or `"index,unique"`;
//! - `ops`: comma-separated operation groups (`id`, `create`, `update`,
//!   `upsert`, `conflict`). Every mapped field also joins `all`.
//!
//! # Example
//!
//! ```
//! use tablemap_core::{Entity, FieldSpec, Operation, Registry, Result, Value};
//!
//! #[derive(Default)]
//! struct Tag {
//!     id: i64,
//!     label: String,
//! }
//!
//! impl Entity for Tag {
//!     fn table_name(&self) -> &str {
//!         "tags"
//!     }
//!
//!     fn fields(&self) -> Vec<FieldSpec> {
//!         vec![
//!             FieldSpec::new("id").column("id").sql_type("INTEGER PRIMARY KEY").ops("id"),
//!             FieldSpec::new("label").column("label").sql_type("TEXT").index("index,unique").ops("create"),
//!         ]
//!     }
//!
//!     fn get(&self, field: &str) -> Option<Value> {
//!         match field {
//!             "id" => Some(self.id.into()),
//!             "label" => Some(self.label.clone().into()),
//!             _ => None,
//!         }
//!     }
//!
//!     fn set(&mut self, field: &str, value: Value) -> Result<()> {
//!         match field {
//!             "id" => self.id = value.decode()?,
//!             "label" => self.label = value.decode()?,
//!             _ => {}
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let registry = Registry::builder().entity(Tag::default()).build().unwrap();
//! let table = registry.table("tags").unwrap();
//! assert_eq!(table.operation_columns(Operation::Create), vec!["label"]);
//! assert_eq!(table.constraints().len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result, validate_identifier};
use crate::value::Value;

/// Named field groups used to pick columns for each statement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// Identity / primary key columns (`id`).
    Identity,
    /// Columns written by inserts and upserts.
    Create,
    /// Columns written by updates.
    Update,
    /// Columns overwritten on upsert conflict.
    Upsert,
    /// Columns forming the upsert conflict target.
    Conflict,
    /// Every mapped column, in declaration order.
    All,
}

impl Operation {
    /// Parses a group marker. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "id" | "identity" => Some(Operation::Identity),
            "create" => Some(Operation::Create),
            "update" => Some(Operation::Update),
            "upsert" => Some(Operation::Upsert),
            "conflict" => Some(Operation::Conflict),
            "all" => Some(Operation::All),
            _ => None,
        }
    }

    /// Canonical marker text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Identity => "id",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Upsert => "upsert",
            Operation::Conflict => "conflict",
            Operation::All => "all",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of one entity field.
///
/// Deserializable so that schema files can describe tables without Rust
/// code (see [`TableSpec`](crate::TableSpec)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Accessor name used with [`Entity::get`] / [`Entity::set`].
    pub name: String,
    /// Column name. `None` or `"-"` leaves the field unmapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// SQL type clause, e.g. `BIGSERIAL primary key`.
    #[serde(default, rename = "type")]
    pub sql_type: String,
    /// Default / nullability clause, e.g. `default (now()) not null`.
    #[serde(default)]
    pub default: String,
    /// Index marker: `index` or `index,unique`.
    #[serde(default)]
    pub index: String,
    /// Comma-separated operation groups.
    #[serde(default)]
    pub ops: String,
}

impl FieldSpec {
    /// Starts an unmapped field description for accessor `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: None,
            sql_type: String::new(),
            default: String::new(),
            index: String::new(),
            ops: String::new(),
        }
    }

    /// Maps the field to `column`.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Sets the SQL type clause.
    pub fn sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = sql_type.into();
        self
    }

    /// Sets the default / nullability clause.
    pub fn default_clause(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    /// Sets the index marker.
    pub fn index(mut self, marker: impl Into<String>) -> Self {
        self.index = marker.into();
        self
    }

    /// Sets the operation-group marker.
    pub fn ops(mut self, marker: impl Into<String>) -> Self {
        self.ops = marker.into();
        self
    }

    fn mapped_column(&self) -> Option<&str> {
        match self.column.as_deref().map(str::trim) {
            None | Some("") | Some("-") => None,
            Some(column) => Some(column),
        }
    }
}

/// Index constraint declared on a field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Constraint {
    /// The column carries an index.
    pub indexed: bool,
    /// The index is unique.
    pub unique: bool,
    /// Column the index covers.
    pub field: String,
}

impl Constraint {
    fn parse(marker: &str, column: &str) -> Self {
        let mut constraint = Constraint {
            field: column.to_string(),
            ..Constraint::default()
        };
        for piece in marker.split(',') {
            match piece.trim() {
                "index" => constraint.indexed = true,
                "unique" => constraint.unique = true,
                _ => {}
            }
        }
        constraint
    }
}

/// One registered column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Position within the table's declaration order.
    pub position: usize,
    /// Column name.
    pub name: String,
    /// Accessor name on the entity.
    pub accessor: String,
    /// SQL type clause.
    pub sql_type: String,
    /// Default / nullability clause.
    pub default: String,
    /// Index constraint (`indexed == false` when none was declared).
    pub constraint: Constraint,
    /// Owning table.
    pub table: String,
    /// Groups this field belongs to, `All` included.
    pub operations: Vec<Operation>,
}

impl Field {
    /// Returns `true` if the field belongs to `op`.
    pub fn in_group(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }
}

/// A mapped record type.
///
/// Implementors describe their columns with [`fields`](Entity::fields) and
/// expose a name-keyed accessor pair so values can be read for binding and
/// written back when rows are decoded.
pub trait Entity: Send + Sync {
    /// Table the entity maps to.
    fn table_name(&self) -> &str;

    /// Field descriptions in declaration order.
    fn fields(&self) -> Vec<FieldSpec>;

    /// Extra statements run right after the table is created.
    fn on_create(&self) -> Vec<String> {
        Vec::new()
    }

    /// Reads the field named `field`, or `None` if there is no such accessor.
    fn get(&self, field: &str) -> Option<Value>;

    /// Writes `value` into the field named `field`.
    fn set(&mut self, field: &str, value: Value) -> Result<()>;
}

/// A field paired with the value read from an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundField<'t> {
    /// Registered field.
    pub field: &'t Field,
    /// Value read through the field's accessor.
    pub value: Value,
}

/// Immutable metadata for one table.
pub struct Table {
    name: String,
    fields: Vec<Field>,
    by_name: HashMap<String, usize>,
    constraints: Vec<Constraint>,
    groups: HashMap<Operation, Vec<usize>>,
    prototype: Arc<dyn Entity>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}

impl Table {
    fn from_entity(name: &str, prototype: Arc<dyn Entity>) -> Result<Self> {
        validate_identifier(name)?;

        let mut table = Table {
            name: name.to_string(),
            fields: Vec::new(),
            by_name: HashMap::new(),
            constraints: Vec::new(),
            groups: HashMap::new(),
            prototype: Arc::clone(&prototype),
        };

        for spec in prototype.fields() {
            let Some(column) = spec.mapped_column() else {
                continue;
            };
            validate_identifier(column)?;
            if table.by_name.contains_key(column) {
                return Err(Error::DuplicateColumn {
                    table: name.to_string(),
                    column: column.to_string(),
                });
            }

            let mut operations = Vec::new();
            if !spec.ops.trim().is_empty() {
                for raw in spec.ops.split(',') {
                    match Operation::parse(raw) {
                        Some(Operation::All) => {}
                        Some(op) if !operations.contains(&op) => operations.push(op),
                        Some(_) => {}
                        None => debug!(table = name, column, group = raw, "ignoring unknown operation group"),
                    }
                }
            }
            operations.push(Operation::All);

            let constraint = Constraint::parse(&spec.index, column);
            if constraint.indexed {
                table.constraints.push(constraint.clone());
            }

            let index = table.fields.len();
            for op in &operations {
                table.groups.entry(*op).or_default().push(index);
            }
            table.by_name.insert(column.to_string(), index);
            table.fields.push(Field {
                position: index,
                name: column.to_string(),
                accessor: spec.name.clone(),
                sql_type: spec.sql_type.trim().to_string(),
                default: spec.default.trim().to_string(),
                constraint,
                table: name.to_string(),
                operations,
            });
        }

        Ok(table)
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All mapped fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by column name.
    pub fn field(&self, column: &str) -> Option<&Field> {
        self.by_name.get(column).map(|&i| &self.fields[i])
    }

    /// Indexed fields' constraints in declaration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Fields in group `op`, in declaration order.
    pub fn operation_fields(&self, op: Operation) -> Vec<&Field> {
        self.groups
            .get(&op)
            .map(|indices| indices.iter().map(|&i| &self.fields[i]).collect())
            .unwrap_or_default()
    }

    /// Column names in group `op`, in declaration order.
    pub fn operation_columns(&self, op: Operation) -> Vec<&str> {
        self.operation_fields(op)
            .into_iter()
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Entity instance the table was registered from.
    pub fn prototype(&self) -> &dyn Entity {
        self.prototype.as_ref()
    }

    /// Reads the values of group `op` out of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAccessor`] if the entity cannot read one of the
    /// group's fields, or [`Error::Validation`] if the entity belongs to a
    /// different table.
    pub fn bind(&self, entity: &dyn Entity, op: Operation) -> Result<Vec<BoundField<'_>>> {
        if entity.table_name() != self.name {
            return Err(Error::Validation(format!(
                "entity for table '{}' bound against table '{}'",
                entity.table_name(),
                self.name
            )));
        }
        self.operation_fields(op)
            .into_iter()
            .map(|field| {
                let value = entity
                    .get(&field.accessor)
                    .ok_or_else(|| Error::MissingAccessor {
                        table: self.name.clone(),
                        field: field.accessor.clone(),
                    })?;
                Ok(BoundField { field, value })
            })
            .collect()
    }
}

/// Read-only collection of registered tables.
#[derive(Debug, Default)]
pub struct Registry {
    tables: HashMap<String, Arc<Table>>,
}

impl Registry {
    /// Returns a new [`RegistryBuilder`].
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Arc<Table>> {
        self.tables.get(name)
    }

    /// Looks up a table by name, failing with [`Error::Build`] if unknown.
    pub fn require(&self, name: &str) -> Result<&Arc<Table>> {
        self.table(name)
            .ok_or_else(|| Error::Build(format!("table '{name}' is not registered")))
    }

    /// All tables, sorted by name.
    pub fn tables(&self) -> Vec<&Arc<Table>> {
        let mut tables: Vec<_> = self.tables.values().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Reads group `op` out of `entity` using its table's metadata.
    pub fn operation_fields<'r>(
        &'r self,
        entity: &dyn Entity,
        op: Operation,
    ) -> Result<Vec<BoundField<'r>>> {
        self.require(entity.table_name())?.bind(entity, op)
    }
}

/// Collects entities and builds a [`Registry`].
///
/// When two entities report the same table name, the one registered last
/// provides the table's metadata.
#[derive(Default)]
pub struct RegistryBuilder {
    entities: Vec<Arc<dyn Entity>>,
}

impl RegistryBuilder {
    /// Adds an entity prototype.
    pub fn entity<E: Entity + 'static>(self, entity: E) -> Self {
        self.shared(Arc::new(entity))
    }

    /// Adds an already shared entity prototype.
    pub fn shared(mut self, entity: Arc<dyn Entity>) -> Self {
        self.entities.push(entity);
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for a table or column name that is
    /// not a plain identifier, or [`Error::DuplicateColumn`] when two fields
    /// of one table map to the same column.
    pub fn build(self) -> Result<Registry> {
        let mut latest: HashMap<String, Arc<dyn Entity>> = HashMap::new();
        for entity in self.entities {
            latest.insert(entity.table_name().to_string(), entity);
        }

        let mut tables = HashMap::with_capacity(latest.len());
        for (name, entity) in latest {
            let table = Table::from_entity(&name, entity)?;
            tables.insert(name, Arc::new(table));
        }
        Ok(Registry { tables })
    }
}
