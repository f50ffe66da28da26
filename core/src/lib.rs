//! Table metadata and SQL synthesis for the tablemap workspace.
//!
//! This crate performs no I/O. It provides:
//!
//! - [`Registry`]: immutable per-table metadata built from [`Entity`]
//!   descriptions ([`FieldSpec`]), with fields grouped by [`Operation`].
//! - [`Condition`]: per-call predicates, ordering, paging and row locking.
//! - [`QueryBuilder`]: parameterized insert / upsert / count / select /
//!   update statements and `CREATE TABLE` / `ALTER TABLE` DDL for a
//!   [`Dialect`].
//! - [`plan_table`]: decides how a live table must change to match its
//!   metadata.
//! - [`Value`] / [`FromValue`]: the dynamically typed values passed between
//!   entities and backends.
//!
//! # Example
//!
//! ```
//! use tablemap_core::*;
//!
//! let users = TableSpec::new("users")
//!     .field(FieldSpec::new("id").column("id").sql_type("BIGSERIAL primary key").ops("id"))
//!     .field(
//!         FieldSpec::new("email")
//!             .column("email")
//!             .sql_type("text")
//!             .default_clause("not null")
//!             .index("index,unique")
//!             .ops("create,conflict"),
//!     )
//!     .field(FieldSpec::new("name").column("name").sql_type("text").ops("create,upsert"));
//!
//! let registry = Registry::builder().shared(users.prototype()).build().unwrap();
//! let table = registry.table("users").unwrap();
//! let builder = QueryBuilder::new(Dialect::Postgres);
//!
//! let row = users.entity().with("email", "a@example.com").with("name", "Ann");
//! let stmt = builder.upsert(table, &[row]).unwrap();
//! assert_eq!(
//!     stmt.sql,
//!     "INSERT INTO users (email, name) VALUES ($1, $2) \
//!      ON CONFLICT (email) DO UPDATE SET name = excluded.name"
//! );
//!
//! let plan = plan_table(&builder, table, &[]).unwrap();
//! assert_eq!(plan.state, TableState::NeedsCreate);
//! ```

mod builder;
mod condition;
mod dialect;
mod dynamic;
mod error;
mod plan;
mod registry;
mod value;

pub use builder::{OnConflict, QueryBuilder, SqlWriter, Statement, index_name};
pub use condition::{Comparison, Condition, Direction, OrderBy, Predicate};
pub use dialect::Dialect;
pub use dynamic::{DynamicEntity, TableSpec};
pub use error::{Error, Result, is_identifier};
pub use plan::{TablePlan, TableState, plan_table};
pub use registry::{
    BoundField, Constraint, Entity, Field, FieldSpec, Operation, Registry, RegistryBuilder, Table,
};
pub use value::{FromValue, Value};
