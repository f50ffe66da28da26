//! SQLite backend for tablemap.
//!
//! Everything that touches a live database lives here; statements themselves
//! come from [`tablemap_core`].
//!
//! # Architecture
//!
//! - **`bootstrap`**: [`connect`] opens a [`ConnectionPool`] with bounded
//!   retry
//! - **`pool`**: r2d2 connection pool with per-connection session setup
//! - **`cancel`**: [`CancelFlag`] interrupts running statements
//! - **`migration`**: [`Migrator`] creates missing tables and adds missing
//!   columns, one concurrent unit per table
//! - **`adapter`**: [`SqlAdapter`] CRUD over registered entities
//! - **`convert`**: [`Value`](tablemap_core::Value) ↔ SQLite storage classes
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tablemap_core::Condition;
//! use tablemap_db::{DbConfig, SchemaFile};
//! use tablemap_sqlite::{Migrator, SqlAdapter, Txn, connect};
//!
//! let config = DbConfig::load("db.yml").unwrap();
//! let schema = SchemaFile::open("schema.yml").unwrap();
//! let registry = Arc::new(schema.registry().unwrap());
//!
//! let pool = connect(&config).unwrap();
//! Migrator::new(pool.clone(), Arc::clone(&registry)).migrate().unwrap();
//!
//! let adapter = SqlAdapter::new(pool, registry);
//! let users = schema.table("users").unwrap();
//! let n = adapter.get_count(&users.entity(), &Condition::new(), Txn::Pooled).unwrap();
//! println!("{n} users");
//! ```
//!
//! # Transactions
//!
//! Calls take a [`Txn`]: [`Txn::Pooled`] runs on a connection borrowed for
//! the call, [`Txn::Active`] joins a transaction the caller opened on a
//! connection from [`SqlAdapter::pool`].

mod adapter;
mod bootstrap;
mod cancel;
mod convert;
mod error;
mod migration;
mod pool;

pub use adapter::{SqlAdapter, Txn};
pub use bootstrap::connect;
pub use cancel::CancelFlag;
pub use error::{Result, StoreError};
pub use migration::{MigrationReport, Migrator, TableOutcome};
pub use pool::{ConnectionPool, PooledConnection};
