//! CRUD over registered entities.
//!
//! [`SqlAdapter`] resolves each entity's table in the shared
//! [`Registry`], builds the statement with a SQLite [`QueryBuilder`] and runs
//! it either on a pooled connection or inside a transaction the caller
//! already holds. An adapter made with [`SqlAdapter::with_cancel`]
//! interrupts its running statements once the flag is tripped.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tablemap_core::{Condition, FieldSpec, Registry, TableSpec};
//! use tablemap_db::DbConfig;
//! use tablemap_sqlite::{Migrator, SqlAdapter, Txn, connect};
//!
//! let tags = TableSpec::new("tags")
//!     .field(FieldSpec::new("id").column("id").sql_type("INTEGER PRIMARY KEY").ops("id"))
//!     .field(FieldSpec::new("label").column("label").sql_type("TEXT").ops("create"));
//! let registry = Arc::new(Registry::builder().shared(tags.prototype()).build().unwrap());
//!
//! let pool = connect(&DbConfig::memory()).unwrap();
//! Migrator::new(pool.clone(), Arc::clone(&registry)).migrate().unwrap();
//!
//! let adapter = SqlAdapter::new(pool, registry);
//! adapter.create(&tags.entity().with("label", "rust"), Txn::Pooled).unwrap();
//! let count = adapter
//!     .get_count(&tags.entity(), &Condition::new().eq("label", "rust"), Txn::Pooled)
//!     .unwrap();
//! assert_eq!(count, 1);
//! ```

use std::sync::Arc;

use rusqlite::{Connection, Transaction, params_from_iter};
use tablemap_core::{Condition, Dialect, Entity, Operation, QueryBuilder, Registry, Statement, Table};
use tracing::debug;

use crate::cancel::{self, CancelFlag};
use crate::convert;
use crate::error::{Result, StoreError};
use crate::pool::ConnectionPool;

/// Where a CRUD call runs.
#[derive(Clone, Copy)]
pub enum Txn<'a> {
    /// On a connection taken from the pool for the duration of the call.
    Pooled,
    /// Inside a transaction owned by the caller.
    Active(&'a Transaction<'a>),
}

/// Generated-SQL CRUD over a connection pool.
#[derive(Debug, Clone)]
pub struct SqlAdapter {
    pool: ConnectionPool,
    registry: Arc<Registry>,
    builder: QueryBuilder,
    cancel: Option<CancelFlag>,
}

impl SqlAdapter {
    pub fn new(pool: ConnectionPool, registry: Arc<Registry>) -> Self {
        Self {
            pool,
            registry,
            builder: QueryBuilder::new(Dialect::Sqlite),
            cancel: None,
        }
    }

    /// A copy of this adapter whose calls stop once `cancel` is tripped.
    ///
    /// A call started after cancellation returns [`StoreError::Cancelled`]
    /// without running SQL; a statement already running is interrupted and
    /// reported the same way.
    pub fn with_cancel(&self, cancel: &CancelFlag) -> Self {
        Self {
            cancel: Some(cancel.clone()),
            ..self.clone()
        }
    }

    /// The pool calls run on, e.g. for beginning a transaction.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Inserts `entity`'s `create` group.
    ///
    /// # Errors
    ///
    /// Backend errors, such as a unique-constraint violation, are returned as
    /// [`StoreError::Backend`].
    pub fn create<E: Entity>(&self, entity: &E, txn: Txn<'_>) -> Result<()> {
        let table = self.table(entity.table_name())?;
        let stmt = self.builder.insert(table, std::slice::from_ref(entity))?;
        self.with_conn(txn, |conn| execute(conn, &stmt)).map(|_| ())
    }

    /// Inserts `entities` in one statement, resolving conflicts on the
    /// table's `conflict` columns by overwriting its `upsert` columns.
    ///
    /// Returns the number of rows inserted or changed.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] if `entities` is empty (no SQL runs) or
    /// mixes tables.
    pub fn upsert<E: Entity>(&self, entities: &[E], txn: Txn<'_>) -> Result<usize> {
        let first = entities
            .first()
            .ok_or_else(|| StoreError::Validation("zero entities passed".to_string()))?;
        let table = self.table(first.table_name())?;
        let stmt = self.builder.upsert(table, entities)?;
        self.with_conn(txn, |conn| execute(conn, &stmt))
    }

    /// Counts rows of `entity`'s table matching `cond`.
    pub fn get_count(&self, entity: &dyn Entity, cond: &Condition, txn: Txn<'_>) -> Result<u64> {
        let table = self.table(entity.table_name())?;
        let stmt = self.builder.count(table, cond)?;
        self.with_conn(txn, |conn| {
            debug!(sql = %stmt.sql, "count");
            let count: i64 = conn.query_row(
                &stmt.sql,
                params_from_iter(convert::params(&stmt)?),
                |row| row.get(0),
            )?;
            u64::try_from(count).map_err(|e| StoreError::Conversion(e.to_string()))
        })
    }

    /// Selects rows matching `cond` into default-constructed entities.
    pub fn list<E: Entity + Default>(&self, cond: &Condition, txn: Txn<'_>) -> Result<Vec<E>> {
        self.list_with(cond, txn, E::default)
    }

    /// Selects rows matching `cond` into entities produced by `make`.
    ///
    /// `make` also identifies the table, so it must return entities of a
    /// single table.
    pub fn list_with<E, F>(&self, cond: &Condition, txn: Txn<'_>, make: F) -> Result<Vec<E>>
    where
        E: Entity,
        F: Fn() -> E,
    {
        let prototype = make();
        let table = self.table(prototype.table_name())?;
        let stmt = self.builder.select(table, cond)?;
        self.with_conn(txn, |conn| {
            debug!(sql = %stmt.sql, "select");
            let mut prepared = conn.prepare(&stmt.sql)?;
            let mut rows = prepared.query(params_from_iter(convert::params(&stmt)?))?;
            let mut entities = Vec::new();
            while let Some(row) = rows.next()? {
                let mut entity = make();
                convert::read_entity(row, table, &mut entity)?;
                entities.push(entity);
            }
            Ok(entities)
        })
    }

    /// Updates rows matching `cond` with `entity`'s `op` group.
    ///
    /// Returns the number of rows changed; zero is not an error.
    pub fn update(
        &self,
        entity: &dyn Entity,
        cond: &Condition,
        op: Operation,
        txn: Txn<'_>,
    ) -> Result<usize> {
        let table = self.table(entity.table_name())?;
        let stmt = self.builder.update(table, entity, cond, op)?;
        self.with_conn(txn, |conn| execute(conn, &stmt))
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.registry
            .require(name)
            .map(|table| &**table)
            .map_err(StoreError::from)
    }

    fn with_conn<T>(&self, txn: Txn<'_>, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match txn {
            Txn::Pooled => {
                self.check_cancelled()?;
                let conn = self.pool.get()?;
                self.watched(&conn, f)
            }
            Txn::Active(tx) => {
                self.check_cancelled()?;
                self.watched(tx, f)
            }
        }
    }

    fn watched<T>(&self, conn: &Connection, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let Some(flag) = &self.cancel else {
            return f(conn);
        };
        let _watch = cancel::watch(conn, flag);
        cancel::settle(f(conn), flag)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => Err(StoreError::Cancelled),
            _ => Ok(()),
        }
    }
}

fn execute(conn: &Connection, stmt: &Statement) -> Result<usize> {
    debug!(sql = %stmt.sql, params = stmt.params.len(), "execute");
    let changed = conn.execute(&stmt.sql, params_from_iter(convert::params(stmt)?))?;
    Ok(changed)
}
