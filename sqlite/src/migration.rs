//! Concurrent, additive schema migration.
//!
//! [`Migrator`] reconciles every registered table with the live database:
//! one unit of work per table runs on a dedicated rayon pool, each with its
//! own pooled connection. A unit reads the table's live columns, plans the
//! change with [`plan_table`] and executes the planned statements in order.
//!
//! The first fatal error trips a shared [`CancelFlag`]. Units check the flag
//! before introspecting and before every statement, and a statement already
//! running is interrupted, so pending work stops early; work already applied
//! is not rolled back.
//!
//! A table created concurrently by another process is not an error: on the
//! create branch, "already exists" failures for the table and its indexes are
//! skipped. The alter branch tolerates nothing.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tablemap_db::{DbConfig, SchemaFile};
//! use tablemap_sqlite::{Migrator, connect};
//!
//! let registry = Arc::new(SchemaFile::open("schema.yml").unwrap().registry().unwrap());
//! let pool = connect(&DbConfig::sqlite("app.db")).unwrap();
//!
//! let report = Migrator::new(pool, registry).migrate().unwrap();
//! println!("created: {:?}", report.created());
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use rayon::prelude::*;
use regex::Regex;
use rusqlite::{Connection, Transaction, TransactionBehavior, params_from_iter};
use tablemap_core::{Dialect, QueryBuilder, Registry, Table, TablePlan, TableState, plan_table};
use tracing::{debug, info, warn};

use crate::cancel::{self, CancelFlag};
use crate::convert;
use crate::error::{Result, StoreError};
use crate::pool::ConnectionPool;

static DUPLICATE_RELATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:table|index) \S+ already exists$").expect("static regex must compile")
});

/// Returns `true` if `err` reports that a table or index already exists.
pub(crate) fn is_duplicate_relation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message))
        | rusqlite::Error::SqlInputError { msg: message, .. } => DUPLICATE_RELATION.is_match(message),
        _ => false,
    }
}

/// What migration did to one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    Created,
    Altered { added: Vec<String> },
    UpToDate,
}

/// Per-table outcomes of a successful migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub tables: BTreeMap<String, TableOutcome>,
}

impl MigrationReport {
    /// Tables created by this run, sorted by name.
    pub fn created(&self) -> Vec<&str> {
        self.with(|o| matches!(o, TableOutcome::Created))
    }

    /// Tables that gained columns, sorted by name.
    pub fn altered(&self) -> Vec<&str> {
        self.with(|o| matches!(o, TableOutcome::Altered { .. }))
    }

    /// Tables that needed no change, sorted by name.
    pub fn up_to_date(&self) -> Vec<&str> {
        self.with(|o| matches!(o, TableOutcome::UpToDate))
    }

    fn with(&self, pred: impl Fn(&TableOutcome) -> bool) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|(_, outcome)| pred(outcome))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Applies registered metadata to a SQLite database.
#[derive(Debug, Clone)]
pub struct Migrator {
    pool: ConnectionPool,
    registry: Arc<Registry>,
    builder: QueryBuilder,
}

impl Migrator {
    pub fn new(pool: ConnectionPool, registry: Arc<Registry>) -> Self {
        Self {
            pool,
            registry,
            builder: QueryBuilder::new(Dialect::Sqlite),
        }
    }

    /// Migrates every registered table concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error any unit hit, typically
    /// [`StoreError::Migration`] naming the table and statement.
    pub fn migrate(&self) -> Result<MigrationReport> {
        self.migrate_with(&CancelFlag::new())
    }

    /// Like [`migrate`](Self::migrate), but stops scheduling work once
    /// `cancel` is tripped, by the caller or by a failing unit.
    ///
    /// # Errors
    ///
    /// Returns the first unit error, or [`StoreError::Cancelled`] if the
    /// caller cancelled and no unit failed.
    pub fn migrate_with(&self, cancel: &CancelFlag) -> Result<MigrationReport> {
        let tables = self.registry.tables();
        if tables.is_empty() {
            return Ok(MigrationReport::default());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(tables.len())
            .build()
            .map_err(|e| StoreError::Configuration(format!("failed to build migration pool: {e}")))?;

        let first_error: Mutex<Option<StoreError>> = Mutex::new(None);
        let outcomes: Vec<Option<(String, TableOutcome)>> = pool.install(|| {
            tables
                .par_iter()
                .map(|table| match self.migrate_table(table, cancel) {
                    Ok(outcome) => Some((table.name().to_string(), outcome)),
                    Err(StoreError::Cancelled) => None,
                    Err(err) => {
                        warn!(table = table.name(), error = %err, "table migration failed");
                        let mut first = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                        if first.is_none() {
                            *first = Some(err);
                        }
                        cancel.cancel();
                        None
                    }
                })
                .collect()
        });

        if let Some(err) = first_error.into_inner().unwrap_or_else(PoisonError::into_inner) {
            return Err(err);
        }
        if outcomes.iter().any(Option::is_none) {
            return Err(StoreError::Cancelled);
        }
        Ok(MigrationReport {
            tables: outcomes.into_iter().flatten().collect(),
        })
    }

    /// Plans every registered table without applying anything.
    pub fn status(&self) -> Result<Vec<TablePlan>> {
        let conn = self.pool.get()?;
        self.registry
            .tables()
            .into_iter()
            .map(|table| {
                let live = self.live_columns(&conn, table)?;
                Ok(plan_table(&self.builder, table, &live)?)
            })
            .collect()
    }

    fn migrate_table(&self, table: &Table, cancel: &CancelFlag) -> Result<TableOutcome> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let conn = self.pool.get()?;
        let _watch = cancel::watch(&conn, cancel);
        cancel::settle(self.apply_plan(&conn, table, cancel), cancel)
    }

    fn apply_plan(&self, conn: &Connection, table: &Table, cancel: &CancelFlag) -> Result<TableOutcome> {
        let live = self.live_columns(conn, table)?;
        let plan = plan_table(&self.builder, table, &live)?;
        let creating = plan.state == TableState::NeedsCreate;

        for statement in plan.statements.iter().filter(|s| !s.trim().is_empty()) {
            if cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            match apply_statement(conn, statement, creating) {
                Ok(true) => debug!(table = table.name(), sql = %statement, "applied"),
                Ok(false) => {
                    debug!(table = table.name(), sql = %statement, "relation already exists, skipping");
                }
                Err(source) => {
                    return Err(StoreError::Migration {
                        table: table.name().to_string(),
                        statement: statement.clone(),
                        source,
                    });
                }
            }
        }

        info!(table = table.name(), state = plan.state.as_str(), "table migrated");
        Ok(match plan.state {
            TableState::NeedsCreate => TableOutcome::Created,
            TableState::NeedsAlter { missing } => TableOutcome::Altered { added: missing },
            TableState::UpToDate => TableOutcome::UpToDate,
        })
    }

    fn live_columns(&self, conn: &Connection, table: &Table) -> Result<Vec<String>> {
        let probe = self.builder.columns_probe(table.name(), "");
        let params = convert::params(&probe)?;
        let query = || -> rusqlite::Result<Vec<String>> {
            let mut stmt = conn.prepare(&probe.sql)?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| row.get(0))?;
            rows.collect()
        };
        query().map_err(|source| StoreError::Migration {
            table: table.name().to_string(),
            statement: probe.sql.clone(),
            source,
        })
    }
}

/// Runs one planned statement in its own `BEGIN IMMEDIATE` transaction.
fn execute_ddl(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute_batch(sql)?;
    tx.commit()
}

/// Executes `sql`, returning `false` if it was skipped because the relation
/// it creates already exists. Only the create branch skips.
fn apply_statement(conn: &Connection, sql: &str, creating: bool) -> rusqlite::Result<bool> {
    match execute_ddl(conn, sql) {
        Ok(()) => Ok(true),
        Err(err) if creating && is_duplicate_relation(&err) => Ok(false),
        Err(err) => Err(err),
    }
}
