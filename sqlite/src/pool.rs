//! SQLite connection pool.
//!
//! A thin wrapper over an [`r2d2`] pool of [`r2d2_sqlite`] connections.
//! Connections are opened lazily up to a fixed cap and every new connection
//! gets the same session setup: a busy timeout, foreign keys on and, for
//! database files, WAL journaling.

use std::fmt;
use std::time::Duration;

use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tablemap_db::DbConfig;
use tracing::debug;

use crate::error::Result;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A connection checked out of a [`ConnectionPool`]; returned on drop.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

fn configure(conn: &mut Connection, file: bool) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    if file {
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!(journal_mode = %mode, "opened sqlite connection");
    }
    Ok(())
}

/// Shared handle to a pool of SQLite connections.
///
/// Cloning is cheap; all clones draw from the same connections.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: r2d2::Pool<SqliteConnectionManager>,
}

impl ConnectionPool {
    /// Opens a pool for the SQLite database named by `config` and verifies
    /// it with `SELECT 1`.
    ///
    /// An in-memory database is private to its connection, so its pool holds
    /// exactly one connection regardless of `max_connections`, and that
    /// connection is never retired.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`](crate::StoreError::Backend) if a
    /// connection cannot be opened or does not answer.
    pub fn open(config: &DbConfig) -> Result<Self> {
        let file = !config.is_memory();
        let manager = if file {
            SqliteConnectionManager::file(&config.name)
        } else {
            SqliteConnectionManager::memory()
        }
        .with_init(move |conn| configure(conn, file));

        // Fails fast instead of waiting out the checkout timeout.
        let conn = manager.connect()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        drop(conn);

        let builder = r2d2::Pool::builder()
            .min_idle(Some(0))
            .connection_timeout(config.timeout().max(BUSY_TIMEOUT));
        let builder = if file {
            builder.max_size(config.max_connections.clamp(1, u32::MAX as usize) as u32)
        } else {
            builder.max_size(1).idle_timeout(None).max_lifetime(None)
        };
        Ok(Self {
            pool: builder.build(manager)?,
        })
    }

    /// Takes a connection, opening a new one if the pool is below its cap.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Pool`](crate::StoreError::Pool) if every
    /// connection stays busy for the whole checkout timeout or a new
    /// connection cannot be opened.
    pub fn get(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Maximum number of connections.
    pub fn max_connections(&self) -> usize {
        self.pool.max_size() as usize
    }

    /// Connections currently open, idle or in use.
    pub fn open_connections(&self) -> usize {
        self.pool.state().connections as usize
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("max_connections", &self.max_connections())
            .field("open_connections", &self.open_connections())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(dir: &tempfile::TempDir, max: usize) -> DbConfig {
        DbConfig {
            max_connections: max,
            timeout: 0,
            ..DbConfig::sqlite(dir.path().join("pool.db"))
        }
    }

    #[test]
    fn test_memory_pool_has_one_connection() {
        let pool = ConnectionPool::open(&DbConfig::memory()).unwrap();
        assert_eq!(pool.max_connections(), 1);
        let conn = pool.get().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        drop(conn);
        // Same connection, so the table is still visible.
        let conn = pool.get().unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_max_connections_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&file_config(&dir, 3)).unwrap();
        assert_eq!(pool.max_connections(), 3);

        let pool = ConnectionPool::open(&file_config(&dir, 0)).unwrap();
        assert_eq!(pool.max_connections(), 1);
    }

    #[test]
    fn test_connections_are_reused() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&file_config(&dir, 3)).unwrap();
        {
            let _a = pool.get().unwrap();
            let _b = pool.get().unwrap();
            assert_eq!(pool.open_connections(), 2);
        }
        let _c = pool.get().unwrap();
        assert_eq!(pool.open_connections(), 2);
    }

    #[test]
    fn test_session_setup_applies_to_every_connection() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&file_config(&dir, 2)).unwrap();
        let a = pool.get().unwrap();
        let b = pool.get().unwrap();
        for conn in [&a, &b] {
            let on: i64 = conn
                .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
                .unwrap();
            assert_eq!(on, 1);
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |r| r.get(0))
                .unwrap();
            assert_eq!(mode, "wal");
        }
    }

    #[test]
    fn test_open_fails_fast_on_bad_path() {
        let config = DbConfig {
            timeout: 0,
            ..DbConfig::sqlite("/nonexistent/dir/app.db")
        };
        let started = std::time::Instant::now();
        assert!(matches!(
            ConnectionPool::open(&config),
            Err(crate::StoreError::Backend(_))
        ));
        assert!(started.elapsed() < BUSY_TIMEOUT);
    }

    #[test]
    fn test_waiter_gets_released_connection() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&file_config(&dir, 1)).unwrap();
        let held = pool.get().unwrap();

        let waiter = {
            let pool = pool.clone();
            std::thread::spawn(move || pool.get().map(|_| ()))
        };
        std::thread::sleep(Duration::from_millis(50));
        drop(held);
        waiter.join().unwrap().unwrap();
    }
}
