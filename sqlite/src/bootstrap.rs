//! Connection bootstrap with bounded retry.
//!
//! [`connect`] is the only place in the workspace that retries: databases
//! started alongside the application may not accept connections right away,
//! so the first connection is attempted immediately and then once per retry
//! interval until the configured timeout runs out.

use std::thread;
use std::time::Instant;

use tablemap_db::{DbConfig, Driver};
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::pool::ConnectionPool;

/// Opens a verified connection pool for `config`.
///
/// # Errors
///
/// Returns [`StoreError::Configuration`] if the configuration is invalid or
/// names a driver other than SQLite, or if no attempt succeeds before the
/// timeout; the message carries the timeout and the last attempt's error.
///
/// # Examples
///
/// ```
/// use tablemap_db::DbConfig;
/// use tablemap_sqlite::connect;
///
/// let pool = connect(&DbConfig::memory()).unwrap();
/// assert_eq!(pool.max_connections(), 1);
/// ```
pub fn connect(config: &DbConfig) -> Result<ConnectionPool> {
    config.validate()?;
    let driver = config.driver()?;
    if driver != Driver::Sqlite {
        return Err(StoreError::Configuration(format!(
            "unsupported driver '{driver}': only sqlite can be opened"
        )));
    }

    let started = Instant::now();
    let deadline = started + config.timeout();
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let err = match ConnectionPool::open(config) {
            Ok(pool) => {
                info!(
                    database = %config.name,
                    attempt,
                    max_connections = pool.max_connections(),
                    "connected to the database"
                );
                return Ok(pool);
            }
            Err(err) => err,
        };
        warn!(database = %config.name, attempt, error = %err, "failed to connect to the database");

        let now = Instant::now();
        if now >= deadline {
            return Err(StoreError::Configuration(format!(
                "db connection failed after {}s timeout: {err}",
                config.timeout
            )));
        }
        thread::sleep(config.retry_interval().min(deadline - now));
    }
}
