//! Cooperative cancellation of in-flight statements.
//!
//! A [`CancelFlag`] is checked before work starts and, while a statement
//! runs, from SQLite's progress handler: once the flag is tripped the
//! running statement is interrupted and the call returns
//! [`StoreError::Cancelled`](crate::StoreError::Cancelled).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rusqlite::{Connection, ErrorCode};

use crate::error::{Result, StoreError};

/// Virtual machine instructions between two checks of the flag.
const CHECK_INTERVAL: i32 = 1_000;

/// Cancellation shared between a caller and the calls it started.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Interrupts statements on `conn` once `cancel` is tripped, until the
/// returned guard is dropped.
pub(crate) fn watch<'c>(conn: &'c Connection, cancel: &CancelFlag) -> Watch<'c> {
    let flag = cancel.clone();
    conn.progress_handler(CHECK_INTERVAL, Some(move || flag.is_cancelled()));
    Watch { conn }
}

/// Removes the progress handler installed by [`watch`].
pub(crate) struct Watch<'c> {
    conn: &'c Connection,
}

impl Drop for Watch<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
    }
}

/// Returns `true` if `err` reports a statement stopped by the progress
/// handler.
pub(crate) fn is_interrupted(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted)
}

/// Reports a statement interrupted through `cancel` as
/// [`StoreError::Cancelled`]; other results pass through.
pub(crate) fn settle<T>(result: Result<T>, cancel: &CancelFlag) -> Result<T> {
    match result {
        Err(StoreError::Backend(ref err) | StoreError::Migration { source: ref err, .. })
            if cancel.is_cancelled() && is_interrupted(err) =>
        {
            Err(StoreError::Cancelled)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDLESS: &str = "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) \
                           SELECT COUNT(*) FROM c";

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_tripped_flag_interrupts_statement() {
        let conn = Connection::open_in_memory().unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let _watch = watch(&conn, &cancel);
        let err = conn
            .query_row(ENDLESS, [], |row| row.get::<_, i64>(0))
            .unwrap_err();
        assert!(is_interrupted(&err));
    }

    #[test]
    fn test_settle_maps_only_cancelled_interrupts() {
        let conn = Connection::open_in_memory().unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let interrupted = {
            let _watch = watch(&conn, &cancel);
            conn.query_row(ENDLESS, [], |row| row.get::<_, i64>(0))
                .unwrap_err()
        };
        assert!(matches!(
            settle::<()>(Err(interrupted.into()), &cancel),
            Err(StoreError::Cancelled)
        ));

        let other = conn.execute_batch("SELECT * FROM missing").unwrap_err();
        assert!(matches!(
            settle::<()>(Err(other.into()), &cancel),
            Err(StoreError::Backend(_))
        ));
        assert!(matches!(settle(Ok(3), &cancel), Ok(3)));
    }

    #[test]
    fn test_handler_removed_after_watch() {
        let conn = Connection::open_in_memory().unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        drop(watch(&conn, &cancel));
        let n: i64 = conn
            .query_row(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 5000) \
                 SELECT COUNT(*) FROM c",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(n, 5000);
    }
}
