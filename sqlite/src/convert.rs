//! Conversion between [`Value`] and SQLite's storage classes.
//!
//! SQLite has no boolean or timestamp type: booleans are stored as `0`/`1`
//! and timestamps as RFC 3339 text. Decoding back into Rust types is left to
//! [`FromValue`](tablemap_core::FromValue), which accepts those encodings.

use chrono::SecondsFormat;
use rusqlite::Row;
use rusqlite::types::{Value as SqlValue, ValueRef};
use tablemap_core::{Entity, Statement, Table, Value};

use crate::error::{Result, StoreError};

/// Converts one bound value to SQLite's representation.
pub(crate) fn to_sql(value: &Value) -> Result<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        Value::Timestamp(ts) => SqlValue::Text(ts.to_rfc3339_opts(SecondsFormat::Micros, true)),
        Value::List(_) => {
            return Err(StoreError::Build(
                "list values can only be bound as predicate operands".to_string(),
            ));
        }
    })
}

/// Converts a statement's parameters, in order.
pub(crate) fn params(stmt: &Statement) -> Result<Vec<SqlValue>> {
    stmt.params.iter().map(to_sql).collect()
}

/// Reads column `index` of `row`.
pub(crate) fn read_column(row: &Row<'_>, index: usize) -> Result<Value> {
    Ok(match row.get_ref(index)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| StoreError::Conversion(format!("column {index} is not UTF-8: {e}")))?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    })
}

/// Writes a row selected over the `all` group into `entity`.
pub(crate) fn read_entity<E: Entity>(row: &Row<'_>, table: &Table, entity: &mut E) -> Result<()> {
    for (index, field) in table.fields().iter().enumerate() {
        let value = read_column(row, index)?;
        entity.set(&field.accessor, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rusqlite::Connection;
    use tablemap_core::FromValue;

    #[test]
    fn test_booleans_stored_as_integers() {
        assert_eq!(to_sql(&Value::Bool(true)).unwrap(), SqlValue::Integer(1));
        assert_eq!(to_sql(&Value::Bool(false)).unwrap(), SqlValue::Integer(0));
    }

    #[test]
    fn test_list_cannot_be_bound() {
        assert!(matches!(
            to_sql(&Value::list([1i64])),
            Err(StoreError::Build(_))
        ));
    }

    #[test]
    fn test_timestamp_survives_storage() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let conn = Connection::open_in_memory().unwrap();
        let stored = to_sql(&Value::Timestamp(ts)).unwrap();
        let read = conn
            .query_row("SELECT ?1", [stored], |row| Ok(read_column(row, 0)))
            .unwrap()
            .unwrap();
        assert!(matches!(read, Value::Text(_)));
        assert_eq!(chrono::DateTime::<Utc>::from_value(read).unwrap(), ts);
    }

    #[test]
    fn test_read_storage_classes() {
        let conn = Connection::open_in_memory().unwrap();
        let values = conn
            .query_row("SELECT NULL, 7, 1.5, 'x', x'0102'", [], |row| {
                Ok((0..5).map(|i| read_column(row, i)).collect::<Vec<_>>())
            })
            .unwrap();
        let values: Vec<Value> = values.into_iter().map(|v| v.unwrap()).collect();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Int(7),
                Value::Float(1.5),
                Value::from("x"),
                Value::Bytes(vec![1, 2]),
            ]
        );
    }
}
