//! Per-call filter, ordering, paging and locking options.
//!
//! A [`Condition`] is built fresh for each query and consumed by the
//! [`QueryBuilder`](crate::QueryBuilder). Predicates keep insertion order so
//! the rendered SQL, and therefore its parameter numbering, is stable.
//!
//! ```
//! use tablemap_core::{Condition, Direction, Value};
//!
//! let cond = Condition::new()
//!     .eq("status", "open")
//!     .not_eq("owner", Value::Null)
//!     .order_by("created_at", Direction::Desc)
//!     .limit(20);
//! assert_eq!(cond.predicates().len(), 2);
//! ```

use crate::value::Value;

/// Comparison used by a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`, `IS NULL` or `IN (…)`.
    Eq,
    /// `<>`, `IS NOT NULL` or `NOT IN (…)`.
    NotEq,
}

/// A single column predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Column being compared.
    pub column: String,
    /// Comparison kind.
    pub comparison: Comparison,
    /// Right-hand operand.
    pub operand: Value,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One ordering entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// Filter and paging options for count, select and update statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    predicates: Vec<Predicate>,
    order: Vec<OrderBy>,
    limit: u64,
    offset: u64,
    for_update: bool,
}

impl Condition {
    /// An empty condition: no filter, no ordering, no paging.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality predicate.
    pub fn eq(mut self, column: impl Into<String>, operand: impl Into<Value>) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            comparison: Comparison::Eq,
            operand: operand.into(),
        });
        self
    }

    /// Adds an inequality predicate.
    pub fn not_eq(mut self, column: impl Into<String>, operand: impl Into<Value>) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            comparison: Comparison::NotEq,
            operand: operand.into(),
        });
        self
    }

    /// Appends an ordering entry.
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    /// Maximum number of rows; `0` means unlimited.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Rows to skip; `0` means none.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Requests a row lock on selected rows.
    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn ordering(&self) -> &[OrderBy] {
        &self.order
    }

    pub fn limit_value(&self) -> u64 {
        self.limit
    }

    pub fn offset_value(&self) -> u64 {
        self.offset
    }

    pub fn is_for_update(&self) -> bool {
        self.for_update
    }

    /// Returns `true` if the condition carries no predicates.
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates_keep_insertion_order() {
        let cond = Condition::new().not_eq("b", 2i64).eq("a", 1i64).eq("c", 3i64);
        let columns: Vec<_> = cond.predicates().iter().map(|p| p.column.as_str()).collect();
        assert_eq!(columns, vec!["b", "a", "c"]);
        assert_eq!(cond.predicates()[0].comparison, Comparison::NotEq);
    }

    #[test]
    fn test_defaults() {
        let cond = Condition::new();
        assert!(cond.is_unfiltered());
        assert_eq!(cond.limit_value(), 0);
        assert_eq!(cond.offset_value(), 0);
        assert!(!cond.is_for_update());
    }

    #[test]
    fn test_list_operand() {
        let cond = Condition::new().eq("id", Value::list([1i64, 2]));
        assert!(matches!(cond.predicates()[0].operand, Value::List(ref v) if v.len() == 2));
    }
}
