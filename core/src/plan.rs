//! Schema reconciliation planning.
//!
//! Given a table's metadata and the column names currently present in the
//! database, [`plan_table`] decides whether the table must be created,
//! extended with new columns, or left alone. Migration is strictly additive:
//! live columns absent from the metadata are never dropped.

use std::collections::HashSet;

use crate::builder::QueryBuilder;
use crate::error::Result;
use crate::registry::Table;

/// Outcome of comparing a table's metadata with the live schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableState {
    /// The table does not exist yet.
    NeedsCreate,
    /// The table exists but lacks these columns, in declaration order.
    NeedsAlter { missing: Vec<String> },
    /// Every mapped column exists.
    UpToDate,
}

impl TableState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableState::NeedsCreate => "needs-create",
            TableState::NeedsAlter { .. } => "needs-alter",
            TableState::UpToDate => "up-to-date",
        }
    }
}

/// State plus the statements that resolve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub table: String,
    pub state: TableState,
    pub statements: Vec<String>,
}

impl TablePlan {
    /// Returns `true` if the plan has nothing to apply.
    pub fn is_noop(&self) -> bool {
        self.statements.iter().all(|s| s.trim().is_empty())
    }
}

/// Plans the reconciliation of `table` against its `live_columns`.
///
/// # Errors
///
/// Propagates [`Error::Build`](crate::Error::Build) from DDL generation.
pub fn plan_table(builder: &QueryBuilder, table: &Table, live_columns: &[String]) -> Result<TablePlan> {
    if live_columns.is_empty() {
        return Ok(TablePlan {
            table: table.name().to_string(),
            state: TableState::NeedsCreate,
            statements: builder.create_table(table)?,
        });
    }

    let live: HashSet<&str> = live_columns.iter().map(String::as_str).collect();
    let mut missing = Vec::new();
    let mut statements = Vec::new();
    for field in table.fields() {
        if !live.contains(field.name.as_str()) {
            missing.push(field.name.clone());
            statements.extend(builder.add_column(field));
        }
    }

    let state = if missing.is_empty() {
        TableState::UpToDate
    } else {
        TableState::NeedsAlter { missing }
    };
    Ok(TablePlan {
        table: table.name().to_string(),
        state,
        statements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::registry::tests::account_registry;

    fn live(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_no_live_columns_creates_all_fields_in_order() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let plan = plan_table(&QueryBuilder::new(Dialect::Sqlite), table, &[]).unwrap();
        assert_eq!(plan.state, TableState::NeedsCreate);
        let create = &plan.statements[0];
        let cols = create
            .trim_start_matches("CREATE TABLE accounts (")
            .trim_end_matches(')');
        let names: Vec<_> = cols
            .split(", ")
            .map(|c| c.split(' ').next().unwrap())
            .collect();
        assert_eq!(names, vec!["id", "uuid", "active", "balance"]);
    }

    #[test]
    fn test_missing_columns_only() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let plan = plan_table(
            &QueryBuilder::new(Dialect::Sqlite),
            table,
            &live(&["id", "active", "legacy"]),
        )
        .unwrap();
        assert_eq!(
            plan.state,
            TableState::NeedsAlter {
                missing: vec!["uuid".into(), "balance".into()]
            }
        );
        let alters: Vec<_> = plan
            .statements
            .iter()
            .filter(|s| s.starts_with("ALTER TABLE"))
            .collect();
        assert_eq!(alters.len(), 2);
        assert!(plan.statements.iter().all(|s| !s.contains("legacy")));
    }

    #[test]
    fn test_up_to_date() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let plan = plan_table(
            &QueryBuilder::new(Dialect::Sqlite),
            table,
            &live(&["id", "uuid", "active", "balance"]),
        )
        .unwrap();
        assert_eq!(plan.state, TableState::UpToDate);
        assert!(plan.is_noop());
    }
}
