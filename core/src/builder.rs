//! Parameterized SQL and DDL synthesis.
//!
//! [`QueryBuilder`] turns table metadata plus a [`Condition`] into a
//! [`Statement`]: SQL text with dialect-specific placeholders and the values
//! to bind, in order. The builder holds nothing but its [`Dialect`], so one
//! copy can be shared by every caller; each call assembles its statement in
//! a private [`SqlWriter`].
//!
//! # Example
//!
//! ```
//! use tablemap_core::{Condition, Dialect, FieldSpec, QueryBuilder, Registry, TableSpec};
//!
//! let spec = TableSpec::new("notes")
//!     .field(FieldSpec::new("id").column("id").sql_type("INTEGER PRIMARY KEY").ops("id"))
//!     .field(FieldSpec::new("body").column("body").sql_type("TEXT").ops("create"));
//! let registry = Registry::builder().shared(spec.prototype()).build().unwrap();
//! let table = registry.table("notes").unwrap();
//!
//! let builder = QueryBuilder::new(Dialect::Postgres);
//! let stmt = builder.select(table, &Condition::new().eq("id", 4i64)).unwrap();
//! assert_eq!(stmt.sql, "SELECT id, body FROM notes WHERE id = $1");
//! ```

use std::fmt;

use crate::condition::{Comparison, Condition, Predicate};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::registry::{Constraint, Entity, Field, Operation, Table};
use crate::value::Value;

/// SQL text with its bound parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Per-call statement assembly state.
#[derive(Debug)]
pub struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Appends raw SQL text.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Appends a placeholder and records `value` as its parameter.
    pub fn bind(&mut self, value: Value) -> &mut Self {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
        self
    }

    pub fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Conflict handling appended to a multi-row insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnConflict {
    /// Plain insert.
    None,
    /// Skip rows that collide on `target`.
    DoNothing { target: Vec<String> },
    /// Overwrite `set` columns of rows that collide on `target`.
    DoUpdate { target: Vec<String>, set: Vec<String> },
}

impl OnConflict {
    /// Derives the clause from a table's `conflict` and `upsert` groups.
    pub fn for_table(table: &Table) -> Self {
        let target: Vec<String> = table
            .operation_columns(Operation::Conflict)
            .into_iter()
            .map(String::from)
            .collect();
        let set: Vec<String> = table
            .operation_columns(Operation::Upsert)
            .into_iter()
            .map(String::from)
            .collect();
        match (target.is_empty(), set.is_empty()) {
            (true, _) => OnConflict::None,
            (false, true) => OnConflict::DoNothing { target },
            (false, false) => OnConflict::DoUpdate { target, set },
        }
    }

    fn insert_verb(&self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (OnConflict::DoNothing { .. }, Dialect::MySql) => "INSERT IGNORE INTO ",
            _ => "INSERT INTO ",
        }
    }

    fn render(&self, dialect: Dialect, w: &mut SqlWriter) {
        match self {
            OnConflict::None => {}
            OnConflict::DoNothing { target } => {
                if dialect.has_on_conflict() {
                    w.push(" ON CONFLICT (")
                        .push(&target.join(", "))
                        .push(") DO NOTHING");
                }
            }
            OnConflict::DoUpdate { target, set } => {
                let assignments: Vec<String> = if dialect.has_on_conflict() {
                    w.push(" ON CONFLICT (")
                        .push(&target.join(", "))
                        .push(") DO UPDATE SET ");
                    set.iter().map(|c| format!("{c} = excluded.{c}")).collect()
                } else {
                    w.push(" ON DUPLICATE KEY UPDATE ");
                    set.iter().map(|c| format!("{c} = VALUES({c})")).collect()
                };
                w.push(&assignments.join(", "));
            }
        }
    }
}

/// Stateless statement factory for one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryBuilder {
    dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Builds a multi-row `INSERT` over the `create` group.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if `entities` is empty or holds an entity of
    /// another table; [`Error::Build`] if the table has no `create` fields.
    pub fn insert<E: Entity>(&self, table: &Table, entities: &[E]) -> Result<Statement> {
        self.insert_rows(table, entities, &OnConflict::None)
    }

    /// Builds a multi-row insert with the table's conflict clause.
    ///
    /// Without `conflict` columns this is a plain insert.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn upsert<E: Entity>(&self, table: &Table, entities: &[E]) -> Result<Statement> {
        self.insert_rows(table, entities, &OnConflict::for_table(table))
    }

    fn insert_rows<E: Entity>(
        &self,
        table: &Table,
        entities: &[E],
        conflict: &OnConflict,
    ) -> Result<Statement> {
        if entities.is_empty() {
            return Err(Error::Validation("zero entities passed".to_string()));
        }
        if let Some(other) = entities.iter().find(|e| e.table_name() != table.name()) {
            return Err(Error::Validation(format!(
                "entity of table '{}' mixed into insert for table '{}'",
                other.table_name(),
                table.name()
            )));
        }
        let columns = table.operation_columns(Operation::Create);
        if columns.is_empty() {
            return Err(Error::Build(format!(
                "table '{}' has no fields in the create group",
                table.name()
            )));
        }

        let mut w = SqlWriter::new(self.dialect);
        w.push(conflict.insert_verb(self.dialect))
            .push(table.name())
            .push(" (")
            .push(&columns.join(", "))
            .push(") VALUES ");
        for (row, entity) in entities.iter().enumerate() {
            if row > 0 {
                w.push(", ");
            }
            w.push("(");
            for (i, bound) in table.bind(entity, Operation::Create)?.into_iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.bind(bound.value);
            }
            w.push(")");
        }
        conflict.render(self.dialect, &mut w);
        Ok(w.finish())
    }

    /// Builds `SELECT COUNT(*)` filtered by the condition's predicates.
    ///
    /// Ordering, paging and locking do not apply to a count.
    pub fn count(&self, table: &Table, cond: &Condition) -> Result<Statement> {
        let mut w = SqlWriter::new(self.dialect);
        w.push("SELECT COUNT(*) FROM ").push(table.name());
        self.render_where(&mut w, table, cond.predicates())?;
        Ok(w.finish())
    }

    /// Builds a `SELECT` of every mapped column in declaration order.
    pub fn select(&self, table: &Table, cond: &Condition) -> Result<Statement> {
        let mut w = SqlWriter::new(self.dialect);
        w.push("SELECT ")
            .push(&table.operation_columns(Operation::All).join(", "))
            .push(" FROM ")
            .push(table.name());
        self.render_where(&mut w, table, cond.predicates())?;

        if !cond.ordering().is_empty() {
            let mut entries = Vec::with_capacity(cond.ordering().len());
            for entry in cond.ordering() {
                require_column(table, &entry.column)?;
                entries.push(format!("{} {}", entry.column, entry.direction.as_sql()));
            }
            w.push(" ORDER BY ").push(&entries.join(", "));
        }

        let (limit, offset) = (cond.limit_value(), cond.offset_value());
        if limit > 0 {
            w.push(&format!(" LIMIT {limit}"));
        } else if offset > 0 {
            // SQLite and MySQL only accept OFFSET after a LIMIT.
            match self.dialect {
                Dialect::Postgres => {}
                Dialect::Sqlite => {
                    w.push(" LIMIT -1");
                }
                Dialect::MySql => {
                    w.push(&format!(" LIMIT {}", u64::MAX));
                }
            }
        }
        if offset > 0 {
            w.push(&format!(" OFFSET {offset}"));
        }

        if cond.is_for_update() {
            if let Some(lock) = self.dialect.row_lock() {
                w.push(" ").push(lock);
            }
        }
        Ok(w.finish())
    }

    /// Builds an `UPDATE` assigning group `op` from `entity`.
    ///
    /// # Errors
    ///
    /// [`Error::Build`] if the group is empty or a predicate names an
    /// unknown column.
    pub fn update(
        &self,
        table: &Table,
        entity: &dyn Entity,
        cond: &Condition,
        op: Operation,
    ) -> Result<Statement> {
        let bound = table.bind(entity, op)?;
        if bound.is_empty() {
            return Err(Error::Build(format!(
                "table '{}' has no fields in the {op} group",
                table.name()
            )));
        }

        let mut w = SqlWriter::new(self.dialect);
        w.push("UPDATE ").push(table.name()).push(" SET ");
        for (i, b) in bound.into_iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push(&b.field.name).push(" = ").bind(b.value);
        }
        self.render_where(&mut w, table, cond.predicates())?;
        Ok(w.finish())
    }

    fn render_where(&self, w: &mut SqlWriter, table: &Table, predicates: &[Predicate]) -> Result<()> {
        for (i, p) in predicates.iter().enumerate() {
            require_column(table, &p.column)?;
            w.push(if i == 0 { " WHERE " } else { " AND " });
            let column = p.column.as_str();
            match (&p.operand, p.comparison) {
                (Value::Null, Comparison::Eq) => {
                    w.push(column).push(" IS NULL");
                }
                (Value::Null, Comparison::NotEq) => {
                    w.push(column).push(" IS NOT NULL");
                }
                (Value::List(items), cmp) if items.is_empty() => {
                    w.push(if cmp == Comparison::Eq { "(1=0)" } else { "(1=1)" });
                }
                (Value::List(items), cmp) => {
                    w.push(column)
                        .push(if cmp == Comparison::Eq { " IN (" } else { " NOT IN (" });
                    for (j, item) in items.iter().enumerate() {
                        if matches!(item, Value::List(_)) {
                            return Err(Error::Build(format!(
                                "nested list operand for column '{column}'"
                            )));
                        }
                        if j > 0 {
                            w.push(", ");
                        }
                        w.bind(item.clone());
                    }
                    w.push(")");
                }
                (value, cmp) => {
                    w.push(column)
                        .push(if cmp == Comparison::Eq { " = " } else { " <> " })
                        .bind(value.clone());
                }
            }
        }
        Ok(())
    }

    /// Statements creating `table`: the table, its indexes, then the
    /// prototype's `on_create` statements.
    ///
    /// # Errors
    ///
    /// [`Error::Build`] if the table maps no columns.
    pub fn create_table(&self, table: &Table) -> Result<Vec<String>> {
        let fields = table.operation_fields(Operation::All);
        if fields.is_empty() {
            return Err(Error::Build(format!(
                "table '{}' has no mapped columns",
                table.name()
            )));
        }
        let columns: Vec<String> = fields.into_iter().map(column_definition).collect();

        let mut statements = Vec::with_capacity(1 + table.constraints().len());
        statements.push(format!(
            "CREATE TABLE {} ({})",
            table.name(),
            columns.join(", ")
        ));
        statements.extend(
            table
                .constraints()
                .iter()
                .map(|c| index_statement(self.dialect, table.name(), c)),
        );
        statements.extend(table.prototype().on_create());
        Ok(statements)
    }

    /// Statements adding `field` to its existing table, including its index.
    pub fn add_column(&self, field: &Field) -> Vec<String> {
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD {}",
            field.table,
            column_definition(field)
        )];
        if field.constraint.indexed {
            statements.push(index_statement(self.dialect, &field.table, &field.constraint));
        }
        statements
    }

    /// Query listing the live column names of `table`.
    ///
    /// `database` names the MySQL schema; other dialects ignore it.
    pub fn columns_probe(&self, table: &str, database: &str) -> Statement {
        let mut w = SqlWriter::new(self.dialect);
        match self.dialect {
            Dialect::Sqlite => {
                w.push("SELECT name FROM pragma_table_info(")
                    .bind(Value::from(table))
                    .push(", 'main')");
            }
            Dialect::Postgres | Dialect::MySql => {
                w.push("SELECT column_name FROM INFORMATION_SCHEMA.COLUMNS WHERE table_schema = ")
                    .bind(Value::from(self.dialect.catalog_schema(database)))
                    .push(" AND table_name = ")
                    .bind(Value::from(table));
            }
        }
        w.finish()
    }
}

fn require_column(table: &Table, column: &str) -> Result<()> {
    if table.field(column).is_some() {
        Ok(())
    } else {
        Err(Error::Build(format!(
            "unknown column '{column}' in table '{}'",
            table.name()
        )))
    }
}

fn column_definition(field: &Field) -> String {
    [field.name.as_str(), &field.sql_type, &field.default]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Index names join table and column with `.`, which no plain identifier
/// contains, so the name is quoted.
fn index_statement(dialect: Dialect, table: &str, constraint: &Constraint) -> String {
    format!(
        "CREATE {}INDEX {} ON {table} ({col})",
        if constraint.unique { "UNIQUE " } else { "" },
        dialect.quote_identifier(&index_name(table, &constraint.field)),
        col = constraint.field,
    )
}

/// Name of the index `table` keeps on `column`.
pub fn index_name(table: &str, column: &str) -> String {
    format!("{table}.{column}_idx")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Direction;
    use crate::dynamic::TableSpec;
    use crate::registry::tests::{Account, account_registry};
    use crate::registry::{FieldSpec, Registry};

    fn account(uuid: &str, balance: i64) -> Account {
        Account {
            id: 0,
            uuid: uuid.to_string(),
            active: Some(true),
            balance,
            note: String::new(),
        }
    }

    #[test]
    fn test_upsert_zero_entities() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let err = QueryBuilder::new(Dialect::Postgres)
            .upsert::<Account>(table, &[])
            .unwrap_err();
        assert_eq!(err, Error::Validation("zero entities passed".to_string()));
    }

    #[test]
    fn test_upsert_postgres() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let stmt = QueryBuilder::new(Dialect::Postgres)
            .upsert(table, &[account("a", 1), account("b", 2)])
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO accounts (uuid, active, balance) VALUES ($1, $2, $3), ($4, $5, $6) \
             ON CONFLICT (uuid) DO UPDATE SET active = excluded.active, balance = excluded.balance"
        );
        assert_eq!(stmt.params.len(), 6);
        assert_eq!(stmt.params[3], Value::from("b"));
    }

    #[test]
    fn test_upsert_mysql() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let stmt = QueryBuilder::new(Dialect::MySql)
            .upsert(table, &[account("a", 1)])
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO accounts (uuid, active, balance) VALUES (?, ?, ?) \
             ON DUPLICATE KEY UPDATE active = VALUES(active), balance = VALUES(balance)"
        );
    }

    #[test]
    fn test_on_conflict_variants() {
        let target = vec!["k".to_string()];
        let mut w = SqlWriter::new(Dialect::Sqlite);
        OnConflict::DoNothing {
            target: target.clone(),
        }
        .render(Dialect::Sqlite, &mut w);
        assert_eq!(w.finish().sql, " ON CONFLICT (k) DO NOTHING");

        let nothing = OnConflict::DoNothing { target };
        assert_eq!(nothing.insert_verb(Dialect::MySql), "INSERT IGNORE INTO ");
        assert_eq!(OnConflict::None.insert_verb(Dialect::MySql), "INSERT INTO ");
    }

    #[test]
    fn test_insert_has_no_conflict_clause() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let stmt = QueryBuilder::new(Dialect::Sqlite)
            .insert(table, &[account("a", 1)])
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO accounts (uuid, active, balance) VALUES (?1, ?2, ?3)"
        );
    }

    #[test]
    fn test_select_without_condition() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let stmt = QueryBuilder::new(Dialect::Postgres)
            .select(table, &Condition::new())
            .unwrap();
        assert_eq!(stmt.sql, "SELECT id, uuid, active, balance FROM accounts");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_full_condition() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let cond = Condition::new()
            .eq("uuid", Value::list(["a", "b"]))
            .not_eq("active", Value::Null)
            .not_eq("balance", 0i64)
            .order_by("balance", Direction::Desc)
            .order_by("id", Direction::Asc)
            .limit(10)
            .offset(5)
            .for_update();
        let stmt = QueryBuilder::new(Dialect::Postgres).select(table, &cond).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT id, uuid, active, balance FROM accounts \
             WHERE uuid IN ($1, $2) AND active IS NOT NULL AND balance <> $3 \
             ORDER BY balance DESC, id ASC LIMIT 10 OFFSET 5 FOR UPDATE"
        );
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn test_mysql_lock_follows_ordering_and_paging() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let cond = Condition::new()
            .eq("uuid", "a")
            .order_by("id", Direction::Desc)
            .limit(1)
            .for_update();
        let stmt = QueryBuilder::new(Dialect::MySql).select(table, &cond).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT id, uuid, active, balance FROM accounts WHERE uuid = ? \
             ORDER BY id DESC LIMIT 1 FOR UPDATE"
        );

        let locked_only = QueryBuilder::new(Dialect::Postgres)
            .select(table, &Condition::new().for_update())
            .unwrap();
        assert_eq!(locked_only.sql, "SELECT id, uuid, active, balance FROM accounts FOR UPDATE");
        let count = QueryBuilder::new(Dialect::Postgres)
            .count(table, &Condition::new().for_update())
            .unwrap();
        assert_eq!(count.sql, "SELECT COUNT(*) FROM accounts");
    }

    #[test]
    fn test_index_names_do_not_collide_across_tables() {
        let first = TableSpec::new("a_b").field(
            FieldSpec::new("c").column("c").sql_type("INTEGER").index("index"),
        );
        let second = TableSpec::new("a").field(
            FieldSpec::new("b_c").column("b_c").sql_type("INTEGER").index("index"),
        );
        let registry = Registry::builder()
            .shared(first.prototype())
            .shared(second.prototype())
            .build()
            .unwrap();
        let builder = QueryBuilder::new(Dialect::Sqlite);
        let a_b = builder.create_table(registry.table("a_b").unwrap()).unwrap();
        let a = builder.create_table(registry.table("a").unwrap()).unwrap();
        assert_eq!(a_b[1], "CREATE INDEX \"a_b.c_idx\" ON a_b (c)");
        assert_eq!(a[1], "CREATE INDEX \"a.b_c_idx\" ON a (b_c)");
        assert_ne!(index_name("a_b", "c"), index_name("a", "b_c"));

        let mysql = QueryBuilder::new(Dialect::MySql).add_column(
            registry.table("a").unwrap().field("b_c").unwrap(),
        );
        assert_eq!(mysql[1], "CREATE INDEX `a.b_c_idx` ON a (b_c)");
    }

    #[test]
    fn test_sqlite_renders_no_lock_modifier() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let stmt = QueryBuilder::new(Dialect::Sqlite)
            .select(table, &Condition::new().eq("id", 1i64).for_update())
            .unwrap();
        assert_eq!(stmt.sql, "SELECT id, uuid, active, balance FROM accounts WHERE id = ?1");
    }

    #[test]
    fn test_offset_without_limit() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let cond = Condition::new().offset(3);
        let sqlite = QueryBuilder::new(Dialect::Sqlite).select(table, &cond).unwrap();
        assert!(sqlite.sql.ends_with(" LIMIT -1 OFFSET 3"));
        let pg = QueryBuilder::new(Dialect::Postgres).select(table, &cond).unwrap();
        assert!(pg.sql.ends_with("accounts OFFSET 3"));
    }

    #[test]
    fn test_empty_list_operands() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let cond = Condition::new()
            .eq("id", Value::List(vec![]))
            .not_eq("uuid", Value::List(vec![]));
        let stmt = QueryBuilder::new(Dialect::Postgres).count(table, &cond).unwrap();
        assert_eq!(stmt.sql, "SELECT COUNT(*) FROM accounts WHERE (1=0) AND (1=1)");
    }

    #[test]
    fn test_unknown_column_is_build_error() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let builder = QueryBuilder::new(Dialect::Postgres);
        let err = builder
            .select(table, &Condition::new().eq("missing", 1i64))
            .unwrap_err();
        assert!(matches!(err, Error::Build(_)));
        let err = builder
            .select(table, &Condition::new().order_by("missing", Direction::Asc))
            .unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }

    #[test]
    fn test_update() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let stmt = QueryBuilder::new(Dialect::Postgres)
            .update(
                table,
                &account("a", 9),
                &Condition::new().eq("uuid", "a"),
                Operation::Update,
            )
            .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE accounts SET active = $1, balance = $2 WHERE uuid = $3"
        );
        assert_eq!(stmt.params[2], Value::from("a"));
    }

    #[test]
    fn test_empty_groups_are_build_errors() {
        let spec = TableSpec::new("logs")
            .field(FieldSpec::new("id").column("id").sql_type("INTEGER").ops("id"));
        let registry = Registry::builder().shared(spec.prototype()).build().unwrap();
        let table = registry.table("logs").unwrap();
        let builder = QueryBuilder::new(Dialect::Sqlite);

        let err = builder
            .update(table, &spec.entity(), &Condition::new(), Operation::Update)
            .unwrap_err();
        assert!(matches!(err, Error::Build(_)));
        let err = builder.insert(table, &[spec.entity()]).unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }

    #[test]
    fn test_mixed_tables_rejected() {
        let spec = TableSpec::new("other")
            .field(FieldSpec::new("uuid").column("uuid").ops("create"));
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let err = QueryBuilder::new(Dialect::Sqlite)
            .upsert(table, &[spec.entity()])
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_create_table_ddl() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let ddl = QueryBuilder::new(Dialect::Postgres).create_table(table).unwrap();
        assert_eq!(
            ddl,
            vec![
                "CREATE TABLE accounts (id BIGSERIAL primary key not null, uuid char(36) not null, \
                 active boolean null, balance bigint default 0 not null)"
                    .to_string(),
                "CREATE UNIQUE INDEX \"accounts.uuid_idx\" ON accounts (uuid)".to_string(),
                "CREATE INDEX \"accounts.balance_idx\" ON accounts (balance)".to_string(),
            ]
        );
    }

    #[test]
    fn test_add_column_ddl() {
        let registry = account_registry();
        let table = registry.table("accounts").unwrap();
        let builder = QueryBuilder::new(Dialect::Postgres);
        assert_eq!(
            builder.add_column(table.field("active").unwrap()),
            vec!["ALTER TABLE accounts ADD active boolean null".to_string()]
        );
        assert_eq!(
            builder.add_column(table.field("uuid").unwrap()),
            vec![
                "ALTER TABLE accounts ADD uuid char(36) not null".to_string(),
                "CREATE UNIQUE INDEX \"accounts.uuid_idx\" ON accounts (uuid)".to_string(),
            ]
        );
    }

    #[test]
    fn test_columns_probe() {
        let pg = QueryBuilder::new(Dialect::Postgres).columns_probe("accounts", "app");
        assert_eq!(
            pg.sql,
            "SELECT column_name FROM INFORMATION_SCHEMA.COLUMNS WHERE table_schema = $1 AND table_name = $2"
        );
        assert_eq!(pg.params, vec![Value::from("public"), Value::from("accounts")]);

        let lite = QueryBuilder::new(Dialect::Sqlite).columns_probe("accounts", "");
        assert_eq!(lite.sql, "SELECT name FROM pragma_table_info(?1, 'main')");
    }
}
