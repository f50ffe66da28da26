//! Schema file workflow example.
//!
//! Loads table metadata from YAML, renders its DDL for every dialect, then
//! migrates a file-backed SQLite database and writes rows through dynamic
//! entities.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p tablemap-demos --example schema_file
//! ```

use std::sync::Arc;

use tablemap_core::{Condition, Dialect, DynamicEntity, QueryBuilder, plan_table};
use tablemap_db::{DbConfig, SchemaFile};
use tablemap_sqlite::{Migrator, SqlAdapter, Txn, connect};

const SCHEMA: &str = r#"
tables:
  - name: visits
    fields:
      - { name: id, column: id, type: INTEGER PRIMARY KEY, ops: id }
      - { name: path, column: path, type: TEXT, default: not null, index: "index,unique", ops: "create,conflict" }
      - { name: hits, column: hits, type: INTEGER, default: default 0 not null, ops: "create,upsert" }
"#;

fn main() {
    // === Step 1: Load the schema ===
    let schema = SchemaFile::from_yaml(SCHEMA).unwrap();
    let registry = Arc::new(schema.registry().unwrap());
    let visits = registry.table("visits").unwrap();

    // === Step 2: Render DDL per dialect ===
    for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite] {
        println!("=== {dialect} ===");
        let plan = plan_table(&QueryBuilder::new(dialect), visits, &[]).unwrap();
        for statement in &plan.statements {
            println!("{statement};");
        }
        let upsert = QueryBuilder::new(dialect)
            .upsert(visits, &[spec_entity(&schema, "/", 1)])
            .unwrap();
        println!("{upsert}\n");
    }

    // === Step 3: Migrate a database file ===
    let dir = std::env::temp_dir().join("tablemap_schema_file_example");
    std::fs::create_dir_all(&dir).unwrap();
    let config = DbConfig::sqlite(dir.join("visits.db"));
    let pool = connect(&config).unwrap();

    let report = Migrator::new(pool.clone(), Arc::clone(&registry))
        .migrate()
        .unwrap();
    println!("=== Migration ===");
    for (table, outcome) in &report.tables {
        println!("  {table}: {outcome:?}");
    }

    // === Step 4: Write and read dynamic rows ===
    let adapter = SqlAdapter::new(pool, Arc::clone(&registry));
    let before = adapter
        .get_count(&spec_entity(&schema, "", 0), &Condition::new(), Txn::Pooled)
        .unwrap();
    adapter
        .upsert(
            &[spec_entity(&schema, "/", 1), spec_entity(&schema, "/about", 1)],
            Txn::Pooled,
        )
        .unwrap();

    let spec = schema.table("visits").unwrap();
    let rows = adapter
        .list_with(&Condition::new().limit(10), Txn::Pooled, || spec.entity())
        .unwrap();
    println!("\n=== Rows ({before} before this run) ===");
    for row in &rows {
        println!("  {:?} -> {:?}", row.value("path"), row.value("hits"));
    }

    std::fs::remove_dir_all(&dir).unwrap();
}

fn spec_entity(schema: &SchemaFile, path: &str, hits: i64) -> DynamicEntity {
    schema
        .table("visits")
        .unwrap()
        .entity()
        .with("path", path)
        .with("hits", hits)
}
