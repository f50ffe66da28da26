//! Typed entity repository example.
//!
//! Registers a hand-written entity, migrates an in-memory SQLite database and
//! walks through create, upsert, list, count and update, including a
//! transaction the caller controls.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p tablemap-demos --example typed_entities
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tablemap_core::{Condition, Direction, Entity, FieldSpec, Operation, Registry, Value};
use tablemap_db::DbConfig;
use tablemap_sqlite::{Migrator, SqlAdapter, Txn, connect};

#[derive(Debug, Clone, Default)]
struct Product {
    id: i64,
    sku: String,
    title: String,
    stock: i64,
    discontinued: bool,
    updated_at: Option<DateTime<Utc>>,
}

impl Product {
    fn new(sku: &str, title: &str, stock: i64) -> Self {
        Self {
            sku: sku.to_string(),
            title: title.to_string(),
            stock,
            updated_at: Some(Utc::now()),
            ..Self::default()
        }
    }
}

impl Entity for Product {
    fn table_name(&self) -> &str {
        "products"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("id")
                .column("id")
                .sql_type("INTEGER PRIMARY KEY AUTOINCREMENT")
                .ops("id"),
            FieldSpec::new("sku")
                .column("sku")
                .sql_type("TEXT")
                .default_clause("not null")
                .index("index,unique")
                .ops("create,conflict"),
            FieldSpec::new("title")
                .column("title")
                .sql_type("TEXT")
                .default_clause("default '' not null")
                .ops("create,update,upsert"),
            FieldSpec::new("stock")
                .column("stock")
                .sql_type("INTEGER")
                .default_clause("default 0 not null")
                .ops("create,update,upsert"),
            FieldSpec::new("discontinued")
                .column("discontinued")
                .sql_type("INTEGER")
                .default_clause("default 0 not null")
                .ops("create,update"),
            FieldSpec::new("updated_at")
                .column("updated_at")
                .sql_type("TEXT")
                .ops("create,update,upsert"),
        ]
    }

    fn on_create(&self) -> Vec<String> {
        vec![
            "CREATE VIEW IF NOT EXISTS low_stock AS SELECT sku, stock FROM products WHERE stock < 5"
                .to_string(),
        ]
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "sku" => Some(self.sku.clone().into()),
            "title" => Some(self.title.clone().into()),
            "stock" => Some(self.stock.into()),
            "discontinued" => Some(self.discontinued.into()),
            "updated_at" => Some(self.updated_at.into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> tablemap_core::Result<()> {
        match field {
            "id" => self.id = value.decode()?,
            "sku" => self.sku = value.decode()?,
            "title" => self.title = value.decode()?,
            "stock" => self.stock = value.decode()?,
            "discontinued" => self.discontinued = value.decode()?,
            "updated_at" => self.updated_at = value.decode()?,
            _ => {}
        }
        Ok(())
    }
}

fn main() {
    // === Step 1: Register metadata and migrate ===
    let registry = Arc::new(Registry::builder().entity(Product::default()).build().unwrap());
    let pool = connect(&DbConfig::memory()).unwrap();

    println!("=== Migration ===");
    let report = Migrator::new(pool.clone(), Arc::clone(&registry))
        .migrate()
        .unwrap();
    println!("Created: {:?}", report.created());

    let adapter = SqlAdapter::new(pool, registry);

    // === Step 2: Create and upsert ===
    println!("\n=== Writes ===");
    adapter
        .create(&Product::new("KB-01", "Keyboard", 12), Txn::Pooled)
        .unwrap();
    let changed = adapter
        .upsert(
            &[
                Product::new("KB-01", "Mechanical keyboard", 3),
                Product::new("MS-02", "Mouse", 40),
                Product::new("HD-03", "Headset", 2),
            ],
            Txn::Pooled,
        )
        .unwrap();
    println!("Upsert touched {changed} rows");

    // === Step 3: Query ===
    println!("\n=== Queries ===");
    let all: Vec<Product> = adapter
        .list(&Condition::new().order_by("sku", Direction::Asc), Txn::Pooled)
        .unwrap();
    for product in &all {
        println!("  #{} {} '{}' stock={}", product.id, product.sku, product.title, product.stock);
    }
    let low = adapter
        .get_count(
            &Product::default(),
            &Condition::new().eq("sku", Value::list(["KB-01", "HD-03"])),
            Txn::Pooled,
        )
        .unwrap();
    println!("Products in the restock list: {low}");

    // === Step 4: Restock inside a transaction ===
    println!("\n=== Transaction ===");
    let mut conn = adapter.pool().get().unwrap();
    let tx = conn.transaction().unwrap();
    let locked: Vec<Product> = adapter
        .list(&Condition::new().eq("sku", "HD-03").for_update(), Txn::Active(&tx))
        .unwrap();
    for mut product in locked {
        product.stock += 20;
        product.updated_at = Some(Utc::now());
        let rows = adapter
            .update(
                &product,
                &Condition::new().eq("id", product.id),
                Operation::Upsert,
                Txn::Active(&tx),
            )
            .unwrap();
        println!("Restocked {} ({rows} row)", product.sku);
    }
    tx.commit().unwrap();
    drop(conn);

    let headset: Vec<Product> = adapter
        .list(&Condition::new().eq("sku", "HD-03"), Txn::Pooled)
        .unwrap();
    println!("HD-03 stock is now {}", headset[0].stock);
}
