//! Shared fixtures for the integration tests.
//!
//! Every test gets its own SQLite file inside a temp directory, so tests can
//! use several pooled connections and run in parallel.

#![allow(dead_code)]

use std::time::Duration;

use tally_core::{Category, Client, NewCategory, NewClient, NewProduct, NewSupplier, Product, Supplier};
use tally_db::{Database, DbConfig};
use tempfile::TempDir;

/// A database plus the directory holding its file.
pub struct TestLedger {
    pub db: Database,
    _dir: TempDir,
}

impl std::ops::Deref for TestLedger {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

pub async fn ledger() -> TestLedger {
    ledger_with_pool(4).await
}

pub async fn ledger_with_pool(max_connections: u32) -> TestLedger {
    ledger_with(max_connections, Duration::from_secs(15)).await
}

/// A ledger whose writers give up on the lock after `busy_timeout`.
pub async fn ledger_with_busy_timeout(busy_timeout: Duration) -> TestLedger {
    ledger_with(4, busy_timeout).await
}

async fn ledger_with(max_connections: u32, busy_timeout: Duration) -> TestLedger {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = DbConfig::new(dir.path().join("ledger.db"))
        .max_connections(max_connections)
        .busy_timeout(busy_timeout);
    let db = Database::new(config).await.expect("database");
    TestLedger { db, _dir: dir }
}

/// One row of each master-data table, wired together.
pub struct Fixture {
    pub category: Category,
    pub supplier: Supplier,
    pub client: Client,
}

pub async fn fixture(db: &Database) -> Fixture {
    Fixture {
        category: category(db, "Periféricos").await,
        supplier: supplier(db, "TechDistrib SA", "30548976123").await,
        client: client(db, "Laura Martínez", "40875231").await,
    }
}

pub async fn category(db: &Database, name: &str) -> Category {
    db.categories()
        .insert(&NewCategory {
            name: name.to_string(),
        })
        .await
        .expect("insert category")
}

pub async fn supplier(db: &Database, name: &str, tax_id: &str) -> Supplier {
    db.suppliers()
        .insert(&NewSupplier {
            name: name.to_string(),
            phone: "1150001000".to_string(),
            email: "ventas@example.com".to_string(),
            tax_id: tax_id.to_string(),
        })
        .await
        .expect("insert supplier")
}

pub async fn client(db: &Database, name: &str, national_id: &str) -> Client {
    db.clients()
        .insert(&NewClient {
            name: name.to_string(),
            phone: "1123456789".to_string(),
            email: "cliente@mail.com".to_string(),
            national_id: national_id.to_string(),
        })
        .await
        .expect("insert client")
}

pub async fn product(
    db: &Database,
    fx: &Fixture,
    name: &str,
    stock: i64,
    unit_price_cents: i64,
) -> Product {
    db.products()
        .insert(&NewProduct {
            name: name.to_string(),
            category_id: fx.category.id,
            supplier_id: fx.supplier.id,
            stock,
            unit_price_cents,
        })
        .await
        .expect("insert product")
}

pub async fn stock_of(db: &Database, product_id: i64) -> i64 {
    db.products()
        .get_by_id(product_id)
        .await
        .expect("read product")
        .expect("product exists")
        .stock
}

pub async fn invoice_count(db: &Database) -> i64 {
    db.invoices().count().await.expect("count invoices")
}

pub async fn line_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM invoice_lines")
        .fetch_one(db.pool())
        .await
        .expect("count lines")
}
