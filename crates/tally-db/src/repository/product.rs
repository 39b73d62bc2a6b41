//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Listing joined with category and supplier names
//! - Reference checks on insert/update
//!
//! ## Writes That Depend On Other Rows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert / update product                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE                                                        │
//! │       ├── category exists?  no ──► ReferenceNotFound(category)          │
//! │       ├── supplier exists?  no ──► ReferenceNotFound(supplier)          │
//! │       └── INSERT / UPDATE products                                      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  A guarded delete of that category runs in its own IMMEDIATE unit, so  │
//! │  the two serialize: either the delete sees the new product and fails   │
//! │  with ReferentialConflict, or the insert sees the category gone.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is decremented only by the sale coordinator. `update` sets it
//! directly, for restocking and corrections.

use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use tally_core::text::name_key;
use tally_core::validation::{validate_id, validate_new_product};
use tally_core::{EntityKind, NewProduct, Product, ProductListing};

use crate::error::{DbResult, LedgerError, LedgerResult};
use crate::repository::{category, supplier};
use crate::unit_of_work::UnitOfWork;

const SELECT_COLUMNS: &str =
    "SELECT id, name, category_id, supplier_id, stock, unit_price_cents FROM products";

/// Looks up a product on any executor (pool or unit of work).
pub(crate) async fn find_by_id<'e, E>(executor: E, id: i64) -> DbResult<Option<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(product)
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let mouse = repo.insert(&NewProduct { name: "Mouse".into(), category_id: 1,
///     supplier_id: 1, stock: 10, unit_price_cents: 5_000 }).await?;
///
/// for row in repo.list_detailed().await? {
///     println!("{} ({:?})", row.name, row.category_name);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product after checking its category and supplier exist.
    ///
    /// ## Errors
    /// - `Validation` for a blank name, negative stock or non-positive price
    /// - `ReferenceNotFound` for an unknown category or supplier
    /// - `Validation(Duplicate)` when the folded name already exists
    pub async fn insert(&self, input: &NewProduct) -> LedgerResult<Product> {
        validate_new_product(input)?;

        let mut uow = UnitOfWork::begin(&self.pool, "insert_product").await?;
        let outcome = insert_inside(uow.conn(), input).await;
        let product = uow.finish(outcome).await?;

        info!(id = product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Replaces every field of a product, stock included.
    ///
    /// Past invoice lines keep the name and price they were sold with.
    pub async fn update(&self, id: i64, input: &NewProduct) -> LedgerResult<Product> {
        validate_id("id", id)?;
        validate_new_product(input)?;

        let mut uow = UnitOfWork::begin(&self.pool, "update_product").await?;
        let outcome = update_inside(uow.conn(), id, input).await;
        let product = uow.finish(outcome).await?;

        debug!(id, stock = product.stock, "Product updated");
        Ok(product)
    }

    /// Deletes a product, resolved by its own id.
    ///
    /// Invoice lines that sold it keep their snapshots; nothing else
    /// depends on a product.
    pub async fn delete(&self, id: i64) -> LedgerResult<()> {
        validate_id("id", id)?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::not_found(EntityKind::Product, id));
        }

        info!(id, "Product deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> LedgerResult<Option<Product>> {
        Ok(find_by_id(&self.pool, id).await?)
    }

    /// Lists all products ordered by id.
    pub async fn list(&self) -> LedgerResult<Vec<Product>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Lists products with their category and supplier names.
    ///
    /// Names are `None` when the reference points at a missing row.
    pub async fn list_detailed(&self) -> LedgerResult<Vec<ProductListing>> {
        let rows = sqlx::query_as::<_, ProductListing>(
            r#"
            SELECT
                p.id,
                p.name,
                c.name AS category_name,
                s.name AS supplier_name,
                p.stock,
                p.unit_price_cents
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            LEFT JOIN suppliers s ON s.id = p.supplier_id
            ORDER BY p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Number of products.
    pub async fn count(&self) -> LedgerResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit-of-work bodies
// =============================================================================

async fn ensure_references(conn: &mut SqliteConnection, input: &NewProduct) -> LedgerResult<()> {
    if category::find_by_id(&mut *conn, input.category_id)
        .await?
        .is_none()
    {
        return Err(LedgerError::not_found(EntityKind::Category, input.category_id));
    }

    if supplier::find_by_id(&mut *conn, input.supplier_id)
        .await?
        .is_none()
    {
        return Err(LedgerError::not_found(EntityKind::Supplier, input.supplier_id));
    }

    Ok(())
}

async fn insert_inside(conn: &mut SqliteConnection, input: &NewProduct) -> LedgerResult<Product> {
    ensure_references(conn, input).await?;
    let name = input.name.trim();

    let result = sqlx::query(
        r#"
        INSERT INTO products (name, name_key, category_id, supplier_id, stock, unit_price_cents)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(name)
    .bind(name_key(name))
    .bind(input.category_id)
    .bind(input.supplier_id)
    .bind(input.stock)
    .bind(input.unit_price_cents)
    .execute(&mut *conn)
    .await
    .map_err(|e| LedgerError::duplicate_on(e, "name", name))?;

    Ok(Product {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        category_id: Some(input.category_id),
        supplier_id: Some(input.supplier_id),
        stock: input.stock,
        unit_price_cents: input.unit_price_cents,
    })
}

async fn update_inside(
    conn: &mut SqliteConnection,
    id: i64,
    input: &NewProduct,
) -> LedgerResult<Product> {
    if find_by_id(&mut *conn, id).await?.is_none() {
        return Err(LedgerError::not_found(EntityKind::Product, id));
    }

    ensure_references(conn, input).await?;
    let name = input.name.trim();

    sqlx::query(
        r#"
        UPDATE products
        SET name = ?1, name_key = ?2, category_id = ?3, supplier_id = ?4,
            stock = ?5, unit_price_cents = ?6
        WHERE id = ?7
        "#,
    )
    .bind(name)
    .bind(name_key(name))
    .bind(input.category_id)
    .bind(input.supplier_id)
    .bind(input.stock)
    .bind(input.unit_price_cents)
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(|e| LedgerError::duplicate_on(e, "name", name))?;

    Ok(Product {
        id,
        name: name.to_string(),
        category_id: Some(input.category_id),
        supplier_id: Some(input.supplier_id),
        stock: input.stock,
        unit_price_cents: input.unit_price_cents,
    })
}
