//! # Sale Coordinator
//!
//! Registers a sale as one atomic unit: invoice header, line snapshots and
//! stock decrements commit together or not at all.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register_sale(client_id, lines)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate ids / non-empty / qty > 0        ──► Validation (no txn)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE ─────────────────────────────────────────────────┐     │
//! │  │ client row          ─ missing ─────────► ReferenceNotFound     │     │
//! │  │ InvoiceDraft::new(client snapshot, now)                        │     │
//! │  │                                                                │     │
//! │  │ for each line, in order (fresh reads every time):              │     │
//! │  │   product row       ─ missing ─────────► ReferenceNotFound     │     │
//! │  │   category row      ─ missing ─────────► ReferenceNotFound     │     │
//! │  │   supplier row      ─ missing ─────────► ReferenceNotFound     │     │
//! │  │   draft.push_line   ─ stock short ─────► InsufficientStock     │     │
//! │  │                                                                │     │
//! │  │ INSERT invoices                                                │     │
//! │  │ INSERT invoice_lines × n                                       │     │
//! │  │ UPDATE products SET stock = stock - q WHERE stock >= q  × n    │     │
//! │  COMMIT ◄──── any error above: ROLLBACK, nothing persisted ───────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrent Sales
//! The write lock is taken at BEGIN, so a second sale of the same product
//! waits for the first to commit and then reads the reduced stock. The
//! decrement is also conditional on `stock >= q`; a zero row count aborts
//! the sale instead of writing a negative stock.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use tally_core::validation::{validate_id, validate_sale_lines};
use tally_core::{EntityKind, InvoiceDraft, SaleLine, SaleRequest};

use crate::error::{DbError, LedgerError, LedgerResult};
use crate::repository::{category, client, product, supplier};
use crate::unit_of_work::UnitOfWork;

/// Registers sales.
#[derive(Debug, Clone)]
pub struct SaleCoordinator {
    pool: SqlitePool,
}

impl SaleCoordinator {
    pub fn new(pool: SqlitePool) -> Self {
        SaleCoordinator { pool }
    }

    /// Records a sale and returns the new invoice id.
    ///
    /// ## Errors
    /// - `Validation` - non-positive ids, empty `lines`, quantity ≤ 0
    /// - `ReferenceNotFound` - client, product, or a product's category or
    ///   supplier does not exist at the time its line is processed
    /// - `InsufficientStock` - a line (together with earlier lines for the
    ///   same product) asks for more than the current stock
    /// - `Persistence` - the store failed or the write lock wait timed out
    ///
    /// Every error leaves the database exactly as it was.
    pub async fn register_sale(&self, client_id: i64, lines: &[SaleLine]) -> LedgerResult<i64> {
        validate_id("client_id", client_id)?;
        validate_sale_lines(lines)?;

        debug!(client_id, lines = lines.len(), "Registering sale");

        let mut uow = UnitOfWork::begin(&self.pool, "register_sale").await?;
        let outcome = register_inside(uow.conn(), client_id, lines).await;

        match uow.finish(outcome).await {
            Ok(receipt) => {
                info!(
                    client_id,
                    invoice_id = receipt.invoice_id,
                    total = %receipt.total,
                    lines = receipt.line_count,
                    "Sale committed"
                );
                Ok(receipt.invoice_id)
            }
            Err(err) => {
                warn!(client_id, kind = err.kind(), error = %err, "Sale aborted");
                Err(err)
            }
        }
    }

    /// Records a parsed sale request.
    pub async fn register(&self, request: &SaleRequest) -> LedgerResult<i64> {
        self.register_sale(request.client_id, &request.lines).await
    }

    /// Parses caller-supplied text and records the sale.
    ///
    /// ```rust,ignore
    /// let invoice_id = db.sales().register_sale_str("3", [("1", "2"), ("4", "1")]).await?;
    /// ```
    pub async fn register_sale_str<I, P, Q>(&self, raw_client_id: &str, raw_lines: I) -> LedgerResult<i64>
    where
        I: IntoIterator<Item = (P, Q)>,
        P: AsRef<str>,
        Q: AsRef<str>,
    {
        let request = SaleRequest::parse(raw_client_id, raw_lines)?;
        self.register(&request).await
    }
}

struct Receipt {
    invoice_id: i64,
    total: tally_core::Money,
    line_count: usize,
}

async fn register_inside(
    conn: &mut SqliteConnection,
    client_id: i64,
    lines: &[SaleLine],
) -> LedgerResult<Receipt> {
    let client = client::find_by_id(&mut *conn, client_id)
        .await?
        .ok_or_else(|| LedgerError::not_found(EntityKind::Client, client_id))?;

    let mut draft = InvoiceDraft::new(&client, Utc::now());

    for line in lines {
        let product = product::find_by_id(&mut *conn, line.product_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Product, line.product_id))?;

        // A NULL reference resolves to id 0, which never exists.
        let category_id = product.category_id.unwrap_or(0);
        let category = category::find_by_id(&mut *conn, category_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Category, category_id))?;

        let supplier_id = product.supplier_id.unwrap_or(0);
        let supplier = supplier::find_by_id(&mut *conn, supplier_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Supplier, supplier_id))?;

        draft.push_line(&product, &category, &supplier, line.quantity)?;
    }

    let invoice_id = persist(conn, &draft).await?;

    Ok(Receipt {
        invoice_id,
        total: draft.total(),
        line_count: draft.line_count(),
    })
}

async fn persist(conn: &mut SqliteConnection, draft: &InvoiceDraft) -> LedgerResult<i64> {
    let client = draft.client();

    let invoice_id = sqlx::query(
        r#"
        INSERT INTO invoices (date, client_id, client_name, client_email, client_national_id, total_cents)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(draft.date())
    .bind(client.client_id)
    .bind(&client.name)
    .bind(&client.email)
    .bind(&client.national_id)
    .bind(draft.total().cents())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for line in draft.lines() {
        sqlx::query(
            r#"
            INSERT INTO invoice_lines (
                invoice_id, product_id, quantity, unit_price_cents, line_total_cents,
                product_name, category_name, supplier_name
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(invoice_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line.line_total.cents())
        .bind(&line.product_name)
        .bind(&line.category_name)
        .bind(&line.supplier_name)
        .execute(&mut *conn)
        .await?;

        let updated = sqlx::query(
            "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
        )
        .bind(line.quantity)
        .bind(line.product_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if updated != 1 {
            // Unreachable while the write lock is held; treated as a store
            // failure so the unit rolls back.
            return Err(DbError::TransactionFailed(format!(
                "stock decrement for product {} affected {updated} rows",
                line.product_id
            ))
            .into());
        }
    }

    debug!(invoice_id, lines = draft.line_count(), "Invoice persisted");
    Ok(invoice_id)
}
