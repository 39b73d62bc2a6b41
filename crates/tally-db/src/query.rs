//! # Invoice Queries
//!
//! Read-only access to stored invoices for listings, reports and exports.
//!
//! ## Detail Shape
//! ```text
//! invoice_detail(7)
//!      │
//!      ▼
//! ┌────────────── header fields ───────────────┬──────── line fields ────────┐
//! │ 7 │ 2026-10-19 │ Ana Pérez │ ... │ $199.99 │ Mouse │ 2 │ $50.00 │ $100.00 │
//! │ 7 │ 2026-10-19 │ Ana Pérez │ ... │ $199.99 │ Cable │ 3 │ $33.33 │  $99.99 │
//! └────────────────────────────────────────────┴─────────────────────────────┘
//!   one row per line, in the order the sale listed them
//! ```
//!
//! An id with no lines gives an empty detail. Only text that is not an id
//! at all (`invoice_detail_str("abc")`) is an error.
//!
//! The detail is fetched in one query and handed back as an owned row set
//! rather than a cursor. It holds no pooled connection once returned, and
//! callers can iterate it as many times as they like.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use tally_core::validation::parse_id;
use tally_core::{Invoice, InvoiceDetailRow, InvoiceLine, InvoiceSummary, Money};

use crate::error::LedgerResult;

// =============================================================================
// Invoice Detail
// =============================================================================

/// The rows of one invoice. Finite, owned, and iterable any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceDetail {
    rows: Vec<InvoiceDetailRow>,
}

impl InvoiceDetail {
    pub fn iter(&self) -> std::slice::Iter<'_, InvoiceDetailRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first row, which carries the header fields shared by all rows.
    pub fn header(&self) -> Option<&InvoiceDetailRow> {
        self.rows.first()
    }

    /// The stored invoice total, or zero for an empty detail.
    pub fn total(&self) -> Money {
        self.header()
            .map(|row| Money::from_cents(row.total_cents))
            .unwrap_or_default()
    }

    pub fn into_rows(self) -> Vec<InvoiceDetailRow> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a InvoiceDetail {
    type Item = &'a InvoiceDetailRow;
    type IntoIter = std::slice::Iter<'a, InvoiceDetailRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for InvoiceDetail {
    type Item = InvoiceDetailRow;
    type IntoIter = std::vec::IntoIter<InvoiceDetailRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

// =============================================================================
// Invoice Queries
// =============================================================================

/// Read-only invoice access.
#[derive(Debug, Clone)]
pub struct InvoiceQueries {
    pool: SqlitePool,
}

impl InvoiceQueries {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceQueries { pool }
    }

    /// All invoice headers, most recent first (ties: higher id first).
    pub async fn list_invoices(&self) -> LedgerResult<Vec<InvoiceSummary>> {
        let invoices = sqlx::query_as::<_, InvoiceSummary>(
            "SELECT id, date, client_name, total_cents FROM invoices ORDER BY date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = invoices.len(), "Listed invoices");
        Ok(invoices)
    }

    /// Header fields repeated next to each line, in insertion order.
    pub async fn invoice_detail(&self, invoice_id: i64) -> LedgerResult<InvoiceDetail> {
        let rows = sqlx::query_as::<_, InvoiceDetailRow>(
            r#"
            SELECT
                i.id AS invoice_id,
                i.date,
                i.client_id,
                i.client_name,
                i.client_email,
                i.client_national_id,
                i.total_cents,
                l.product_id,
                l.product_name,
                l.category_name,
                l.supplier_name,
                l.quantity,
                l.unit_price_cents,
                l.line_total_cents
            FROM invoices i
            INNER JOIN invoice_lines l ON l.invoice_id = i.id
            WHERE i.id = ?1
            ORDER BY l.id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(invoice_id, rows = rows.len(), "Loaded invoice detail");
        Ok(InvoiceDetail { rows })
    }

    /// Like [`invoice_detail`](Self::invoice_detail), for a caller-supplied id.
    ///
    /// Non-numeric text is a `Validation` error; an unknown id is an empty
    /// detail.
    pub async fn invoice_detail_str(&self, raw_invoice_id: &str) -> LedgerResult<InvoiceDetail> {
        let invoice_id = parse_id("invoice_id", raw_invoice_id)?;
        self.invoice_detail(invoice_id).await
    }

    /// The stored header, if the invoice exists.
    pub async fn get_invoice(&self, invoice_id: i64) -> LedgerResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, date, client_id, client_name, client_email, client_national_id, total_cents
            FROM invoices
            WHERE id = ?1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// The stored lines of an invoice, in insertion order.
    pub async fn get_lines(&self, invoice_id: i64) -> LedgerResult<Vec<InvoiceLine>> {
        let lines = sqlx::query_as::<_, InvoiceLine>(
            r#"
            SELECT id, invoice_id, product_id, quantity, unit_price_cents, line_total_cents,
                   product_name, category_name, supplier_name
            FROM invoice_lines
            WHERE invoice_id = ?1
            ORDER BY id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Number of stored invoices.
    pub async fn count(&self) -> LedgerResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
