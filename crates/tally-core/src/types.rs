//! # Domain Types
//!
//! Core domain types used throughout the ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  MASTER DATA (mutable)                                                  │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────┐  ┌─────────────────┐   │
//! │  │  Category  │  │  Supplier  │  │   Client   │  │    Product      │   │
//! │  │  name      │  │  tax_id    │  │ national_id│  │  category_id ───┼─► │
//! │  └────────────┘  └────────────┘  └────────────┘  │  supplier_id ───┼─► │
//! │                                                  │  stock, price   │   │
//! │                                                  └─────────────────┘   │
//! │                                                                         │
//! │  HISTORY (immutable once written)                                       │
//! │  ┌──────────────────────────┐      ┌──────────────────────────────┐    │
//! │  │  Invoice                 │ 1..* │  InvoiceLine                 │    │
//! │  │  client_*  (snapshot)    │◄─────│  product/category/supplier   │    │
//! │  │  total_cents             │      │  names, unit price (snapshot)│    │
//! │  └──────────────────────────┘      └──────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Invoices copy every master-data field they print. Later edits or deletes
//! of a product, category, supplier or client never change a past invoice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Entity Kind
// =============================================================================

/// Names the table an id belongs to, used in error reporting and guard rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Supplier,
    Client,
    Product,
    Invoice,
}

impl EntityKind {
    /// Lowercase singular name, stable for logs and error codes.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Supplier => "supplier",
            EntityKind::Client => "client",
            EntityKind::Product => "product",
            EntityKind::Invoice => "invoice",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    /// Stored with original casing; uniqueness is checked on the folded key.
    pub name: String,
}

/// Input for creating or editing a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// 11-digit tax identifier, unique.
    pub tax_id: String,
}

/// Input for creating or editing a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub tax_id: String,
}

// =============================================================================
// Client
// =============================================================================

/// A client that can be invoiced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// 6-8 digit national identity number, unique.
    pub national_id: String,
}

/// Input for creating or editing a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub national_id: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// The category and supplier references are nullable in storage; a product
/// whose reference is missing cannot be sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    /// Units on hand, never negative.
    pub stock: i64,
    /// Current price in cents. Invoices copy it at sale time.
    pub unit_price_cents: i64,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Checks whether `quantity` more units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity <= self.stock
    }
}

/// Input for creating or editing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category_id: i64,
    pub supplier_id: i64,
    pub stock: i64,
    pub unit_price_cents: i64,
}

/// Product joined with the names of its category and supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductListing {
    pub id: i64,
    pub name: String,
    pub category_name: Option<String>,
    pub supplier_name: Option<String>,
    pub stock: i64,
    pub unit_price_cents: i64,
}

// =============================================================================
// Invoice
// =============================================================================

/// A stored invoice header. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: i64,
    pub date: DateTime<Utc>,
    /// Live reference, used by the guard to keep the client undeletable.
    pub client_id: i64,
    pub client_name: String,
    pub client_email: String,
    pub client_national_id: String,
    /// Sum of the line totals.
    pub total_cents: i64,
}

impl Invoice {
    /// Returns the invoice total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A stored invoice line with its frozen snapshot fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceLine {
    pub id: i64,
    pub invoice_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// quantity × unit_price_cents.
    pub line_total_cents: i64,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Category name at time of sale (frozen).
    pub category_name: String,
    /// Supplier name at time of sale (frozen).
    pub supplier_name: String,
}

impl InvoiceLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// One row of an invoice listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceSummary {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub client_name: String,
    pub total_cents: i64,
}

/// One row of an invoice detail: the header repeated next to one line.
///
/// ```text
/// invoice_id │ date │ client_* │ total │ product │ category │ supplier │ qty │ unit │ line
/// ───────────┼──────┼──────────┼───────┼─────────┼──────────┼──────────┼─────┼──────┼─────
///     7      │ ...  │ Ana ...  │ 19999 │ Mouse   │ Periph.  │ Acme     │  2  │ 5000 │10000
///     7      │ ...  │ Ana ...  │ 19999 │ Cable   │ Periph.  │ Acme     │  3  │ 3333 │ 9999
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceDetailRow {
    pub invoice_id: i64,
    pub date: DateTime<Utc>,
    pub client_id: i64,
    pub client_name: String,
    pub client_email: String,
    pub client_national_id: String,
    pub total_cents: i64,
    pub product_id: i64,
    pub product_name: String,
    pub category_name: String,
    pub supplier_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

// =============================================================================
// Sale Input
// =============================================================================

/// One requested line of a sale: which product and how many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: i64,
    pub quantity: i64,
}

impl SaleLine {
    #[inline]
    pub const fn new(product_id: i64, quantity: i64) -> Self {
        SaleLine {
            product_id,
            quantity,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::Category.to_string(), "category");
        assert_eq!(EntityKind::Invoice.as_str(), "invoice");
    }

    #[test]
    fn test_product_can_sell() {
        let product = Product {
            id: 1,
            name: "Mouse".to_string(),
            category_id: Some(1),
            supplier_id: Some(1),
            stock: 3,
            unit_price_cents: 5000,
        };
        assert!(product.can_sell(3));
        assert!(!product.can_sell(4));
        assert_eq!(product.unit_price(), Money::from_cents(5000));
    }

    #[test]
    fn test_entity_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EntityKind::Supplier).unwrap();
        assert_eq!(json, "\"supplier\"");
    }
}
