//! # Sale Assembly
//!
//! Pure half of registering a sale: parsing the request and building the
//! invoice draft line by line.
//!
//! ## Where This Fits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tally-db::SaleCoordinator (inside BEGIN IMMEDIATE)                     │
//! │                                                                         │
//! │   fetch client ─────────► InvoiceDraft::new(&client, now)               │
//! │                                                                         │
//! │   for each line:                                                        │
//! │     fetch product,                                                      │
//! │     category, supplier ─► draft.push_line(...)   ← THIS MODULE          │
//! │                             ├── stock recheck (cumulative per product)  │
//! │                             ├── line total = qty × unit price           │
//! │                             └── total += line total                     │
//! │                                                                         │
//! │   insert header + lines, decrement stock, COMMIT                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The draft never touches storage. Everything it holds is a snapshot
//! taken from rows the coordinator read inside the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Category, Client, Product, SaleLine, Supplier};
use crate::validation::{parse_id, parse_quantity, validate_sale_lines, ValidationResult};

// =============================================================================
// Sale Request
// =============================================================================

/// A typed sale request, produced from caller-supplied text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub client_id: i64,
    pub lines: Vec<SaleLine>,
}

impl SaleRequest {
    /// Parses a client id and `(product_id, quantity)` pairs.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::sale::SaleRequest;
    ///
    /// let req = SaleRequest::parse("3", [("1", "2"), ("4", "1")]).unwrap();
    /// assert_eq!(req.client_id, 3);
    /// assert_eq!(req.lines.len(), 2);
    ///
    /// assert!(SaleRequest::parse("x", [("1", "2")]).is_err());
    /// assert!(SaleRequest::parse("3", Vec::<(&str, &str)>::new()).is_err());
    /// ```
    pub fn parse<I, P, Q>(raw_client_id: &str, raw_lines: I) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = (P, Q)>,
        P: AsRef<str>,
        Q: AsRef<str>,
    {
        let client_id = parse_id("client_id", raw_client_id)?;

        let lines = raw_lines
            .into_iter()
            .map(|(product, qty)| {
                Ok(SaleLine::new(
                    parse_id("product_id", product.as_ref())?,
                    parse_quantity(qty.as_ref())?,
                ))
            })
            .collect::<ValidationResult<Vec<_>>>()?;

        validate_sale_lines(&lines)?;

        Ok(SaleRequest { client_id, lines })
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// Client fields frozen into the invoice header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub client_id: i64,
    pub name: String,
    pub email: String,
    pub national_id: String,
}

impl From<&Client> for ClientSnapshot {
    fn from(client: &Client) -> Self {
        ClientSnapshot {
            client_id: client.id,
            name: client.name.clone(),
            email: client.email.clone(),
            national_id: client.national_id.clone(),
        }
    }
}

/// One accepted line of the draft, with every snapshot field resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: i64,
    pub product_name: String,
    pub category_name: String,
    pub supplier_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

// =============================================================================
// Invoice Draft
// =============================================================================

/// An invoice being assembled inside a sale transaction.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    date: DateTime<Utc>,
    client: ClientSnapshot,
    lines: Vec<DraftLine>,
    reserved: HashMap<i64, i64>,
    total: Money,
}

impl InvoiceDraft {
    /// Starts a draft for `client`, dated `date`.
    pub fn new(client: &Client, date: DateTime<Utc>) -> Self {
        InvoiceDraft {
            date,
            client: ClientSnapshot::from(client),
            lines: Vec::new(),
            reserved: HashMap::new(),
            total: Money::zero(),
        }
    }

    /// Adds a line for `quantity` units of `product`.
    ///
    /// `product`, `category` and `supplier` must be the rows as read right
    /// now. The stock check counts units already taken by earlier lines
    /// for the same product, so two lines of 3 against a stock of 5 fail
    /// on the second.
    ///
    /// On error the draft is left unchanged.
    pub fn push_line(
        &mut self,
        product: &Product,
        category: &Category,
        supplier: &Supplier,
        quantity: i64,
    ) -> CoreResult<&DraftLine> {
        crate::validation::validate_quantity(quantity)?;

        let already = self.reserved.get(&product.id).copied().unwrap_or(0);
        let requested = already.checked_add(quantity).ok_or_else(quantity_overflow)?;

        if !product.can_sell(requested) {
            return Err(CoreError::InsufficientStock {
                product_id: product.id,
                product_name: product.name.clone(),
                available: product.stock,
                requested,
            });
        }

        let unit_price = product.unit_price();
        let line_total = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(amount_overflow)?;
        let total = self.total.checked_add(line_total).ok_or_else(amount_overflow)?;

        self.reserved.insert(product.id, requested);
        self.total = total;
        self.lines.push(DraftLine {
            product_id: product.id,
            product_name: product.name.clone(),
            category_name: category.name.clone(),
            supplier_name: supplier.name.clone(),
            quantity,
            unit_price,
            line_total,
        });

        let index = self.lines.len() - 1;
        Ok(&self.lines[index])
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn client(&self) -> &ClientSnapshot {
        &self.client
    }

    /// Accepted lines in submission order.
    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    /// Sum of the line totals accepted so far.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Units reserved per product across all accepted lines.
    pub fn reserved_quantity(&self, product_id: i64) -> i64 {
        self.reserved.get(&product_id).copied().unwrap_or(0)
    }
}

fn quantity_overflow() -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 1,
        max: i64::MAX,
    })
}

fn amount_overflow() -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: "total".to_string(),
        min: 0,
        max: i64::MAX,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
