//! # tally-core: Pure Business Logic for the Tally Ledger
//!
//! This crate holds the ledger's domain rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Ledger Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (menu, reports, export)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Persistence)                       │   │
//! │  │  SaleCoordinator • ReferentialGuard • InvoiceQueries • repos    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌───────────┐  ┌───────┐  ┌──────┐ │   │
//! │  │   │  types  │  │  money  │  │ validation│  │ text  │  │ sale │ │   │
//! │  │   │ Product │  │  Money  │  │   rules   │  │ keys  │  │draft │ │   │
//! │  │   │ Invoice │  │         │  │           │  │       │  │      │ │   │
//! │  │   └─────────┘  └─────────┘  └───────────┘  └───────┘  └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Master data and invoice types
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`text`] - Case/accent-insensitive name keys
//! - [`sale`] - Sale request parsing and invoice draft assembly
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//!
//! let unit_price: Money = "33.33".parse().unwrap();
//! let line_total = unit_price.checked_multiply_quantity(3).unwrap();
//! assert_eq!(line_total.cents(), 9_999);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod sale;
pub mod text;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale::{ClientSnapshot, DraftLine, InvoiceDraft, SaleRequest};
pub use types::*;
