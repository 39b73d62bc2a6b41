//! # Repository Module
//!
//! Master-data repositories for the ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.products().insert(&new_product)                            │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── validate input (tally-core::validation)                           │
//! │  ├── SQL against the pool, or inside a UnitOfWork when the write       │
//! │  │   depends on other rows (product → category/supplier)               │
//! │  └── map UNIQUE violations to ValidationError::Duplicate               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Each module also exposes `find_by_id` over any sqlx executor, so the  │
//! │  guard and the sale coordinator can read the same rows on their own   │
//! │  transaction connection.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`](category::CategoryRepository)
//! - [`SupplierRepository`](supplier::SupplierRepository)
//! - [`ClientRepository`](client::ClientRepository)
//! - [`ProductRepository`](product::ProductRepository)
//!
//! Category, supplier and client deletes live in the referential guard.
//! Invoices have no repository: they are written only by the sale
//! coordinator and read through the invoice queries.

pub mod category;
pub mod client;
pub mod product;
pub mod supplier;
