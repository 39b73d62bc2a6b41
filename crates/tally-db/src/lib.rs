//! # tally-db: Persistence Gateway for the Tally Ledger
//!
//! SQLite access (sqlx) for master data and invoices, plus the three
//! services that must run inside transactions: the sale coordinator, the
//! referential guard, and the invoice queries.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Ledger Data Flow                           │
//! │                                                                         │
//! │  Caller (menu, report, export)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐            │   │
//! │  │  │ Sale         │ │ Referential  │ │ Invoice      │            │   │
//! │  │  │ Coordinator  │ │ Guard        │ │ Queries      │            │   │
//! │  │  │  (sale.rs)   │ │  (guard.rs)  │ │  (query.rs)  │            │   │
//! │  │  └──────┬───────┘ └──────┬───────┘ └──────┬───────┘            │   │
//! │  │         │ UnitOfWork      │ UnitOfWork     │ pool               │   │
//! │  │         ▼                 ▼                ▼                    │   │
//! │  │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐            │   │
//! │  │  │   Database   │ │ Repositories │ │  Migrations  │            │   │
//! │  │  │  (pool.rs)   │ │ category ... │ │  (embedded)  │            │   │
//! │  │  └──────────────┘ └──────────────┘ └──────────────┘            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL, no foreign keys)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and the caller-facing `LedgerError`
//! - [`unit_of_work`] - `BEGIN IMMEDIATE` transactions with structural rollback
//! - [`repository`] - Category, supplier, client and product repositories
//! - [`guard`] - Deletable sets and guarded deletes
//! - [`sale`] - Sale registration
//! - [`query`] - Invoice listings and details
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_core::SaleLine;
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()).await?;
//!
//! let invoice_id = db
//!     .sales()
//!     .register_sale(client_id, &[SaleLine::new(mouse_id, 2)])
//!     .await?;
//!
//! for row in &db.invoices().invoice_detail(invoice_id).await? {
//!     println!("{} x {} = {}", row.quantity, row.product_name, row.line_total_cents);
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod guard;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repository;
pub mod sale;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use guard::{DependencyRule, Guarded, ReferentialGuard};
pub use pool::{Database, DbConfig};
pub use query::{InvoiceDetail, InvoiceQueries};
pub use sale::SaleCoordinator;
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::client::ClientRepository;
pub use repository::product::ProductRepository;
pub use repository::supplier::SupplierRepository;
