//! # Database Error Types
//!
//! Error types for database operations, and the flat error every public
//! ledger operation returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)         tally-core                          │
//! │       │                             ValidationError / CoreError         │
//! │       ▼                                  │                              │
//! │  DbError ← adds categorization           │                              │
//! │       │                                  │                              │
//! │       └──────────────┬───────────────────┘                              │
//! │                      ▼                                                  │
//! │  LedgerError (caller-facing)                                            │
//! │  ├── Validation            bad input, nothing opened                    │
//! │  ├── ReferenceNotFound     id does not resolve, rolled back             │
//! │  ├── ReferentialConflict   delete blocked by dependents, rolled back    │
//! │  ├── InsufficientStock     sale exceeds stock, rolled back              │
//! │  └── Persistence           store failed, rolled back                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_core::{CoreError, EntityKind, ValidationError};
use thiserror::Error;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Category or product name colliding on its folded key
    /// - Repeated supplier tax id or client national id
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// CHECK constraint violation (e.g. `stock >= 0`).
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed (including `database is locked` after the
    /// busy timeout elapsed).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN / COMMIT / ROLLBACK failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    let field = target
                        .rsplit('.')
                        .next()
                        .map(unique_column_field)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::ConstraintViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Maps a storage column back to the field name callers submitted.
fn unique_column_field(column: &str) -> &str {
    match column {
        "name_key" => "name",
        other => other,
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// LedgerError
// =============================================================================

/// The error returned by every public ledger operation.
///
/// Each variant is a typed outcome; none of them leaves partial writes
/// behind.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed input, rejected before any transaction opened.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A client/product/category/supplier id did not resolve.
    #[error("{entity} not found: {id}")]
    ReferenceNotFound { entity: EntityKind, id: i64 },

    /// A delete was blocked because dependent rows exist.
    #[error("cannot delete {entity} {id}: {dependents} dependent row(s)")]
    ReferentialConflict {
        entity: EntityKind,
        id: i64,
        dependents: i64,
    },

    /// A line asked for more units than the product had at commit time.
    #[error("insufficient stock for {product_name} (#{product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// The store failed; the unit of work was rolled back.
    #[error("persistence failure: {0}")]
    Persistence(#[from] DbError),
}

impl LedgerError {
    /// Stable machine-readable code for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "validation",
            LedgerError::ReferenceNotFound { .. } => "reference_not_found",
            LedgerError::ReferentialConflict { .. } => "referential_conflict",
            LedgerError::InsufficientStock { .. } => "insufficient_stock",
            LedgerError::Persistence(_) => "persistence",
        }
    }

    pub(crate) fn not_found(entity: EntityKind, id: i64) -> Self {
        LedgerError::ReferenceNotFound { entity, id }
    }

    /// Replaces a bare unique violation with the field and value the
    /// caller submitted.
    pub(crate) fn duplicate_on(err: sqlx::Error, field: &str, value: &str) -> Self {
        match DbError::from(err) {
            DbError::UniqueViolation { .. } => LedgerError::Validation(ValidationError::Duplicate {
                field: field.to_string(),
                value: value.to_string(),
            }),
            other => LedgerError::from(other),
        }
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => LedgerError::Validation(e),
            CoreError::InsufficientStock {
                product_id,
                product_name,
                available,
                requested,
            } => LedgerError::InsufficientStock {
                product_id,
                product_name,
                available,
                requested,
            },
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::from(DbError::from(err))
    }
}

/// Result type for public ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        let err = LedgerError::from(ValidationError::Empty {
            field: "lines".to_string(),
        });
        assert_eq!(err.kind(), "validation");

        let err = LedgerError::not_found(EntityKind::Client, 9);
        assert_eq!(err.kind(), "reference_not_found");
        assert_eq!(err.to_string(), "client not found: 9");

        let err = LedgerError::from(DbError::PoolExhausted);
        assert_eq!(err.kind(), "persistence");
    }

    #[test]
    fn test_core_error_maps_one_to_one() {
        let err: LedgerError = CoreError::InsufficientStock {
            product_id: 3,
            product_name: "Mouse".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock {
                product_id: 3,
                available: 1,
                requested: 2,
                ..
            }
        ));

        let err: LedgerError = CoreError::Validation(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        })
        .into();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_row_not_found_maps_to_db_not_found() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_unique_column_field() {
        assert_eq!(unique_column_field("name_key"), "name");
        assert_eq!(unique_column_field("tax_id"), "tax_id");
    }
}
