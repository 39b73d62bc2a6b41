//! # Supplier Repository
//!
//! Database operations for suppliers. Suppliers are unique by tax id.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use tally_core::validation::{validate_id, validate_new_supplier};
use tally_core::{EntityKind, NewSupplier, Supplier};

use crate::error::{DbResult, LedgerError, LedgerResult};

const SELECT_COLUMNS: &str = "SELECT id, name, phone, email, tax_id FROM suppliers";

/// Looks up a supplier on any executor (pool or unit of work).
pub(crate) async fn find_by_id<'e, E>(executor: E, id: i64) -> DbResult<Option<Supplier>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
    let supplier = sqlx::query_as::<_, Supplier>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(supplier)
}

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Inserts a supplier and returns the stored row.
    ///
    /// ## Errors
    /// - `Validation` for a blank name, non-numeric phone, malformed email
    ///   or a tax id that is not 11 digits
    /// - `Validation(Duplicate)` when the tax id is already registered
    pub async fn insert(&self, input: &NewSupplier) -> LedgerResult<Supplier> {
        validate_new_supplier(input)?;
        let row = normalized(0, input);

        debug!(tax_id = %row.tax_id, "Inserting supplier");

        let result = sqlx::query(
            "INSERT INTO suppliers (name, phone, email, tax_id) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&row.name)
        .bind(&row.phone)
        .bind(&row.email)
        .bind(&row.tax_id)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::duplicate_on(e, "tax_id", &row.tax_id))?;

        Ok(Supplier {
            id: result.last_insert_rowid(),
            ..row
        })
    }

    /// Replaces every field of a supplier.
    pub async fn update(&self, id: i64, input: &NewSupplier) -> LedgerResult<Supplier> {
        validate_id("id", id)?;
        validate_new_supplier(input)?;
        let row = normalized(id, input);

        debug!(id, "Updating supplier");

        let result = sqlx::query(
            "UPDATE suppliers SET name = ?1, phone = ?2, email = ?3, tax_id = ?4 WHERE id = ?5",
        )
        .bind(&row.name)
        .bind(&row.phone)
        .bind(&row.email)
        .bind(&row.tax_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::duplicate_on(e, "tax_id", &row.tax_id))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::not_found(EntityKind::Supplier, id));
        }

        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> LedgerResult<Option<Supplier>> {
        Ok(find_by_id(&self.pool, id).await?)
    }

    /// Lists all suppliers ordered by id.
    pub async fn list(&self) -> LedgerResult<Vec<Supplier>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = suppliers.len(), "Listed suppliers");
        Ok(suppliers)
    }
}

fn normalized(id: i64, input: &NewSupplier) -> Supplier {
    Supplier {
        id,
        name: input.name.trim().to_string(),
        phone: input.phone.trim().to_string(),
        email: input.email.trim().to_string(),
        tax_id: input.tax_id.trim().to_string(),
    }
}
