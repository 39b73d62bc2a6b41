//! # Client Repository
//!
//! Database operations for clients. Clients are unique by national id.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use tally_core::validation::{validate_id, validate_new_client};
use tally_core::{Client, EntityKind, NewClient};

use crate::error::{DbResult, LedgerError, LedgerResult};

const SELECT_COLUMNS: &str = "SELECT id, name, phone, email, national_id FROM clients";

/// Looks up a client on any executor (pool or unit of work).
pub(crate) async fn find_by_id<'e, E>(executor: E, id: i64) -> DbResult<Option<Client>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
    let client = sqlx::query_as::<_, Client>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(client)
}

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a client and returns the stored row.
    ///
    /// ## Errors
    /// - `Validation` for a name with digits or symbols, a non-numeric
    ///   phone, a malformed email, or a national id outside 6-8 digits
    /// - `Validation(Duplicate)` when the national id is already registered
    pub async fn insert(&self, input: &NewClient) -> LedgerResult<Client> {
        validate_new_client(input)?;
        let row = normalized(0, input);

        debug!(national_id = %row.national_id, "Inserting client");

        let result = sqlx::query(
            "INSERT INTO clients (name, phone, email, national_id) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&row.name)
        .bind(&row.phone)
        .bind(&row.email)
        .bind(&row.national_id)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::duplicate_on(e, "national_id", &row.national_id))?;

        Ok(Client {
            id: result.last_insert_rowid(),
            ..row
        })
    }

    /// Replaces every field of a client.
    ///
    /// Past invoices keep the name, email and national id they were
    /// issued with.
    pub async fn update(&self, id: i64, input: &NewClient) -> LedgerResult<Client> {
        validate_id("id", id)?;
        validate_new_client(input)?;
        let row = normalized(id, input);

        debug!(id, "Updating client");

        let result = sqlx::query(
            "UPDATE clients SET name = ?1, phone = ?2, email = ?3, national_id = ?4 WHERE id = ?5",
        )
        .bind(&row.name)
        .bind(&row.phone)
        .bind(&row.email)
        .bind(&row.national_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::duplicate_on(e, "national_id", &row.national_id))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::not_found(EntityKind::Client, id));
        }

        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> LedgerResult<Option<Client>> {
        Ok(find_by_id(&self.pool, id).await?)
    }

    /// Lists all clients ordered by id.
    pub async fn list(&self) -> LedgerResult<Vec<Client>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id");
        let clients = sqlx::query_as::<_, Client>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = clients.len(), "Listed clients");
        Ok(clients)
    }
}

fn normalized(id: i64, input: &NewClient) -> Client {
    Client {
        id,
        name: input.name.trim().to_string(),
        phone: input.phone.trim().to_string(),
        email: input.email.trim().to_string(),
        national_id: input.national_id.trim().to_string(),
    }
}
