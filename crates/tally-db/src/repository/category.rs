//! # Category Repository
//!
//! Database operations for categories.
//!
//! Names are unique under case and accent folding: "Periféricos" and
//! "PERIFERICOS" collide on `name_key` while the first one entered keeps
//! its casing in `name`.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use tally_core::text::name_key;
use tally_core::validation::{validate_id, validate_new_category};
use tally_core::{Category, EntityKind, NewCategory};

use crate::error::{DbResult, LedgerError, LedgerResult};

/// Looks up a category on any executor (pool or unit of work).
pub(crate) async fn find_by_id<'e, E>(executor: E, id: i64) -> DbResult<Option<Category>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let category = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?1")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(category)
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a category and returns the stored row.
    ///
    /// ## Errors
    /// - `Validation(Required)` for a blank name
    /// - `Validation(Duplicate)` when the folded name already exists
    pub async fn insert(&self, input: &NewCategory) -> LedgerResult<Category> {
        validate_new_category(input)?;
        let name = input.name.trim();

        debug!(name = %name, "Inserting category");

        let result = sqlx::query("INSERT INTO categories (name, name_key) VALUES (?1, ?2)")
            .bind(name)
            .bind(name_key(name))
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::duplicate_on(e, "name", name))?;

        Ok(Category {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    /// Renames a category.
    pub async fn update(&self, id: i64, input: &NewCategory) -> LedgerResult<Category> {
        validate_id("id", id)?;
        validate_new_category(input)?;
        let name = input.name.trim();

        debug!(id, name = %name, "Updating category");

        let result = sqlx::query("UPDATE categories SET name = ?1, name_key = ?2 WHERE id = ?3")
            .bind(name)
            .bind(name_key(name))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::duplicate_on(e, "name", name))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::not_found(EntityKind::Category, id));
        }

        Ok(Category {
            id,
            name: name.to_string(),
        })
    }

    pub async fn get_by_id(&self, id: i64) -> LedgerResult<Option<Category>> {
        Ok(find_by_id(&self.pool, id).await?)
    }

    /// Lists all categories ordered by id.
    pub async fn list(&self) -> LedgerResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }
}
