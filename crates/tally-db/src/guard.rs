//! # Referential Guard
//!
//! Decides which categories, suppliers and clients can be deleted, and
//! performs those deletes.
//!
//! ## Dependency Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   entity      table        dependent table   foreign-key column        │
//! │   ─────────   ──────────   ───────────────   ──────────────────        │
//! │   category    categories   products          category_id               │
//! │   supplier    suppliers    products          supplier_id               │
//! │   client      clients      invoices          client_id                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The schema has no foreign keys, so these rules are the only thing
//! keeping a product from pointing at a deleted category or an invoice
//! at a deleted client.
//!
//! ## Deletable Sets vs. Deletes
//! ```text
//!  deletable_categories()            delete_category(id)
//!  ───────────────────────           ─────────────────────────────────────
//!  read snapshot:                    BEGIN IMMEDIATE
//!   all rows                          ├── row exists?    no ─► ReferenceNotFound
//!   minus DISTINCT category_id        ├── dependents?    >0 ─► ReferentialConflict
//!   in products                       └── DELETE
//!                                    COMMIT
//!  may be stale a moment later       rechecked under the write lock
//! ```
//!
//! A caller may show the deletable set, let the user pick, and call the
//! delete later: if a product was attached in between, the delete fails
//! with `ReferentialConflict` and nothing is removed.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use tally_core::validation::validate_id;
use tally_core::{Category, Client, EntityKind, Supplier};

use crate::error::{LedgerError, LedgerResult};
use crate::unit_of_work::UnitOfWork;

// =============================================================================
// Dependency Rules
// =============================================================================

/// How one master-data table is referenced by a dependent table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRule {
    pub entity: EntityKind,
    pub table: &'static str,
    pub columns: &'static str,
    pub dependent_table: &'static str,
    pub dependent_column: &'static str,
    /// Unit-of-work label used in logs.
    pub delete_label: &'static str,
}

pub const CATEGORY_RULE: DependencyRule = DependencyRule {
    entity: EntityKind::Category,
    table: "categories",
    columns: "id, name",
    dependent_table: "products",
    dependent_column: "category_id",
    delete_label: "delete_category",
};

pub const SUPPLIER_RULE: DependencyRule = DependencyRule {
    entity: EntityKind::Supplier,
    table: "suppliers",
    columns: "id, name, phone, email, tax_id",
    dependent_table: "products",
    dependent_column: "supplier_id",
    delete_label: "delete_supplier",
};

pub const CLIENT_RULE: DependencyRule = DependencyRule {
    entity: EntityKind::Client,
    table: "clients",
    columns: "id, name, phone, email, national_id",
    dependent_table: "invoices",
    dependent_column: "client_id",
    delete_label: "delete_client",
};

impl DependencyRule {
    /// The rule protecting `kind`, if any. Products and invoices have none.
    pub fn for_entity(kind: EntityKind) -> Option<&'static DependencyRule> {
        match kind {
            EntityKind::Category => Some(&CATEGORY_RULE),
            EntityKind::Supplier => Some(&SUPPLIER_RULE),
            EntityKind::Client => Some(&CLIENT_RULE),
            EntityKind::Product | EntityKind::Invoice => None,
        }
    }

    fn select_all_sql(&self) -> String {
        format!("SELECT {} FROM {} ORDER BY id", self.columns, self.table)
    }

    fn referenced_ids_sql(&self) -> String {
        format!(
            "SELECT DISTINCT {col} FROM {dep} WHERE {col} IS NOT NULL",
            col = self.dependent_column,
            dep = self.dependent_table
        )
    }

    fn exists_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {} WHERE id = ?1", self.table)
    }

    fn dependents_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            self.dependent_table, self.dependent_column
        )
    }

    fn delete_sql(&self) -> String {
        format!("DELETE FROM {} WHERE id = ?1", self.table)
    }
}

/// A master-data row protected by a dependency rule.
pub trait Guarded: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const RULE: DependencyRule;

    fn id(&self) -> i64;
}

impl Guarded for Category {
    const RULE: DependencyRule = CATEGORY_RULE;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Guarded for Supplier {
    const RULE: DependencyRule = SUPPLIER_RULE;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Guarded for Client {
    const RULE: DependencyRule = CLIENT_RULE;

    fn id(&self) -> i64 {
        self.id
    }
}

// =============================================================================
// Referential Guard
// =============================================================================

/// Deletable-set computation and guarded deletes.
#[derive(Debug, Clone)]
pub struct ReferentialGuard {
    pool: SqlitePool,
}

impl ReferentialGuard {
    pub fn new(pool: SqlitePool) -> Self {
        ReferentialGuard { pool }
    }

    /// Categories no product references.
    pub async fn deletable_categories(&self) -> LedgerResult<Vec<Category>> {
        self.deletable::<Category>().await
    }

    /// Suppliers no product references.
    pub async fn deletable_suppliers(&self) -> LedgerResult<Vec<Supplier>> {
        self.deletable::<Supplier>().await
    }

    /// Clients no invoice references.
    pub async fn deletable_clients(&self) -> LedgerResult<Vec<Client>> {
        self.deletable::<Client>().await
    }

    pub async fn delete_category(&self, id: i64) -> LedgerResult<()> {
        self.delete::<Category>(id).await
    }

    pub async fn delete_supplier(&self, id: i64) -> LedgerResult<()> {
        self.delete::<Supplier>(id).await
    }

    pub async fn delete_client(&self, id: i64) -> LedgerResult<()> {
        self.delete::<Client>(id).await
    }

    /// Number of rows that reference `id` under the rule for `kind`.
    ///
    /// Always 0 for kinds nothing depends on (products, invoices).
    pub async fn dependent_count(&self, kind: EntityKind, id: i64) -> LedgerResult<i64> {
        let Some(rule) = DependencyRule::for_entity(kind) else {
            return Ok(0);
        };

        let count: i64 = sqlx::query_scalar(&rule.dependents_sql())
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Whether anything references `id`. A point-in-time answer; the
    /// delete itself rechecks.
    pub async fn has_dependents(&self, kind: EntityKind, id: i64) -> LedgerResult<bool> {
        Ok(self.dependent_count(kind, id).await? > 0)
    }

    /// All rows of `T` minus those whose id appears in the dependent table.
    ///
    /// Both reads run in one read transaction so they see the same
    /// snapshot.
    pub async fn deletable<T: Guarded>(&self) -> LedgerResult<Vec<T>> {
        let rule = T::RULE;
        let mut tx = self.pool.begin().await?;

        let rows: Vec<T> = sqlx::query_as::<_, T>(&rule.select_all_sql())
            .fetch_all(&mut *tx)
            .await?;

        let referenced: HashSet<i64> = sqlx::query_scalar::<_, i64>(&rule.referenced_ids_sql())
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();

        tx.commit().await?;

        let total = rows.len();
        let deletable: Vec<T> = rows
            .into_iter()
            .filter(|row| !referenced.contains(&row.id()))
            .collect();

        debug!(
            entity = %rule.entity,
            total,
            deletable = deletable.len(),
            "Computed deletable set"
        );
        Ok(deletable)
    }

    /// Deletes one row of `T` after rechecking, under the write lock, that
    /// it still exists and still has no dependents.
    pub async fn delete<T: Guarded>(&self, id: i64) -> LedgerResult<()> {
        let rule = T::RULE;
        validate_id("id", id)?;

        let mut uow = UnitOfWork::begin(&self.pool, rule.delete_label).await?;
        let outcome = delete_inside(uow.conn(), &rule, id).await;

        match uow.finish(outcome).await {
            Ok(()) => {
                info!(entity = %rule.entity, id, "Deleted");
                Ok(())
            }
            Err(err) => {
                warn!(entity = %rule.entity, id, kind = err.kind(), error = %err, "Delete refused");
                Err(err)
            }
        }
    }
}

async fn delete_inside(conn: &mut SqliteConnection, rule: &DependencyRule, id: i64) -> LedgerResult<()> {
    let exists: i64 = sqlx::query_scalar(&rule.exists_sql())
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    if exists == 0 {
        return Err(LedgerError::not_found(rule.entity, id));
    }

    let dependents: i64 = sqlx::query_scalar(&rule.dependents_sql())
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    if dependents > 0 {
        return Err(LedgerError::ReferentialConflict {
            entity: rule.entity,
            id,
            dependents,
        });
    }

    sqlx::query(&rule.delete_sql())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
