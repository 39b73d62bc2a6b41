//! # Unit of Work
//!
//! Scoped write transactions with rollback on every exit path.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  UnitOfWork::begin(pool) ── acquire conn ── BEGIN IMMEDIATE             │
//! │       │                                     (takes the write lock now)  │
//! │       ▼                                                                 │
//! │  reads + writes through uow.conn()                                      │
//! │       │                                                                 │
//! │       ├── Ok  ──► uow.finish(Ok(v))  ──► COMMIT   ──► conn back to pool │
//! │       ├── Err ──► uow.finish(Err(e)) ──► ROLLBACK ──► conn back to pool │
//! │       └── dropped while open (early `?`, panic, cancelled future)       │
//! │                 ──► conn closed instead of pooled ──► SQLite rolls back │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! A deferred SQLite transaction only takes the write lock at its first
//! write, so two sales could both read `stock = 5` before either writes.
//! `BEGIN IMMEDIATE` takes the lock up front: the second writer waits
//! (bounded by the busy timeout) and then reads the first writer's result.
//!
//! Every statement that belongs to the unit must run on `uow.conn()`.
//! Reading through the pool instead would see pre-transaction state and,
//! on a single-connection pool, wait forever.

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult, LedgerResult};

/// An open `BEGIN IMMEDIATE` transaction on a pooled connection.
pub struct UnitOfWork {
    conn: PoolConnection<Sqlite>,
    label: &'static str,
    open: bool,
}

impl UnitOfWork {
    /// Acquires a connection and opens an immediate transaction.
    ///
    /// `label` names the operation in logs.
    pub async fn begin(pool: &SqlitePool, label: &'static str) -> DbResult<Self> {
        let mut conn = pool.acquire().await?;

        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::TransactionFailed(format!("begin {label}: {e}")))?;

        debug!(unit = label, "Unit of work started");

        Ok(UnitOfWork {
            conn,
            label,
            open: true,
        })
    }

    /// The connection every statement of this unit must use.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Commits the transaction.
    ///
    /// If COMMIT itself fails the unit is dropped open, which discards it.
    pub async fn commit(mut self) -> DbResult<()> {
        sqlx::query("COMMIT")
            .execute(&mut *self.conn)
            .await
            .map_err(|e| DbError::TransactionFailed(format!("commit {}: {e}", self.label)))?;

        self.open = false;
        debug!(unit = self.label, "Unit of work committed");
        Ok(())
    }

    /// Rolls the transaction back.
    pub async fn rollback(mut self) -> DbResult<()> {
        sqlx::query("ROLLBACK")
            .execute(&mut *self.conn)
            .await
            .map_err(|e| DbError::TransactionFailed(format!("rollback {}: {e}", self.label)))?;

        self.open = false;
        debug!(unit = self.label, "Unit of work rolled back");
        Ok(())
    }

    /// Commits on `Ok`, rolls back on `Err`, and hands the outcome back.
    ///
    /// ```rust,ignore
    /// let mut uow = UnitOfWork::begin(&pool, "delete_category").await?;
    /// let outcome = delete_inside(&mut uow, id).await;
    /// uow.finish(outcome).await
    /// ```
    pub async fn finish<T>(self, outcome: LedgerResult<T>) -> LedgerResult<T> {
        match outcome {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let label = self.label;
                if let Err(rollback_err) = self.rollback().await {
                    // The connection is closed on drop, which discards the
                    // transaction anyway. Report the original failure.
                    warn!(unit = label, error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.open {
            warn!(
                unit = self.label,
                "Unit of work dropped while open; closing connection to discard it"
            );
            self.conn.close_on_drop();
        }
    }
}
