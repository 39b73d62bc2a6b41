//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Startup                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::from_env() / DbConfig::new(path) ← Configure pool settings  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  register_sale ──► Conn1 ── BEGIN IMMEDIATE (holds write lock)         │
//! │  register_sale ──► Conn2 ── BEGIN IMMEDIATE (waits ≤ busy_timeout)     │
//! │  list_invoices ──► Conn3 ── plain read (WAL: never blocked)            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled so readers never block
//! the single writer and the writer never blocks readers.
//!
//! ## Foreign Keys
//! Foreign-key enforcement stays off and the schema declares none. Links
//! between master data and invoices are checked by the guard and the sale
//! coordinator.
//!
//! ## In-Memory Databases
//! An in-memory database lives exactly as long as its last open connection.
//! `Database` names it with a process-unique shared-cache URI and holds one
//! extra connection outside the pool, so a pooled connection that is closed
//! (for example by a unit of work dropped while open) loses nothing.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{ConnectOptions, SqliteConnection, SqlitePool};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::guard::ReferentialGuard;
use crate::migrations;
use crate::query::InvoiceQueries;
use crate::repository::category::CategoryRepository;
use crate::repository::client::ClientRepository;
use crate::repository::product::ProductRepository;
use crate::repository::supplier::SupplierRepository;
use crate::sale::SaleCoordinator;
use crate::unit_of_work::UnitOfWork;

// =============================================================================
// Configuration
// =============================================================================

/// Environment variable overriding the database path.
pub const ENV_DB_PATH: &str = "TALLY_DB_PATH";
/// Environment variable overriding the pool size.
pub const ENV_MAX_CONNECTIONS: &str = "TALLY_DB_MAX_CONNECTIONS";
/// Environment variable overriding the lock wait, in milliseconds.
pub const ENV_BUSY_TIMEOUT_MS: &str = "TALLY_DB_BUSY_TIMEOUT_MS";

/// Database file used when nothing else is configured.
pub const DEFAULT_DB_PATH: &str = "data/inventario.db";

/// Distinguishes in-memory databases opened by the same process.
static MEMORY_DB_SEQ: AtomicU64 = AtomicU64::new(0);

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/ledger.db")
///     .max_connections(5)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Timeout for acquiring a pooled connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long a writer waits for another writer's lock before failing.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Builds a configuration from `TALLY_DB_*` environment variables.
    ///
    /// | Variable                   | Default               |
    /// |----------------------------|-----------------------|
    /// | `TALLY_DB_PATH`            | `data/inventario.db`  |
    /// | `TALLY_DB_MAX_CONNECTIONS` | `5`                   |
    /// | `TALLY_DB_BUSY_TIMEOUT_MS` | `5000`                |
    ///
    /// Unparseable numbers fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = lookup(ENV_DB_PATH)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let mut config = DbConfig::new(path);

        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => warn!(
                    var = ENV_MAX_CONNECTIONS,
                    value = %raw,
                    default = config.max_connections,
                    "Invalid value, using default"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.busy_timeout = Duration::from_millis(ms),
                Err(_) => warn!(
                    var = ENV_BUSY_TIMEOUT_MS,
                    value = %raw,
                    default_ms = config.busy_timeout.as_millis() as u64,
                    "Invalid value, using default"
                ),
            }
        }

        config
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets how long a writer waits on a held lock.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Each `Database` built from this config gets its own named in-memory
    /// database. The pool keeps a single connection, since shared-cache
    /// table locks are not covered by the busy timeout. Tests of concurrent
    /// writers use a file in a temp directory instead.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig::new(DEFAULT_DB_PATH)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository and service access.
///
/// Cloning is cheap: every clone shares the same pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::from_env()).await?;
///
/// let invoice_id = db.sales().register_sale(client_id, &lines).await?;
/// for row in &db.invoices().invoice_detail(invoice_id).await? {
///     println!("{} x {}", row.quantity, row.product_name);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
    /// Keeps an in-memory database alive; `None` for files.
    _keeper: Option<MemoryKeeper>,
}

/// A connection held open for the lifetime of an in-memory database.
#[derive(Clone)]
struct MemoryKeeper(Arc<Mutex<SqliteConnection>>);

impl fmt::Debug for MemoryKeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MemoryKeeper")
    }
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file (and parent directory) if missing
    /// 2. Configures SQLite: WAL, NORMAL synchronous, busy timeout,
    ///    foreign keys off
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let base = if config.is_in_memory() {
            let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);
            SqliteConnectOptions::from_str(&format!(
                "sqlite:file:tally-memory-{seq}?mode=memory&cache=shared"
            ))
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            if let Some(parent) = config.database_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DbError::ConnectionFailed(format!(
                            "cannot create {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
        };

        let connect_options = base
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout)
            .foreign_keys(false);

        debug!(
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Connection options configured"
        );

        let keeper = if config.is_in_memory() {
            let conn = connect_options
                .clone()
                .connect()
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
            debug!("In-memory keeper connection opened");
            Some(MemoryKeeper(Arc::new(Mutex::new(conn))))
        } else {
            None
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            _keeper: keeper,
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Opens an immediate-mode unit of work.
    pub async fn begin(&self, label: &'static str) -> DbResult<UnitOfWork> {
        UnitOfWork::begin(&self.pool, label).await
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the referential guard (deletable sets and guarded deletes).
    pub fn guard(&self) -> ReferentialGuard {
        ReferentialGuard::new(self.pool.clone())
    }

    /// Returns the sale coordinator.
    pub fn sales(&self) -> SaleCoordinator {
        SaleCoordinator::new(self.pool.clone())
    }

    /// Returns the read-only invoice queries.
    pub fn invoices(&self) -> InvoiceQueries {
        InvoiceQueries::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_in_memory_survives_dropped_unit_of_work() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.categories()
            .insert(&tally_core::NewCategory {
                name: "Sonido".to_string(),
            })
            .await
            .unwrap();

        {
            let mut uow = db.begin("abandoned").await.unwrap();
            sqlx::query("INSERT INTO categories (name, name_key) VALUES ('Redes', 'redes')")
                .execute(uow.conn())
                .await
                .unwrap();
        }

        let names: Vec<String> = db
            .categories()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Sonido".to_string()]);

        // The pool still hands out working connections afterwards.
        db.categories()
            .insert(&tally_core::NewCategory {
                name: "Redes".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(db.categories().list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_databases_are_isolated() {
        let a = Database::new(DbConfig::in_memory()).await.unwrap();
        let b = Database::new(DbConfig::in_memory()).await.unwrap();
        a.categories()
            .insert(&tally_core::NewCategory {
                name: "Sonido".to_string(),
            })
            .await
            .unwrap();
        assert!(b.categories().list().await.unwrap().is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_config_from_env_defaults() {
        let config = DbConfig::from_lookup(lookup(&[]));
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_from_env_overrides() {
        let config = DbConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/tally/ledger.db"),
            (ENV_MAX_CONNECTIONS, "8"),
            (ENV_BUSY_TIMEOUT_MS, "1500"),
        ]));
        assert_eq!(config.database_path, PathBuf::from("/var/lib/tally/ledger.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.busy_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_config_from_env_invalid_numbers_fall_back() {
        let config = DbConfig::from_lookup(lookup(&[
            (ENV_MAX_CONNECTIONS, "0"),
            (ENV_BUSY_TIMEOUT_MS, "soon"),
        ]));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
    }
}
