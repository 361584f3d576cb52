//! # laneway-db
//!
//! PostgreSQL persistence layer for laneway.
//!
//! This crate implements the `laneway-core` store contracts over Postgres:
//!
//! - [`PgLedgerStore`]: transactional commits of position deltas with their
//!   change records and notifications
//! - [`PgBoardStore`]: board/queue bootstrap and snapshot reads
//! - [`PgActivityLog`]: change history feeds
//! - [`PgNotificationStore`]: the notification lifecycle
//!
//! The [`Database`] aggregate wires all of them onto one shared pool.

pub mod activity;
pub mod boards;
pub mod ledger;
pub mod notifications;
pub mod pool;
pub mod test_fixtures;

pub use activity::PgActivityLog;
pub use boards::PgBoardStore;
pub use ledger::PgLedgerStore;
pub use notifications::PgNotificationStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

use sqlx::PgPool;

use laneway_core::Result;

/// Aggregated database access: every repository on one shared pool.
pub struct Database {
    pub boards: PgBoardStore,
    pub ledger: PgLedgerStore,
    pub activity: PgActivityLog,
    pub notifications: PgNotificationStore,
    pool: PgPool,
}

impl Database {
    /// Build the repository set on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            boards: PgBoardStore::new(pool.clone()),
            ledger: PgLedgerStore::new(pool.clone()),
            activity: PgActivityLog::new(pool.clone()),
            notifications: PgNotificationStore::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = pool::create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with explicit pool configuration.
    pub async fn connect_with_config(database_url: &str, config: &PoolConfig) -> Result<Self> {
        let pool = pool::create_pool_with_config(database_url, config).await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool, for health checks and metrics.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the workspace `migrations/` directory.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        use tracing::info;

        info!(
            subsystem = "db",
            op = "migrate",
            "Running database migrations"
        );
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| laneway_core::Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        info!(subsystem = "db", op = "migrate", "Migrations complete");
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
