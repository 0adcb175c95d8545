//! Database layer for VOC Atlas
//!
//! Provides:
//! - SeaORM entity models
//! - Repository for catalog data access
//! - Connection pool management
//! - Per-request units of work (transactions)

pub mod models;
mod repository;

pub use repository::{NewDataset, NewSite, Repository, VocLink};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{
    AccessMode, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper.
///
/// Shared behind an `Arc`; connections are not `Clone` when the mock
/// backend is compiled in.
pub struct DbPool {
    /// Primary connection (for writes)
    pub primary: DatabaseConnection,

    /// Read replica connection (optional)
    pub replica: Option<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");

        let primary = Self::connect(&config.url, config)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect to primary: {}", e)
            })?;

        // Connect to replica if configured
        let replica = if let Some(ref read_url) = config.read_url {
            info!("Connecting to read replica...");

            let replica_conn = Self::connect(read_url, config)
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Failed to connect to replica: {}", e)
                })?;

            Some(replica_conn)
        } else {
            None
        };

        info!("Database connections established");

        Ok(Self { primary, replica })
    }

    async fn connect(url: &str, config: &DatabaseConfig) -> std::result::Result<DatabaseConnection, sea_orm::DbErr> {
        let mut opts = ConnectOptions::new(url);
        opts
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(true);

        Database::connect(opts).await
    }

    /// Get the connection for reads (replica if available, otherwise primary)
    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    /// Get the connection for writes (always primary)
    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Apply the embedded schema migrations to the primary database
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Applying database migrations...");

        sqlx::migrate!("./migrations")
            .run(self.primary.get_postgres_connection_pool())
            .await?;

        info!("Database migrations applied");
        Ok(())
    }

    /// Open a read-write unit of work on the primary
    pub async fn unit_of_work(&self) -> Result<UnitOfWork> {
        let txn = self.write().begin().await?;
        Ok(UnitOfWork { txn })
    }

    /// Open a read-only unit of work with a stable snapshot.
    ///
    /// Membership filters scan several tables; repeatable read keeps the
    /// scans consistent with each other.
    pub async fn read_unit_of_work(&self) -> Result<UnitOfWork> {
        let txn = self
            .read()
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await?;
        Ok(UnitOfWork { txn })
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Primary ping failed: {}", e),
            })?;

        if let Some(ref replica) = self.replica {
            replica
                .execute_unprepared("SELECT 1")
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Replica ping failed: {}", e),
                })?;
        }

        Ok(())
    }
}

/// Transaction scoped to a single request.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] rolls it
/// back, so early returns through `?` never leave a transaction open.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork {
    /// Repository bound to this unit of work
    pub fn repository(&self) -> Repository<'_, DatabaseTransaction> {
        Repository::new(&self.txn)
    }

    /// Commit all changes
    pub async fn commit(self) -> Result<()> {
        self.txn.commit().await.map_err(|e| AppError::DatabaseConnection {
            message: format!("Commit failed: {}", e),
        })
    }
}
