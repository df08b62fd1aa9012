//! Connection pool and table management.

use crate::error::Result;
use crate::schema;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use trxql_config::DatabaseConfig;

/// Main database handle.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

fn pool_options(cfg: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
}

impl Database {
    /// Connect and verify the server is reachable.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self> {
        let pool = pool_options(cfg).connect(&cfg.url).await?;
        tracing::info!(max_connections = cfg.max_connections, "database pool ready");
        Ok(Self { pool })
    }

    /// Build a pool that opens connections on first use.
    pub fn connect_lazy(cfg: &DatabaseConfig) -> Result<Self> {
        let pool = pool_options(cfg).connect_lazy(&cfg.url)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `transaction` table and its indexes if they don't exist.
    pub async fn initialize(&self) -> Result<()> {
        for stmt in schema::SCHEMA_STATEMENTS {
            sqlx::query(*stmt).execute(&self.pool).await?;
        }
        tracing::info!(table = trxql_common::TRANSACTION_TABLE, "schema initialized");
        Ok(())
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
