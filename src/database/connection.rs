use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::config::{redact_url, AppConfig};
use crate::error::Result;

/// Owner of the application's PostgreSQL pool
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Build a lazily-connecting pool for the configured `default_connection`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let database_url = config.database_url()?;
        let pool_config = &config.database;

        debug!(
            database_url = %redact_url(database_url),
            max_connections = pool_config.max_connections,
            min_connections = pool_config.min_connections,
            acquire_timeout = pool_config.acquire_timeout_seconds,
            "Creating database pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(pool_config.max_connections)
            .min_connections(pool_config.min_connections)
            .acquire_timeout(pool_config.acquire_timeout())
            .idle_timeout(pool_config.idle_timeout())
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> std::result::Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 AS health")
            .fetch_one(&self.pool)
            .await?;

        let health: i32 = row.get("health");
        Ok(health == 1)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
