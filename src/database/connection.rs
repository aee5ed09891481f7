//! Database connection management

use sqlx::{Pool, Postgres};
use std::time::{Duration, Instant};
use crate::config::DatabaseConfig;
use crate::utils::errors::EventHubError;
use crate::utils::logging::log_database_operation;

pub type DatabasePool = Pool<Postgres>;

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, EventHubError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .connect(&config.url)
        .await?;

    // Test the connection
    health_check(&pool).await?;

    tracing::info!(max_connections = config.max_connections, "Database connection pool created successfully");
    Ok(pool)
}

/// Create a pool that connects on first use
pub fn create_lazy_pool(config: &DatabaseConfig) -> Result<DatabasePool, EventHubError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .connect_lazy(&config.url)?;

    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), EventHubError> {
    tracing::info!("Running database migrations...");
    let started = Instant::now();

    let result = sqlx::migrate!("./migrations").run(pool).await;
    log_database_operation("migrate", "_sqlx_migrations", started.elapsed().as_millis() as u64, result.is_ok());
    result?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &DatabasePool) -> Result<(), EventHubError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await?;

    Ok(())
}
