//! EventHub
//!
//! Main application entry point

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{error, info};

use event_hub::{
    config::Settings,
    database::{create_pool, run_migrations},
    handlers::{create_router, AppState},
    services::ServiceFactory,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = match std::env::var("EVENTHUB_CONFIG") {
        Ok(path) => Settings::from_file(&path).with_context(|| format!("Failed to load config from {}", path))?,
        Err(_) => Settings::new().context("Failed to load configuration")?,
    };
    settings.validate().context("Invalid configuration")?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", event_hub::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&settings.database).await.context("Failed to connect to database")?;

    // Run database migrations
    run_migrations(&db_pool).await?;

    // Initialize services
    info!(stats_url = %settings.stats.base_url, "Initializing services...");
    let services = ServiceFactory::new(&settings, db_pool)?;
    let app = create_router(AppState::new(services));

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!(address = %address, "EventHub is listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("EventHub has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
