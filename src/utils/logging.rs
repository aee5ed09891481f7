//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the EventHub application.

use tracing::{info, warn, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{EventHubError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| EventHubError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log event lifecycle actions
pub fn log_event_action(event_id: i64, action: &str, user_id: i64, details: Option<&str>) {
    info!(
        event_id = event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}

/// Log admin moderation actions
pub fn log_admin_action(action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log participation request actions
pub fn log_request_action(request_id: i64, event_id: i64, action: &str, status: &str) {
    info!(
        request_id = request_id,
        event_id = event_id,
        action = action,
        status = status,
        "Participation request action performed"
    );
}

/// Log a degraded stats call; the caller carries on with defaults
pub fn log_stats_failure(operation: &str, error: &str, context: Option<&str>) {
    warn!(
        operation = operation,
        error = error,
        context = context,
        "Stats service call failed, using defaults"
    );
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        warn!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}
