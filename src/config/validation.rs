//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{EventHubError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_stats_config(&settings.stats)?;
    validate_lifecycle_config(&settings.lifecycle)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(EventHubError::Config(
            "Server host is required".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(EventHubError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(EventHubError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(EventHubError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate stats client configuration
fn validate_stats_config(config: &super::StatsConfig) -> Result<()> {
    if config.base_url.is_empty() {
        return Err(EventHubError::Config(
            "Stats base URL is required".to_string()
        ));
    }

    url::Url::parse(&config.base_url).map_err(|e| {
        EventHubError::Config(format!("Invalid stats base URL {}: {}", config.base_url, e))
    })?;

    if config.app_name.is_empty() {
        return Err(EventHubError::Config(
            "Stats app name is required".to_string()
        ));
    }

    if config.connect_timeout_ms == 0 || config.read_timeout_ms == 0 {
        return Err(EventHubError::Config(
            "Stats timeouts must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate lifecycle lead times
fn validate_lifecycle_config(config: &super::LifecycleConfig) -> Result<()> {
    if config.event_lead_time_hours < 0 || config.publication_lead_time_hours < 0 {
        return Err(EventHubError::Config(
            "Lead times cannot be negative".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(EventHubError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(EventHubError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
