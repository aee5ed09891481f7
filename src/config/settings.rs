//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub stats: StatsConfig,
    pub lifecycle: LifecycleConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Stats (view counter) client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatsConfig {
    pub base_url: String,
    pub app_name: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

/// Lead times enforced by the event lifecycle
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LifecycleConfig {
    /// Minimum distance between now and the event date on creation and date edits
    pub event_lead_time_hours: i64,
    /// Minimum distance between now and the event date at publication
    pub publication_lead_time_hours: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
}

impl StatsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(config::File::with_name("config").required(false))
    }

    /// Load settings from an explicit file, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        Self::load(config::File::from(path.as_ref()).required(true))
    }

    fn load(file: config::File<config::FileSourceFile, config::FileFormat>) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(config::Environment::with_prefix("EVENTHUB").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::EventHubError> {
        super::validation::validate_settings(self)
    }

    /// Socket address string the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/eventhub".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
            },
            stats: StatsConfig {
                base_url: "http://localhost:9090".to_string(),
                app_name: "ewm-main-service".to_string(),
                connect_timeout_ms: 5000,
                read_timeout_ms: 5000,
            },
            lifecycle: LifecycleConfig {
                event_lead_time_hours: 2,
                publication_lead_time_hours: 1,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                file_prefix: "event-hub.log".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.lifecycle.event_lead_time_hours, 2);
        assert_eq!(settings.lifecycle.publication_lead_time_hours, 1);
        assert_eq!(settings.stats.read_timeout(), Duration::from_secs(5));
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eventhub.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
host = "127.0.0.1"
port = 9000

[stats]
base_url = "http://stats:9090"
app_name = "main"
connect_timeout_ms = 1000
read_timeout_ms = 2000
"#
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.stats.base_url, "http://stats:9090");
        assert_eq!(settings.stats.connect_timeout(), Duration::from_secs(1));
        // Untouched sections keep their defaults
        assert_eq!(settings.lifecycle.event_lead_time_hours, 2);
        assert_eq!(settings.logging.level, "info");
    }
}
