//! EventHub
//!
//! Event moderation and participation service. Organizers create events,
//! administrators publish or reject them, users request participation and
//! organizers confirm or reject requests within the event's capacity. View
//! counts come from an external stats service on a best-effort basis.

pub mod config;
pub mod database;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{EventHubError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use handlers::{create_router, AppState};
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
