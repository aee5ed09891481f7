//! Services module
//!
//! This module contains business logic services

pub mod allocator;
pub mod events;
pub mod lifecycle;
pub mod requests;
pub mod stats;
pub mod views;

// Re-export commonly used services
pub use allocator::{BatchOutcome, RequestAllocator};
pub use events::EventService;
pub use lifecycle::{EventLifecycle, ValidatedUpdate};
pub use requests::RequestService;
pub use stats::{record_hit_in_background, StatsClient, ViewCounter};
pub use views::ViewEnrichment;

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::{health_check, DatabasePool, DatabaseService};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub event_service: EventService,
    pub request_service: RequestService,
    db: DatabaseService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory backed by the HTTP stats client
    pub fn new(settings: &Settings, pool: DatabasePool) -> Result<Self> {
        let counter: Arc<dyn ViewCounter> = Arc::new(StatsClient::new(&settings.stats)?);
        Ok(Self::with_view_counter(settings, pool, counter))
    }

    /// Create a ServiceFactory with a custom view counter
    pub fn with_view_counter(settings: &Settings, pool: DatabasePool, counter: Arc<dyn ViewCounter>) -> Self {
        let db = DatabaseService::new(pool);
        let lifecycle = EventLifecycle::new(&settings.lifecycle);

        Self {
            event_service: EventService::new(db.clone(), lifecycle, counter, settings.stats.app_name.clone()),
            request_service: RequestService::new(db.clone()),
            db,
        }
    }

    /// Health check for the services' backing store
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = health_check(self.db.pool()).await.is_ok();

        ServiceHealthStatus { database_healthy }
    }
}

/// Health status for all services
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }
}
