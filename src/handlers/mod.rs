//! HTTP handlers module
//!
//! Routes the owner (`/users/...`), admin (`/admin/...`) and public
//! (`/events...`) surfaces onto the services.

pub mod admin;
pub mod error;
pub mod extractors;
pub mod private;
pub mod public;
pub mod query;

pub use error::ApiError;
pub use extractors::ClientIp;
pub use query::QueryParams;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::services::{ServiceFactory, ServiceHealthStatus};
use crate::utils::errors::Result;
use crate::utils::validation::validate_page;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceFactory>,
}

impl AppState {
    pub fn new(services: ServiceFactory) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}

/// `from` / `size` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub from: Option<i64>,
    pub size: Option<i64>,
}

impl PageParams {
    pub fn resolve(&self) -> Result<(i64, i64)> {
        validate_page(self.from, self.size)
    }
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/admin/events", get(admin::search_events))
        .route("/admin/events/{event_id}", patch(admin::update_event))
        .route(
            "/users/{user_id}/events",
            post(private::create_event).get(private::get_user_events),
        )
        .route(
            "/users/{user_id}/events/{event_id}",
            get(private::get_user_event).patch(private::update_event),
        )
        .route(
            "/users/{user_id}/events/{event_id}/requests",
            get(private::get_event_requests).patch(private::update_request_statuses),
        )
        .route(
            "/users/{user_id}/requests",
            get(private::get_user_requests).post(private::add_request),
        )
        .route("/users/{user_id}/requests/{request_id}/cancel", patch(private::cancel_request))
        .route("/events", get(public::search_events))
        .route("/events/{event_id}", get(public::get_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<ServiceHealthStatus>) {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
