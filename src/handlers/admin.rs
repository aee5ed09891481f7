//! Admin endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use tracing::info;

use crate::handlers::{ApiError, AppState, QueryParams};
use crate::models::event::{AdminEventFilter, EventFullDto, EventStatus, UpdateEventAdminRequest};
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::parse_optional_timestamp;
use crate::utils::validation::validate_page;

/// Build the filter of `GET /admin/events` from its query parameters
pub fn admin_filter(params: &QueryParams) -> Result<AdminEventFilter> {
    let (from, size) = validate_page(params.parse("from")?, params.parse("size")?)?;
    let range_start = parse_optional_timestamp(params.value("rangeStart").as_deref())?;
    let range_end = parse_optional_timestamp(params.value("rangeEnd").as_deref())?;
    if let (Some(start), Some(end)) = (range_start, range_end) {
        if end < start {
            return Err(EventHubError::validation("rangeEnd must not be before rangeStart"));
        }
    }

    Ok(AdminEventFilter {
        initiators: params.ids("users")?,
        statuses: params.parse_list("states", |raw| {
            raw.parse::<EventStatus>()
                .map_err(|e| EventHubError::validation(format!("Parameter 'states' is invalid: {}", e)))
        })?,
        categories: params.ids("categories")?,
        range_start,
        range_end,
        from,
        size,
    })
}

/// `GET /admin/events`
pub async fn search_events(
    State(state): State<AppState>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> std::result::Result<Json<Vec<EventFullDto>>, ApiError> {
    let Query(pairs) = query?;
    let filter = admin_filter(&QueryParams::new(pairs))?;
    info!(?filter, "Admin event search requested");

    let events = state.services.event_service.search_admin(filter).await?;
    Ok(Json(events))
}

/// `PATCH /admin/events/{event_id}`
pub async fn update_event(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<UpdateEventAdminRequest>, JsonRejection>,
) -> std::result::Result<Json<EventFullDto>, ApiError> {
    let Path(event_id) = path?;
    let Json(body) = payload?;
    info!(event_id, state_action = ?body.state_action, "Admin event update requested");

    let event = state.services.event_service.update_event_by_admin(event_id, body).await?;
    Ok(Json(event))
}
