//! Public read endpoints

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use tracing::info;

use crate::handlers::{ApiError, AppState, ClientIp, QueryParams};
use crate::models::event::{EventFullDto, EventShortDto, EventSort, PublicEventFilter};
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::{now_seconds, parse_optional_timestamp};
use crate::utils::validation::validate_page;

/// Build the filter of `GET /events`; without a range start the search begins now
pub fn public_filter(params: &QueryParams) -> Result<PublicEventFilter> {
    let (from, size) = validate_page(params.parse("from")?, params.parse("size")?)?;
    let range_start = parse_optional_timestamp(params.value("rangeStart").as_deref())?.unwrap_or_else(now_seconds);
    let range_end = parse_optional_timestamp(params.value("rangeEnd").as_deref())?;
    if matches!(range_end, Some(end) if end < range_start) {
        return Err(EventHubError::validation("rangeEnd must not be before rangeStart"));
    }

    let sort = match params.value("sort").as_deref() {
        None => EventSort::default(),
        Some("EVENT_DATE") => EventSort::EventDate,
        Some("VIEWS") => EventSort::Views,
        Some(other) => return Err(EventHubError::validation(format!("Parameter 'sort' is invalid: {}", other))),
    };

    Ok(PublicEventFilter {
        text: params.value("text"),
        categories: params.ids("categories")?,
        paid: params.parse("paid")?,
        range_start,
        range_end,
        only_available: params.parse("onlyAvailable")?.unwrap_or(false),
        sort,
        from,
        size,
    })
}

/// `GET /events`
pub async fn search_events(
    State(state): State<AppState>,
    client_ip: ClientIp,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> std::result::Result<Json<Vec<EventShortDto>>, ApiError> {
    let Query(pairs) = query?;
    let filter = public_filter(&QueryParams::new(pairs))?;
    info!(ip = %client_ip.0, text = ?filter.text, sort = ?filter.sort, "Public event search");

    let events = state.services.event_service.search_public(filter, &client_ip.0).await?;
    Ok(Json(events))
}

/// `GET /events/{event_id}`
pub async fn get_event(
    State(state): State<AppState>,
    client_ip: ClientIp,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> std::result::Result<Json<EventFullDto>, ApiError> {
    let Path(event_id) = path?;
    info!(event_id, ip = %client_ip.0, "Public event read");

    let event = state.services.event_service.get_published_event(event_id, &client_ip.0).await?;
    Ok(Json(event))
}
