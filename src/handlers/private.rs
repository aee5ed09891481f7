//! Owner and requester endpoints under `/users/{user_id}`

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::handlers::{ApiError, AppState, PageParams};
use crate::models::event::{EventFullDto, EventShortDto, NewEventDto, UpdateEventUserRequest};
use crate::models::request::{EventRequestStatusUpdateRequest, EventRequestStatusUpdateResult, ParticipationRequestDto};

type HandlerResult<T> = std::result::Result<T, ApiError>;

/// Query of `POST /users/{user_id}/requests`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequestQuery {
    pub event_id: i64,
}

/// `POST /users/{user_id}/events`
pub async fn create_event(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewEventDto>, JsonRejection>,
) -> HandlerResult<(StatusCode, Json<EventFullDto>)> {
    let Path(user_id) = path?;
    let Json(dto) = payload?;
    info!(user_id, title = %dto.title, "Event creation requested");

    let event = state.services.event_service.create_event(user_id, dto).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /users/{user_id}/events`
pub async fn get_user_events(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<PageParams>, QueryRejection>,
) -> HandlerResult<Json<Vec<EventShortDto>>> {
    let Path(user_id) = path?;
    let Query(page) = query?;
    let (from, size) = page.resolve()?;

    let events = state.services.event_service.get_user_events(user_id, from, size).await?;
    Ok(Json(events))
}

/// `GET /users/{user_id}/events/{event_id}`
pub async fn get_user_event(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> HandlerResult<Json<EventFullDto>> {
    let Path((user_id, event_id)) = path?;
    let event = state.services.event_service.get_user_event(user_id, event_id).await?;
    Ok(Json(event))
}

/// `PATCH /users/{user_id}/events/{event_id}`
pub async fn update_event(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<UpdateEventUserRequest>, JsonRejection>,
) -> HandlerResult<Json<EventFullDto>> {
    let Path((user_id, event_id)) = path?;
    let Json(body) = payload?;
    info!(user_id, event_id, state_action = ?body.state_action, "Owner event update requested");

    let event = state.services.event_service.update_event_by_owner(user_id, event_id, body).await?;
    Ok(Json(event))
}

/// `GET /users/{user_id}/events/{event_id}/requests`
pub async fn get_event_requests(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> HandlerResult<Json<Vec<ParticipationRequestDto>>> {
    let Path((user_id, event_id)) = path?;
    let requests = state.services.request_service.get_event_requests(user_id, event_id).await?;
    Ok(Json(requests))
}

/// `PATCH /users/{user_id}/events/{event_id}/requests`
pub async fn update_request_statuses(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<EventRequestStatusUpdateRequest>, JsonRejection>,
) -> HandlerResult<Json<EventRequestStatusUpdateResult>> {
    let Path((user_id, event_id)) = path?;
    let Json(body) = payload?;
    info!(user_id, event_id, ids = ?body.request_ids, status = ?body.status, "Bulk request update requested");

    let result = state
        .services
        .request_service
        .update_request_statuses(user_id, event_id, body)
        .await?;
    Ok(Json(result))
}

/// `GET /users/{user_id}/requests`
pub async fn get_user_requests(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResult<Json<Vec<ParticipationRequestDto>>> {
    let Path(user_id) = path?;
    let requests = state.services.request_service.get_user_requests(user_id).await?;
    Ok(Json(requests))
}

/// `POST /users/{user_id}/requests?eventId={event_id}`
pub async fn add_request(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<AddRequestQuery>, QueryRejection>,
) -> HandlerResult<(StatusCode, Json<ParticipationRequestDto>)> {
    let Path(user_id) = path?;
    let Query(AddRequestQuery { event_id }) = query?;
    info!(user_id, event_id, "Participation request submitted");

    let request = state.services.request_service.add_request(user_id, event_id).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `PATCH /users/{user_id}/requests/{request_id}/cancel`
pub async fn cancel_request(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> HandlerResult<Json<ParticipationRequestDto>> {
    let Path((user_id, request_id)) = path?;
    info!(user_id, request_id, "Participation request cancellation");

    let request = state.services.request_service.cancel_request(user_id, request_id).await?;
    Ok(Json(request))
}
