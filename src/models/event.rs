//! Event model
//!
//! Besides the persisted [`Event`] row this module owns the event state
//! machine: [`EventStatus`] and [`StateAction`] with an explicit transition
//! table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::helpers::{date_format, optional_date_format};

/// Lifecycle state of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Pending,
    Published,
    Canceled,
}

/// State change requested together with an event edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateAction {
    SendToReview,
    CancelReview,
    PublishEvent,
    RejectEvent,
}

/// State actions available to the event owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStateAction {
    SendToReview,
    CancelReview,
}

/// State actions available to administrators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminStateAction {
    PublishEvent,
    RejectEvent,
}

/// Error returned by the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {action} to an event in state {from}")]
pub struct TransitionError {
    pub from: EventStatus,
    pub action: StateAction,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "PENDING",
            EventStatus::Published => "PUBLISHED",
            EventStatus::Canceled => "CANCELED",
        }
    }

    /// Transition table: current state x action -> next state.
    ///
    /// Preconditions that depend on more than the state (publication lead
    /// time) are checked by the lifecycle before the transition is applied.
    pub fn transition(self, action: StateAction) -> Result<EventStatus, TransitionError> {
        use EventStatus::*;
        use StateAction::*;

        match (self, action) {
            (Pending, SendToReview) => Ok(Pending),
            (Pending, CancelReview) => Ok(Canceled),
            (Pending, PublishEvent) => Ok(Published),
            (Pending, RejectEvent) => Ok(Canceled),
            (Published, _) | (Canceled, _) => Err(TransitionError { from: self, action }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Published | EventStatus::Canceled)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown status strings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for EventStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(EventStatus::Pending),
            "PUBLISHED" => Ok(EventStatus::Published),
            "CANCELED" => Ok(EventStatus::Canceled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for EventStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl StateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateAction::SendToReview => "SEND_TO_REVIEW",
            StateAction::CancelReview => "CANCEL_REVIEW",
            StateAction::PublishEvent => "PUBLISH_EVENT",
            StateAction::RejectEvent => "REJECT_EVENT",
        }
    }
}

impl fmt::Display for StateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<UserStateAction> for StateAction {
    fn from(action: UserStateAction) -> Self {
        match action {
            UserStateAction::SendToReview => StateAction::SendToReview,
            UserStateAction::CancelReview => StateAction::CancelReview,
        }
    }
}

impl From<AdminStateAction> for StateAction {
    fn from(action: AdminStateAction) -> Self {
        match action {
            AdminStateAction::PublishEvent => StateAction::PublishEvent,
            AdminStateAction::RejectEvent => StateAction::RejectEvent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category_id: i64,
    pub initiator_id: i64,
    #[sqlx(flatten)]
    pub location: Location,
    pub event_date: DateTime<Utc>,
    pub paid: bool,
    pub participant_limit: i32,
    pub request_moderation: bool,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub created_on: DateTime<Utc>,
    pub published_on: Option<DateTime<Utc>>,
    /// Maintained by the request allocator only
    pub confirmed_requests: i64,
}

impl Event {
    /// URI under which views of this event are counted
    pub fn view_uri(&self) -> String {
        event_uri(self.id)
    }

    pub fn has_unlimited_capacity(&self) -> bool {
        self.participant_limit == 0
    }
}

/// Build the stats URI for an event id
pub fn event_uri(event_id: i64) -> String {
    format!("/events/{}", event_id)
}

/// Extract the event id from a stats URI (`/events/{id}`)
pub fn event_id_from_uri(uri: &str) -> Option<i64> {
    uri.strip_prefix("/events/")
        .filter(|rest| !rest.contains('/'))
        .and_then(|rest| rest.parse().ok())
}

/// Validated input for inserting a new event
#[derive(Debug, Clone)]
pub struct CreateEventRequest {
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category_id: i64,
    pub initiator_id: i64,
    pub location: Location,
    pub event_date: DateTime<Utc>,
    pub paid: bool,
    pub participant_limit: i32,
    pub request_moderation: bool,
    pub created_on: DateTime<Utc>,
}

/// Body of `POST /users/{userId}/events`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEventDto {
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category: i64,
    pub location: Location,
    pub event_date: String,
    pub paid: Option<bool>,
    pub participant_limit: Option<i32>,
    pub request_moderation: Option<bool>,
}

/// Field changes shared by the owner and admin edit paths
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFieldsUpdate {
    pub title: Option<String>,
    pub annotation: Option<String>,
    pub description: Option<String>,
    pub category: Option<i64>,
    pub location: Option<Location>,
    pub event_date: Option<String>,
    pub paid: Option<bool>,
    pub participant_limit: Option<i32>,
    pub request_moderation: Option<bool>,
}

/// Body of `PATCH /users/{userId}/events/{eventId}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventUserRequest {
    #[serde(flatten)]
    pub fields: EventFieldsUpdate,
    pub state_action: Option<UserStateAction>,
}

/// Body of `PATCH /admin/events/{eventId}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventAdminRequest {
    #[serde(flatten)]
    pub fields: EventFieldsUpdate,
    pub state_action: Option<AdminStateAction>,
}

/// Full event projection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFullDto {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category: i64,
    pub initiator: i64,
    pub location: Location,
    #[serde(with = "date_format")]
    pub event_date: DateTime<Utc>,
    pub paid: bool,
    pub participant_limit: i32,
    pub request_moderation: bool,
    pub state: EventStatus,
    #[serde(with = "date_format")]
    pub created_on: DateTime<Utc>,
    #[serde(serialize_with = "optional_date_format::serialize")]
    pub published_on: Option<DateTime<Utc>>,
    pub confirmed_requests: i64,
    pub views: i64,
}

/// Short event projection used by listings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventShortDto {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub category: i64,
    pub initiator: i64,
    #[serde(with = "date_format")]
    pub event_date: DateTime<Utc>,
    pub paid: bool,
    pub confirmed_requests: i64,
    pub views: i64,
}

impl EventFullDto {
    pub fn from_event(event: &Event, views: i64) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            annotation: event.annotation.clone(),
            description: event.description.clone(),
            category: event.category_id,
            initiator: event.initiator_id,
            location: event.location,
            event_date: event.event_date,
            paid: event.paid,
            participant_limit: event.participant_limit,
            request_moderation: event.request_moderation,
            state: event.status,
            created_on: event.created_on,
            published_on: event.published_on,
            confirmed_requests: event.confirmed_requests,
            views,
        }
    }
}

impl EventShortDto {
    pub fn from_event(event: &Event, views: i64) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            annotation: event.annotation.clone(),
            category: event.category_id,
            initiator: event.initiator_id,
            event_date: event.event_date,
            paid: event.paid,
            confirmed_requests: event.confirmed_requests,
            views,
        }
    }
}

/// Composite filter for the admin event search
#[derive(Debug, Clone, Default)]
pub struct AdminEventFilter {
    pub initiators: Option<Vec<i64>>,
    pub statuses: Option<Vec<EventStatus>>,
    pub categories: Option<Vec<i64>>,
    pub range_start: Option<DateTime<Utc>>,
    pub range_end: Option<DateTime<Utc>>,
    pub from: i64,
    pub size: i64,
}

/// Sort order for the public event search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSort {
    #[default]
    EventDate,
    Views,
}

/// Filter for the public event search; only published events are matched
#[derive(Debug, Clone, Default)]
pub struct PublicEventFilter {
    pub text: Option<String>,
    pub categories: Option<Vec<i64>>,
    pub paid: Option<bool>,
    pub range_start: DateTime<Utc>,
    pub range_end: Option<DateTime<Utc>>,
    pub only_available: bool,
    pub sort: EventSort,
    pub from: i64,
    pub size: i64,
}
