//! Error handling for EventHub
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for EventHub application
#[derive(Error, Debug)]
pub enum EventHubError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Stats service error: {0}")]
    Stats(#[from] StatsError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("User with id={user_id} was not found")]
    UserNotFound { user_id: i64 },

    #[error("Category with id={category_id} was not found")]
    CategoryNotFound { category_id: i64 },

    #[error("Event with id={event_id} was not found")]
    EventNotFound { event_id: i64 },

    #[error("Request with id={request_id} was not found")]
    RequestNotFound { request_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Only pending or canceled events can be changed")]
    EventAlreadyPublished { event_id: i64 },

    #[error("Cannot publish event {event_id}: event date {event_date} is less than {lead_hours}h ahead")]
    PublicationTooSoon { event_id: i64, event_date: DateTime<Utc>, lead_hours: i64 },

    #[error("Initiator cannot participate in their own event {event_id}")]
    SelfParticipation { event_id: i64 },

    #[error("Event {event_id} is not published")]
    EventNotPublished { event_id: i64 },

    #[error("Request from user {requester_id} for event {event_id} already exists")]
    DuplicateRequest { event_id: i64, requester_id: i64 },

    #[error("The participant limit of {limit} has been reached for event {event_id}")]
    ParticipantLimitReached { event_id: i64, limit: i32 },

    #[error("Participant limit {limit} of event {event_id} is below its {confirmed} confirmed requests")]
    LimitBelowConfirmed { event_id: i64, limit: i32, confirmed: i64 },

    #[error("Event {event_id} does not require request moderation")]
    ModerationNotApplicable { event_id: i64 },

    #[error("Request {request_id} must have status PENDING, found {status}")]
    RequestNotPending { request_id: i64, status: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Stats (view counter) service specific errors
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Stats request failed: {0}")]
    RequestFailed(String),

    #[error("Stats request timed out")]
    Timeout,

    #[error("Invalid stats response: {0}")]
    InvalidResponse(String),

    #[error("Stats service unavailable")]
    ServiceUnavailable,
}

/// Result type alias for EventHub operations
pub type Result<T> = std::result::Result<T, EventHubError>;

/// Result type alias for stats operations
pub type StatsResult<T> = std::result::Result<T, StatsError>;

/// How an error surfaces at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl EventHubError {
    /// Shorthand for a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        EventHubError::Validation(message.into())
    }

    /// Classify the error into the caller-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            EventHubError::Validation(_) => ErrorKind::Validation,
            EventHubError::UserNotFound { .. }
            | EventHubError::CategoryNotFound { .. }
            | EventHubError::EventNotFound { .. }
            | EventHubError::RequestNotFound { .. } => ErrorKind::NotFound,
            EventHubError::InvalidStateTransition { .. }
            | EventHubError::EventAlreadyPublished { .. }
            | EventHubError::PublicationTooSoon { .. }
            | EventHubError::SelfParticipation { .. }
            | EventHubError::EventNotPublished { .. }
            | EventHubError::DuplicateRequest { .. }
            | EventHubError::ParticipantLimitReached { .. }
            | EventHubError::LimitBelowConfirmed { .. }
            | EventHubError::ModerationNotApplicable { .. }
            | EventHubError::RequestNotPending { .. } => ErrorKind::Conflict,
            EventHubError::Database(_)
            | EventHubError::Migration(_)
            | EventHubError::Stats(_)
            | EventHubError::Config(_)
            | EventHubError::Http(_)
            | EventHubError::Serialization(_)
            | EventHubError::Io(_)
            | EventHubError::UrlParse(_) => ErrorKind::Internal,
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            EventHubError::Database(_) => false,
            EventHubError::Migration(_) => false,
            EventHubError::Stats(_) => true,
            EventHubError::Config(_) => false,
            EventHubError::Http(_) => true,
            EventHubError::Serialization(_) => false,
            EventHubError::Io(_) => true,
            EventHubError::UrlParse(_) => false,
            // Caller mistakes: retrying the same call fails the same way
            _ => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::Validation => ErrorSeverity::Info,
            ErrorKind::NotFound | ErrorKind::Conflict => ErrorSeverity::Warning,
            ErrorKind::Internal => match self {
                EventHubError::Database(_)
                | EventHubError::Migration(_)
                | EventHubError::Config(_) => ErrorSeverity::Critical,
                _ => ErrorSeverity::Error,
            },
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
