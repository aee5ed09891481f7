//! HTTP error mapping
//!
//! Converts [`EventHubError`] and axum extractor rejections into the JSON
//! error body returned by every endpoint.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::utils::errors::{ErrorKind, ErrorSeverity, EventHubError};
use crate::utils::helpers::{format_timestamp, now_seconds};

const BAD_REQUEST_REASON: &str = "Incorrectly made request.";
const NOT_FOUND_REASON: &str = "The required object was not found.";
const CONFLICT_REASON: &str = "For the requested operation the conditions are not met.";
const INTERNAL_REASON: &str = "Internal server error.";

/// Error returned by handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    reason: &'static str,
    message: String,
    errors: Vec<String>,
    severity: ErrorSeverity,
    detail: Option<String>,
}

/// Error response body (JSON)
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub status: String,
    pub reason: String,
    pub message: String,
    pub timestamp: String,
    pub errors: Vec<String>,
}

impl ApiError {
    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            reason: BAD_REQUEST_REASON,
            message: message.into(),
            errors: Vec::new(),
            severity: ErrorSeverity::Info,
            detail: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<EventHubError> for ApiError {
    fn from(err: EventHubError) -> Self {
        let (status, reason) = match err.kind() {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, BAD_REQUEST_REASON),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_REASON),
            ErrorKind::Conflict => (StatusCode::CONFLICT, CONFLICT_REASON),
            ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_REASON),
        };

        // Internal details stay in the log
        let (message, detail) = if status.is_server_error() {
            ("Unexpected error while processing the request".to_string(), Some(err.to_string()))
        } else {
            (err.to_string(), None)
        };

        Self {
            status,
            reason,
            message,
            errors: Vec::new(),
            severity: err.severity(),
            detail,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.severity {
            ErrorSeverity::Info => info!(status = %self.status, message = %self.message, "Request rejected"),
            ErrorSeverity::Warning => warn!(status = %self.status, message = %self.message, "Request rejected"),
            ErrorSeverity::Error | ErrorSeverity::Critical => error!(
                status = %self.status,
                severity = %self.severity,
                detail = self.detail.as_deref().unwrap_or_default(),
                "Request failed"
            ),
        }

        let body = ApiErrorBody {
            status: self
                .status
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_uppercase()
                .replace(' ', "_"),
            reason: self.reason.to_string(),
            message: self.message,
            timestamp: format_timestamp(now_seconds()),
            errors: self.errors,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = ApiError::from(EventHubError::EventNotFound { event_id: 5 }).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["status"], "NOT_FOUND");
        assert_eq!(body["reason"], NOT_FOUND_REASON);
        assert_eq!(body["message"], "Event with id=5 was not found");
        assert_eq!(body["errors"], serde_json::json!([]));
        assert_eq!(body["timestamp"].as_str().unwrap().len(), 19);
    }

    #[tokio::test]
    async fn test_conflict_and_validation_status() {
        let conflict = ApiError::from(EventHubError::ParticipantLimitReached { event_id: 1, limit: 2 });
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let response = ApiError::from(EventHubError::validation("Field: title. Error: must not be blank")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], "BAD_REQUEST");
        assert_eq!(body["reason"], BAD_REQUEST_REASON);
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::from(EventHubError::Config("secret path".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["status"], "INTERNAL_SERVER_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("secret"));
    }
}
