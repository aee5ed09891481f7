//! Participation request model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::event::UnknownStatus;
use crate::utils::helpers::date_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Confirmed,
    Rejected,
    Canceled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Confirmed => "CONFIRMED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Canceled => "CANCELED",
        }
    }

    /// Whether `self -> next` is an allowed transition.
    ///
    /// PENDING is decided by the allocator or withdrawn by the requester,
    /// CONFIRMED may still be withdrawn or rejected by the cascade; REJECTED
    /// and CANCELED never change again.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;

        match (self, next) {
            (Pending, Confirmed) | (Pending, Rejected) | (Pending, Canceled) => true,
            (Confirmed, Canceled) | (Confirmed, Rejected) => true,
            (Pending, Pending) | (Confirmed, Confirmed) | (Confirmed, Pending) => false,
            (Rejected, _) | (Canceled, _) => false,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RequestStatus::Pending),
            "CONFIRMED" => Ok(RequestStatus::Confirmed),
            "REJECTED" => Ok(RequestStatus::Rejected),
            "CANCELED" => Ok(RequestStatus::Canceled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ParticipationRequest {
    pub id: i64,
    pub event_id: i64,
    pub requester_id: i64,
    pub created: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
}

#[derive(Debug, Clone)]
pub struct CreateParticipationRequest {
    pub event_id: i64,
    pub requester_id: i64,
    pub created: DateTime<Utc>,
    pub status: RequestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationRequestDto {
    pub id: i64,
    pub event: i64,
    pub requester: i64,
    #[serde(with = "date_format")]
    pub created: DateTime<Utc>,
    pub status: RequestStatus,
}

impl From<&ParticipationRequest> for ParticipationRequestDto {
    fn from(request: &ParticipationRequest) -> Self {
        Self {
            id: request.id,
            event: request.event_id,
            requester: request.requester_id,
            created: request.created,
            status: request.status,
        }
    }
}

/// Target status of a bulk update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestDecision {
    Confirmed,
    Rejected,
}

/// Body of `PATCH /users/{userId}/events/{eventId}/requests`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequestStatusUpdateRequest {
    pub request_ids: Vec<i64>,
    pub status: RequestDecision,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequestStatusUpdateResult {
    pub confirmed_requests: Vec<ParticipationRequestDto>,
    pub rejected_requests: Vec<ParticipationRequestDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transition_table() {
        use RequestStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Canceled));
        assert!(Confirmed.can_transition_to(Canceled));
        assert!(!Confirmed.can_transition_to(Pending));
        for next in [Pending, Confirmed, Rejected, Canceled] {
            assert!(!Canceled.can_transition_to(next));
            assert!(!Rejected.can_transition_to(next));
        }
    }

    #[test]
    fn test_dto_serialization() {
        let request = ParticipationRequest {
            id: 3,
            event_id: 1,
            requester_id: 2,
            created: Utc.with_ymd_and_hms(2030, 5, 6, 7, 8, 9).unwrap(),
            status: RequestStatus::Pending,
        };
        let json = serde_json::to_value(ParticipationRequestDto::from(&request)).unwrap();
        assert_eq!(json["created"], "2030-05-06 07:08:09");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["event"], 1);
    }

    #[test]
    fn test_status_update_body() {
        let body = r#"{"requestIds":[4,2,9],"status":"CONFIRMED"}"#;
        let request: EventRequestStatusUpdateRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.request_ids, vec![4, 2, 9]);
        assert_eq!(request.status, RequestDecision::Confirmed);
        assert!(serde_json::from_str::<EventRequestStatusUpdateRequest>(r#"{"requestIds":[1],"status":"CANCELED"}"#).is_err());
    }
}
