//! Participation request allocator
//!
//! Creation rules, cancellation and the bulk confirm/reject cascade. The
//! allocator works on loaded entities only; the request service loads them
//! under a row lock on the event and persists whatever the allocator changed.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::models::event::{Event, EventStatus};
use crate::models::request::{ParticipationRequest, RequestDecision, RequestStatus};
use crate::utils::errors::{EventHubError, Result};

/// Requests touched by a bulk update, in processing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub confirmed: Vec<ParticipationRequest>,
    pub rejected: Vec<ParticipationRequest>,
}

impl BatchOutcome {
    /// Every processed request, confirmed ones first
    pub fn all(&self) -> impl Iterator<Item = &ParticipationRequest> {
        self.confirmed.iter().chain(self.rejected.iter())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestAllocator;

impl RequestAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `requester_id` may join `event` and with which status.
    ///
    /// `confirmed` is the current confirmed-count of the event.
    pub fn admit(&self, event: &Event, requester_id: i64, already_requested: bool, confirmed: i64) -> Result<RequestStatus> {
        if event.initiator_id == requester_id {
            return Err(EventHubError::SelfParticipation { event_id: event.id });
        }
        if event.status != EventStatus::Published {
            return Err(EventHubError::EventNotPublished { event_id: event.id });
        }
        if already_requested {
            return Err(EventHubError::DuplicateRequest {
                event_id: event.id,
                requester_id,
            });
        }
        if !event.has_unlimited_capacity() && confirmed >= i64::from(event.participant_limit) {
            return Err(EventHubError::ParticipantLimitReached {
                event_id: event.id,
                limit: event.participant_limit,
            });
        }

        let status = if event.has_unlimited_capacity() || !event.request_moderation {
            RequestStatus::Confirmed
        } else {
            RequestStatus::Pending
        };

        debug!(event_id = event.id, requester_id, status = %status, "Participation request admitted");
        Ok(status)
    }

    /// Build the request row for an admitted requester and account for it on the event.
    ///
    /// `confirmed` must be the same count `admit` was checked against.
    pub fn place(
        &self,
        event: &mut Event,
        requester_id: i64,
        status: RequestStatus,
        confirmed: i64,
        created: DateTime<Utc>,
    ) -> ParticipationRequest {
        if status == RequestStatus::Confirmed {
            event.confirmed_requests = confirmed + 1;
        }

        ParticipationRequest {
            id: 0,
            event_id: event.id,
            requester_id,
            created,
            status,
        }
    }

    /// Withdraw a request on behalf of its requester.
    ///
    /// The confirmed-count of the event is left untouched.
    pub fn cancel(&self, request: &mut ParticipationRequest, requester_id: i64) -> Result<()> {
        if request.requester_id != requester_id {
            return Err(EventHubError::RequestNotFound { request_id: request.id });
        }
        if !request.status.can_transition_to(RequestStatus::Canceled) {
            return Err(EventHubError::InvalidStateTransition {
                from: request.status.to_string(),
                to: RequestStatus::Canceled.to_string(),
            });
        }

        request.status = RequestStatus::Canceled;
        Ok(())
    }

    /// Bulk decisions only make sense for limited, moderated events
    pub fn ensure_moderated(&self, event: &Event) -> Result<()> {
        if event.has_unlimited_capacity() || !event.request_moderation {
            return Err(EventHubError::ModerationNotApplicable { event_id: event.id });
        }
        Ok(())
    }

    /// Arrange loaded requests in caller order and check every one of them.
    ///
    /// Repeated ids are processed once, at their first position. Any id that
    /// is missing, belongs to another event or is no longer PENDING aborts
    /// the whole batch.
    pub fn order_batch(
        &self,
        event: &Event,
        request_ids: &[i64],
        loaded: Vec<ParticipationRequest>,
    ) -> Result<Vec<ParticipationRequest>> {
        if request_ids.is_empty() {
            return Err(EventHubError::validation("Field: requestIds. Error: must not be empty"));
        }

        let mut by_id: HashMap<i64, ParticipationRequest> = loaded.into_iter().map(|r| (r.id, r)).collect();
        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(request_ids.len());

        for &id in request_ids {
            if !seen.insert(id) {
                continue;
            }
            let request = by_id
                .remove(&id)
                .filter(|r| r.event_id == event.id)
                .ok_or(EventHubError::RequestNotFound { request_id: id })?;
            if request.status != RequestStatus::Pending {
                return Err(EventHubError::RequestNotPending {
                    request_id: id,
                    status: request.status.to_string(),
                });
            }
            ordered.push(request);
        }

        Ok(ordered)
    }

    /// Apply a bulk decision to an ordered, pre-checked batch.
    ///
    /// Confirming walks the batch in order, fills the remaining slots and
    /// rejects the overflow. `confirmed` is the current confirmed-count.
    pub fn decide(
        &self,
        event: &mut Event,
        batch: Vec<ParticipationRequest>,
        decision: RequestDecision,
        confirmed: i64,
    ) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();

        match decision {
            RequestDecision::Rejected => {
                for mut request in batch {
                    request.status = RequestStatus::Rejected;
                    outcome.rejected.push(request);
                }
            }
            RequestDecision::Confirmed => {
                let mut available = i64::from(event.participant_limit) - confirmed;
                if available <= 0 {
                    return Err(EventHubError::ParticipantLimitReached {
                        event_id: event.id,
                        limit: event.participant_limit,
                    });
                }

                for mut request in batch {
                    if available > 0 {
                        request.status = RequestStatus::Confirmed;
                        available -= 1;
                        outcome.confirmed.push(request);
                    } else {
                        request.status = RequestStatus::Rejected;
                        outcome.rejected.push(request);
                    }
                }

                event.confirmed_requests = confirmed + outcome.confirmed.len() as i64;
            }
        }

        info!(
            event_id = event.id,
            confirmed = outcome.confirmed.len(),
            rejected = outcome.rejected.len(),
            confirmed_requests = event.confirmed_requests,
            "Bulk request decision applied"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::Location;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    const OWNER: i64 = 1;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    fn event(limit: i32, moderation: bool) -> Event {
        Event {
            id: 7,
            title: "Shag jam".to_string(),
            annotation: "Collegiate shag jam with a DJ".to_string(),
            description: "Fast music all night, beginners welcome".to_string(),
            category_id: 1,
            initiator_id: OWNER,
            location: Location { lat: 0.0, lon: 0.0 },
            event_date: now() + Duration::hours(3),
            paid: false,
            participant_limit: limit,
            request_moderation: moderation,
            status: EventStatus::Published,
            created_on: now() - Duration::days(2),
            published_on: Some(now() - Duration::days(1)),
            confirmed_requests: 0,
        }
    }

    fn pending(id: i64, event_id: i64) -> ParticipationRequest {
        ParticipationRequest {
            id,
            event_id,
            requester_id: 100 + id,
            created: now(),
            status: RequestStatus::Pending,
        }
    }

    #[test]
    fn test_admit_rejects_initiator() {
        let err = RequestAllocator::new().admit(&event(0, true), OWNER, false, 0).unwrap_err();
        assert_matches!(err, EventHubError::SelfParticipation { event_id: 7 });
    }

    #[test]
    fn test_admit_rejects_unpublished_event() {
        let mut pending_event = event(0, true);
        pending_event.status = EventStatus::Pending;
        pending_event.published_on = None;
        let err = RequestAllocator::new().admit(&pending_event, 2, false, 0).unwrap_err();
        assert_matches!(err, EventHubError::EventNotPublished { .. });
    }

    #[test]
    fn test_admit_rejects_duplicate() {
        let err = RequestAllocator::new().admit(&event(5, true), 2, true, 0).unwrap_err();
        assert_matches!(err, EventHubError::DuplicateRequest { requester_id: 2, .. });
    }

    #[test]
    fn test_admit_rejects_full_event() {
        let err = RequestAllocator::new().admit(&event(2, true), 2, false, 2).unwrap_err();
        assert_matches!(err, EventHubError::ParticipantLimitReached { limit: 2, .. });
    }

    #[test]
    fn test_unlimited_event_confirms_immediately() {
        let allocator = RequestAllocator::new();
        let mut e = event(0, true);
        let status = allocator.admit(&e, 2, false, 1_000).unwrap();
        assert_eq!(status, RequestStatus::Confirmed);

        let request = allocator.place(&mut e, 2, status, 1_000, now());
        assert_eq!(request.status, RequestStatus::Confirmed);
        assert_eq!(e.confirmed_requests, 1_001);
    }

    #[test]
    fn test_place_counts_from_admitted_base() {
        let allocator = RequestAllocator::new();
        let mut e = event(5, false);
        e.confirmed_requests = 1;

        // Stored counter lags behind the confirmed rows
        let status = allocator.admit(&e, 2, false, 3).unwrap();
        allocator.place(&mut e, 2, status, 3, now());
        assert_eq!(e.confirmed_requests, 4);
    }

    #[test]
    fn test_unmoderated_event_confirms_immediately() {
        let status = RequestAllocator::new().admit(&event(3, false), 2, false, 0).unwrap();
        assert_eq!(status, RequestStatus::Confirmed);
    }

    #[test]
    fn test_moderated_event_starts_pending() {
        let allocator = RequestAllocator::new();
        let mut e = event(3, true);
        let status = allocator.admit(&e, 2, false, 0).unwrap();
        assert_eq!(status, RequestStatus::Pending);

        allocator.place(&mut e, 2, status, 0, now());
        assert_eq!(e.confirmed_requests, 0);
    }

    #[test]
    fn test_cancel_by_other_user_is_not_found() {
        let mut request = pending(1, 7);
        let err = RequestAllocator::new().cancel(&mut request, 999).unwrap_err();
        assert_matches!(err, EventHubError::RequestNotFound { request_id: 1 });
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[test]
    fn test_cancel_confirmed_request() {
        let mut request = pending(1, 7);
        request.status = RequestStatus::Confirmed;
        RequestAllocator::new().cancel(&mut request, 101).unwrap();
        assert_eq!(request.status, RequestStatus::Canceled);
    }

    #[test]
    fn test_cancel_twice_is_rejected() {
        let allocator = RequestAllocator::new();
        let mut request = pending(1, 7);
        allocator.cancel(&mut request, 101).unwrap();
        let err = allocator.cancel(&mut request, 101).unwrap_err();
        assert_matches!(err, EventHubError::InvalidStateTransition { .. });
        assert_eq!(request.status, RequestStatus::Canceled);
    }

    #[test]
    fn test_cancel_rejected_request_is_conflict() {
        let mut request = pending(1, 7);
        request.status = RequestStatus::Rejected;
        let err = RequestAllocator::new().cancel(&mut request, 101).unwrap_err();
        assert_matches!(err, EventHubError::InvalidStateTransition { .. });
        assert_eq!(request.status, RequestStatus::Rejected);
    }

    #[test]
    fn test_moderation_not_applicable() {
        let allocator = RequestAllocator::new();
        assert_matches!(
            allocator.ensure_moderated(&event(0, true)),
            Err(EventHubError::ModerationNotApplicable { .. })
        );
        assert_matches!(
            allocator.ensure_moderated(&event(4, false)),
            Err(EventHubError::ModerationNotApplicable { .. })
        );
        assert!(allocator.ensure_moderated(&event(4, true)).is_ok());
    }

    #[test]
    fn test_order_batch_follows_caller_order() {
        let loaded = vec![pending(1, 7), pending(2, 7), pending(3, 7)];
        let ordered = RequestAllocator::new().order_batch(&event(2, true), &[3, 1, 3, 2], loaded).unwrap();
        let ids: Vec<i64> = ordered.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_order_batch_aborts_on_foreign_or_missing_request() {
        let allocator = RequestAllocator::new();
        let err = allocator
            .order_batch(&event(2, true), &[1, 2], vec![pending(1, 7), pending(2, 8)])
            .unwrap_err();
        assert_matches!(err, EventHubError::RequestNotFound { request_id: 2 });

        let err = allocator.order_batch(&event(2, true), &[1, 5], vec![pending(1, 7)]).unwrap_err();
        assert_matches!(err, EventHubError::RequestNotFound { request_id: 5 });

        let err = allocator.order_batch(&event(2, true), &[], vec![]).unwrap_err();
        assert_matches!(err, EventHubError::Validation(_));
    }

    #[test]
    fn test_order_batch_aborts_on_non_pending_request() {
        let mut confirmed = pending(2, 7);
        confirmed.status = RequestStatus::Confirmed;
        let err = RequestAllocator::new()
            .order_batch(&event(2, true), &[1, 2], vec![pending(1, 7), confirmed])
            .unwrap_err();
        assert_matches!(err, EventHubError::RequestNotPending { request_id: 2, .. });
    }

    #[test]
    fn test_confirm_fills_slots_in_order_and_rejects_overflow() {
        let allocator = RequestAllocator::new();
        let mut e = event(2, true);
        let batch = vec![pending(1, 7), pending(2, 7), pending(3, 7)];

        let outcome = allocator.decide(&mut e, batch, RequestDecision::Confirmed, 0).unwrap();

        let confirmed: Vec<i64> = outcome.confirmed.iter().map(|r| r.id).collect();
        let rejected: Vec<i64> = outcome.rejected.iter().map(|r| r.id).collect();
        assert_eq!(confirmed, vec![1, 2]);
        assert_eq!(rejected, vec![3]);
        assert!(outcome.confirmed.iter().all(|r| r.status == RequestStatus::Confirmed));
        assert!(outcome.rejected.iter().all(|r| r.status == RequestStatus::Rejected));
        assert_eq!(e.confirmed_requests, 2);
    }

    #[test]
    fn test_confirm_on_full_event_touches_nothing() {
        let mut e = event(2, true);
        e.confirmed_requests = 2;
        let err = RequestAllocator::new()
            .decide(&mut e, vec![pending(1, 7)], RequestDecision::Confirmed, 2)
            .unwrap_err();
        assert_matches!(err, EventHubError::ParticipantLimitReached { .. });
        assert_eq!(e.confirmed_requests, 2);
    }

    #[test]
    fn test_reject_batch_keeps_count() {
        let mut e = event(2, true);
        e.confirmed_requests = 1;
        let outcome = RequestAllocator::new()
            .decide(&mut e, vec![pending(1, 7), pending(2, 7)], RequestDecision::Rejected, 1)
            .unwrap();
        assert!(outcome.confirmed.is_empty());
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.all().count(), 2);
        assert_eq!(e.confirmed_requests, 1);
    }

    #[test]
    fn test_single_slot_scenario() {
        let allocator = RequestAllocator::new();
        let mut e = event(1, true);

        let x = allocator.admit(&e, 20, false, 0).unwrap();
        let mut x_request = allocator.place(&mut e, 20, x, 0, now());
        x_request.id = 1;
        let y = allocator.admit(&e, 30, false, 0).unwrap();
        let mut y_request = allocator.place(&mut e, 30, y, 0, now());
        y_request.id = 2;
        assert_eq!((x, y), (RequestStatus::Pending, RequestStatus::Pending));

        allocator.ensure_moderated(&e).unwrap();
        let batch = allocator.order_batch(&e, &[1, 2], vec![y_request, x_request]).unwrap();
        let outcome = allocator.decide(&mut e, batch, RequestDecision::Confirmed, 0).unwrap();

        assert_eq!(outcome.confirmed.iter().map(|r| r.requester_id).collect::<Vec<_>>(), vec![20]);
        assert_eq!(outcome.rejected.iter().map(|r| r.requester_id).collect::<Vec<_>>(), vec![30]);
        assert_eq!(e.confirmed_requests, 1);
    }

    proptest! {
        #[test]
        fn prop_confirm_never_exceeds_limit(limit in 1i32..20, already in 0i64..20, batch_len in 1usize..30) {
            prop_assume!(already < i64::from(limit));
            let mut e = event(limit, true);
            e.confirmed_requests = already;
            let batch: Vec<_> = (1..=batch_len as i64).map(|id| pending(id, 7)).collect();

            let outcome = RequestAllocator::new()
                .decide(&mut e, batch, RequestDecision::Confirmed, already)
                .unwrap();

            prop_assert!(e.confirmed_requests <= i64::from(limit));
            prop_assert_eq!(outcome.confirmed.len() + outcome.rejected.len(), batch_len);
            let expected = std::cmp::min(batch_len as i64, i64::from(limit) - already);
            prop_assert_eq!(outcome.confirmed.len() as i64, expected);
        }

        #[test]
        fn prop_confirmed_are_a_prefix_of_the_batch(limit in 1i32..10, ids in proptest::collection::hash_set(1i64..500, 1..20)) {
            let ids: Vec<i64> = ids.into_iter().collect();
            let mut e = event(limit, true);
            let loaded: Vec<_> = ids.iter().map(|&id| pending(id, 7)).collect();
            let allocator = RequestAllocator::new();

            let batch = allocator.order_batch(&e, &ids, loaded).unwrap();
            let outcome = allocator.decide(&mut e, batch, RequestDecision::Confirmed, 0).unwrap();

            let processed: Vec<i64> = outcome.all().map(|r| r.id).collect();
            prop_assert_eq!(processed, ids);
        }
    }
}
