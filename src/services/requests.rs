//! Participation request service
//!
//! Every allocator operation runs in one transaction that locks the event
//! row first, so concurrent calls for the same event are serialized and the
//! confirmed-count cannot be overcommitted.

use tracing::{debug, info};

use crate::database::DatabaseService;
use crate::models::request::{
    CreateParticipationRequest, EventRequestStatusUpdateRequest, EventRequestStatusUpdateResult,
    ParticipationRequestDto, RequestStatus,
};
use crate::services::allocator::RequestAllocator;
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::now_seconds;
use crate::utils::logging::log_request_action;

#[derive(Debug, Clone)]
pub struct RequestService {
    db: DatabaseService,
    allocator: RequestAllocator,
}

impl RequestService {
    pub fn new(db: DatabaseService) -> Self {
        Self {
            db,
            allocator: RequestAllocator::new(),
        }
    }

    /// Requests made by `user_id`
    pub async fn get_user_requests(&self, user_id: i64) -> Result<Vec<ParticipationRequestDto>> {
        self.db.ensure_user(user_id).await?;
        let requests = self.db.requests.find_by_requester(user_id).await?;
        Ok(requests.iter().map(ParticipationRequestDto::from).collect())
    }

    /// Ask to join a published event
    pub async fn add_request(&self, user_id: i64, event_id: i64) -> Result<ParticipationRequestDto> {
        self.db.ensure_user(user_id).await?;

        let mut tx = self.db.begin().await?;
        let mut event = self
            .db
            .events
            .lock_by_id(&mut *tx, event_id)
            .await?
            .ok_or(EventHubError::EventNotFound { event_id })?;

        let already_requested = self.db.requests.exists_for(&mut *tx, event_id, user_id).await?;
        let counted = self.db.requests.count_confirmed(&mut *tx, event_id).await?;
        let confirmed = event.confirmed_requests.max(counted);

        let status = self.allocator.admit(&event, user_id, already_requested, confirmed)?;
        let placed = self.allocator.place(&mut event, user_id, status, confirmed, now_seconds());

        let request = self
            .db
            .requests
            .create(
                &mut *tx,
                CreateParticipationRequest {
                    event_id,
                    requester_id: user_id,
                    created: placed.created,
                    status: placed.status,
                },
            )
            .await?;

        if request.status == RequestStatus::Confirmed {
            self.db.events.save(&mut *tx, &event).await?;
        }
        tx.commit().await?;

        log_request_action(request.id, event_id, "create", request.status.as_str());
        Ok(ParticipationRequestDto::from(&request))
    }

    /// Withdraw one of the user's own requests
    pub async fn cancel_request(&self, user_id: i64, request_id: i64) -> Result<ParticipationRequestDto> {
        self.db.ensure_user(user_id).await?;

        let mut tx = self.db.begin().await?;
        let mut request = self
            .db
            .requests
            .find_by_id(&mut *tx, request_id)
            .await?
            .ok_or(EventHubError::RequestNotFound { request_id })?;

        self.allocator.cancel(&mut request, user_id)?;
        let saved = self.db.requests.update_status(&mut *tx, request_id, request.status).await?;
        tx.commit().await?;

        log_request_action(saved.id, saved.event_id, "cancel", saved.status.as_str());
        Ok(ParticipationRequestDto::from(&saved))
    }

    /// Requests received by an event, visible to its initiator only
    pub async fn get_event_requests(&self, user_id: i64, event_id: i64) -> Result<Vec<ParticipationRequestDto>> {
        self.db.ensure_user(user_id).await?;
        self.db
            .events
            .find_by_id_and_initiator(event_id, user_id)
            .await?
            .ok_or(EventHubError::EventNotFound { event_id })?;

        let requests = self.db.requests.find_by_event(event_id).await?;
        debug!(event_id, count = requests.len(), "Loaded event requests");
        Ok(requests.iter().map(ParticipationRequestDto::from).collect())
    }

    /// Confirm or reject a batch of pending requests, all-or-nothing on preconditions
    pub async fn update_request_statuses(
        &self,
        user_id: i64,
        event_id: i64,
        body: EventRequestStatusUpdateRequest,
    ) -> Result<EventRequestStatusUpdateResult> {
        if body.request_ids.is_empty() {
            return Err(EventHubError::validation("Field: requestIds. Error: must not be empty"));
        }

        self.db.ensure_user(user_id).await?;

        let mut tx = self.db.begin().await?;
        let mut event = self
            .db
            .events
            .lock_by_id(&mut *tx, event_id)
            .await?
            .filter(|e| e.initiator_id == user_id)
            .ok_or(EventHubError::EventNotFound { event_id })?;

        self.allocator.ensure_moderated(&event)?;

        let loaded = self.db.requests.find_by_ids_for_update(&mut *tx, &body.request_ids).await?;
        let batch = self.allocator.order_batch(&event, &body.request_ids, loaded)?;

        let counted = self.db.requests.count_confirmed(&mut *tx, event_id).await?;
        let confirmed = event.confirmed_requests.max(counted);
        let outcome = self.allocator.decide(&mut event, batch, body.status, confirmed)?;

        let mut result = EventRequestStatusUpdateResult::default();
        for request in &outcome.confirmed {
            let saved = self.db.requests.update_status(&mut *tx, request.id, request.status).await?;
            result.confirmed_requests.push(ParticipationRequestDto::from(&saved));
        }
        for request in &outcome.rejected {
            let saved = self.db.requests.update_status(&mut *tx, request.id, request.status).await?;
            result.rejected_requests.push(ParticipationRequestDto::from(&saved));
        }

        if !outcome.confirmed.is_empty() {
            self.db.events.save(&mut *tx, &event).await?;
        }
        tx.commit().await?;

        for request in outcome.all() {
            log_request_action(request.id, event_id, "decide", request.status.as_str());
        }
        info!(
            event_id,
            confirmed = result.confirmed_requests.len(),
            rejected = result.rejected_requests.len(),
            "Request statuses updated"
        );

        Ok(result)
    }
}
