//! Event service
//!
//! Runs the owner, admin and public event operations: input validation
//! first, then entity lookups, then the lifecycle decision, persisted in one
//! transaction with the event row locked.

use std::sync::Arc;

use tracing::{debug, info};

use crate::database::DatabaseService;
use crate::models::event::{
    AdminEventFilter, EventFullDto, EventShortDto, EventSort, NewEventDto, PublicEventFilter,
    StateAction, UpdateEventAdminRequest, UpdateEventUserRequest,
};
use crate::models::stats::EndpointHit;
use crate::services::lifecycle::{EventLifecycle, ValidatedUpdate};
use crate::services::stats::{record_hit_in_background, ViewCounter};
use crate::services::views::ViewEnrichment;
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::now_seconds;
use crate::utils::logging::{log_admin_action, log_event_action};

#[derive(Clone)]
pub struct EventService {
    db: DatabaseService,
    lifecycle: EventLifecycle,
    views: ViewEnrichment,
    counter: Arc<dyn ViewCounter>,
    app_name: String,
}

impl EventService {
    pub fn new(db: DatabaseService, lifecycle: EventLifecycle, counter: Arc<dyn ViewCounter>, app_name: String) -> Self {
        Self {
            db,
            lifecycle,
            views: ViewEnrichment::new(counter.clone()),
            counter,
            app_name,
        }
    }

    /// Create a PENDING event owned by `user_id`
    pub async fn create_event(&self, user_id: i64, dto: NewEventDto) -> Result<EventFullDto> {
        let request = self.lifecycle.prepare_new_event(user_id, &dto, now_seconds())?;

        self.db.ensure_user(user_id).await?;
        self.db.ensure_category(request.category_id).await?;

        let event = self.db.events.create(request).await?;
        log_event_action(event.id, "create", user_id, Some(&event.title));

        Ok(EventFullDto::from_event(&event, 0))
    }

    /// Page through the events of one initiator
    pub async fn get_user_events(&self, user_id: i64, from: i64, size: i64) -> Result<Vec<EventShortDto>> {
        self.db.ensure_user(user_id).await?;
        let events = self.db.events.find_by_initiator(user_id, from, size).await?;
        debug!(user_id, count = events.len(), "Loaded initiator events");
        Ok(self.views.short(&events).await)
    }

    pub async fn get_user_event(&self, user_id: i64, event_id: i64) -> Result<EventFullDto> {
        self.db.ensure_user(user_id).await?;
        let event = self
            .db
            .events
            .find_by_id_and_initiator(event_id, user_id)
            .await?
            .ok_or(EventHubError::EventNotFound { event_id })?;
        Ok(self.views.full_one(&event).await)
    }

    /// Owner edit with optional SEND_TO_REVIEW / CANCEL_REVIEW
    pub async fn update_event_by_owner(&self, user_id: i64, event_id: i64, body: UpdateEventUserRequest) -> Result<EventFullDto> {
        let now = now_seconds();
        let update = self.lifecycle.validate_update(&body.fields, now)?;

        self.db.ensure_user(user_id).await?;
        self.ensure_new_category(&update).await?;

        let mut tx = self.db.begin().await?;
        let mut event = self
            .db
            .events
            .lock_by_id(&mut *tx, event_id)
            .await?
            .filter(|e| e.initiator_id == user_id)
            .ok_or(EventHubError::EventNotFound { event_id })?;

        self.lifecycle.apply_owner_update(&mut event, &update, body.state_action, now)?;
        let saved = self.db.events.save(&mut *tx, &event).await?;
        tx.commit().await?;

        let action = body.state_action.map(|a| StateAction::from(a).as_str()).unwrap_or("edit");
        log_event_action(saved.id, action, user_id, Some(saved.status.as_str()));

        Ok(self.views.full_one(&saved).await)
    }

    /// Admin edit with optional PUBLISH_EVENT / REJECT_EVENT
    pub async fn update_event_by_admin(&self, event_id: i64, body: UpdateEventAdminRequest) -> Result<EventFullDto> {
        let now = now_seconds();
        let update = self.lifecycle.validate_update(&body.fields, now)?;
        self.ensure_new_category(&update).await?;

        let mut tx = self.db.begin().await?;
        let mut event = self
            .db
            .events
            .lock_by_id(&mut *tx, event_id)
            .await?
            .ok_or(EventHubError::EventNotFound { event_id })?;

        self.lifecycle.apply_admin_update(&mut event, &update, body.state_action, now)?;
        let saved = self.db.events.save(&mut *tx, &event).await?;
        tx.commit().await?;

        let target = format!("event:{}", saved.id);
        let action = body.state_action.map(|a| StateAction::from(a).as_str()).unwrap_or("edit");
        log_admin_action(action, Some(&target), Some(saved.status.as_str()));

        Ok(self.views.full_one(&saved).await)
    }

    pub async fn search_admin(&self, filter: AdminEventFilter) -> Result<Vec<EventFullDto>> {
        let events = self.db.events.search_admin(&filter).await?;
        info!(count = events.len(), "Admin event search");
        Ok(self.views.full(&events).await)
    }

    /// Public search; records a hit for `/events`
    pub async fn search_public(&self, filter: PublicEventFilter, client_ip: &str) -> Result<Vec<EventShortDto>> {
        let events = self.db.events.search_public(&filter).await?;
        self.record_hit("/events".to_string(), client_ip);
        info!(count = events.len(), "Public event search");

        let mut dtos = self.views.short(&events).await;
        if filter.sort == EventSort::Views {
            dtos.sort_by_key(|dto| dto.views);
        }
        Ok(dtos)
    }

    /// Public single read; records a hit for `/events/{id}`
    pub async fn get_published_event(&self, event_id: i64, client_ip: &str) -> Result<EventFullDto> {
        let event = self
            .db
            .events
            .find_published_by_id(event_id)
            .await?
            .ok_or(EventHubError::EventNotFound { event_id })?;

        self.record_hit(event.view_uri(), client_ip);
        Ok(self.views.public_full_one(&event).await)
    }

    async fn ensure_new_category(&self, update: &ValidatedUpdate) -> Result<()> {
        if let Some(category_id) = update.category_id {
            self.db.ensure_category(category_id).await?;
        }
        Ok(())
    }

    fn record_hit(&self, uri: String, client_ip: &str) {
        let hit = EndpointHit {
            app: self.app_name.clone(),
            uri,
            ip: client_ip.to_string(),
            timestamp: now_seconds(),
        };
        record_hit_in_background(self.counter.clone(), hit);
    }
}
