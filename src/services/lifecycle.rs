//! Event lifecycle
//!
//! Enforces the event state machine and the field-update rules for the owner
//! and admin edit paths. Everything here is pure: callers load the event,
//! pass the current instant in, and persist the mutated event afterwards.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::config::LifecycleConfig;
use crate::models::event::{
    AdminStateAction, CreateEventRequest, Event, EventFieldsUpdate, EventStatus, Location, NewEventDto,
    StateAction, UserStateAction,
};
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::{format_timestamp, parse_timestamp};
use crate::utils::validation;

/// Field edits that passed shape validation
#[derive(Debug, Clone, Default)]
pub struct ValidatedUpdate {
    pub title: Option<String>,
    pub annotation: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub location: Option<Location>,
    pub event_date: Option<DateTime<Utc>>,
    pub paid: Option<bool>,
    pub participant_limit: Option<i32>,
    pub request_moderation: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct EventLifecycle {
    event_lead_time: Duration,
    publication_lead_time: Duration,
}

impl EventLifecycle {
    pub fn new(config: &LifecycleConfig) -> Self {
        Self::with_lead_times(
            Duration::hours(config.event_lead_time_hours),
            Duration::hours(config.publication_lead_time_hours),
        )
    }

    pub fn with_lead_times(event_lead_time: Duration, publication_lead_time: Duration) -> Self {
        Self {
            event_lead_time,
            publication_lead_time,
        }
    }

    /// Validate a new event and build the insert request.
    ///
    /// The event starts PENDING with no confirmed requests.
    pub fn prepare_new_event(&self, initiator_id: i64, dto: &NewEventDto, now: DateTime<Utc>) -> Result<CreateEventRequest> {
        validation::validate_title(Some(&dto.title))?;
        validation::validate_annotation(Some(&dto.annotation))?;
        validation::validate_description(Some(&dto.description))?;
        validation::validate_participant_limit(dto.participant_limit)?;
        validation::validate_location(dto.location.lat, dto.location.lon)?;

        let event_date = parse_timestamp(&dto.event_date)?;
        self.check_event_date(event_date, now)?;

        Ok(CreateEventRequest {
            title: dto.title.clone(),
            annotation: dto.annotation.clone(),
            description: dto.description.clone(),
            category_id: dto.category,
            initiator_id,
            location: dto.location,
            event_date,
            paid: dto.paid.unwrap_or(false),
            participant_limit: dto.participant_limit.unwrap_or(0),
            request_moderation: dto.request_moderation.unwrap_or(true),
            created_on: now,
        })
    }

    /// Shape-check an edit before the event is loaded
    pub fn validate_update(&self, fields: &EventFieldsUpdate, now: DateTime<Utc>) -> Result<ValidatedUpdate> {
        validation::validate_title(fields.title.as_deref())?;
        validation::validate_annotation(fields.annotation.as_deref())?;
        validation::validate_description(fields.description.as_deref())?;
        validation::validate_participant_limit(fields.participant_limit)?;
        if let Some(location) = fields.location {
            validation::validate_location(location.lat, location.lon)?;
        }

        let event_date = match fields.event_date.as_deref() {
            Some(raw) => {
                let date = parse_timestamp(raw)?;
                self.check_event_date(date, now)?;
                Some(date)
            }
            None => None,
        };

        Ok(ValidatedUpdate {
            title: fields.title.clone(),
            annotation: fields.annotation.clone(),
            description: fields.description.clone(),
            category_id: fields.category,
            location: fields.location,
            event_date,
            paid: fields.paid,
            participant_limit: fields.participant_limit,
            request_moderation: fields.request_moderation,
        })
    }

    /// Owner edit: only allowed while the event is not published
    pub fn apply_owner_update(
        &self,
        event: &mut Event,
        update: &ValidatedUpdate,
        action: Option<UserStateAction>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if event.status == EventStatus::Published {
            warn!(event_id = event.id, "Owner attempted to edit a published event");
            return Err(EventHubError::EventAlreadyPublished { event_id: event.id });
        }

        apply_fields(event, update)?;

        if let Some(action) = action {
            self.apply_action(event, action.into(), now)?;
        }

        Ok(())
    }

    /// Admin edit: fields may change in any state, state actions keep their preconditions
    pub fn apply_admin_update(
        &self,
        event: &mut Event,
        update: &ValidatedUpdate,
        action: Option<AdminStateAction>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        apply_fields(event, update)?;

        if let Some(action) = action {
            self.apply_action(event, action.into(), now)?;
        }

        Ok(())
    }

    /// Run a state action through the transition table
    pub fn apply_action(&self, event: &mut Event, action: StateAction, now: DateTime<Utc>) -> Result<()> {
        debug!(event_id = event.id, status = %event.status, action = %action, "Applying state action");

        let next = event.status.transition(action).map_err(|e| EventHubError::InvalidStateTransition {
            from: e.from.to_string(),
            to: e.action.to_string(),
        })?;

        if action == StateAction::PublishEvent {
            if event.event_date < now + self.publication_lead_time {
                warn!(
                    event_id = event.id,
                    event_date = %format_timestamp(event.event_date),
                    "Event date too close for publication"
                );
                return Err(EventHubError::PublicationTooSoon {
                    event_id: event.id,
                    event_date: event.event_date,
                    lead_hours: self.publication_lead_time.num_hours(),
                });
            }
            event.published_on = Some(now);
        }

        event.status = next;
        Ok(())
    }

    fn check_event_date(&self, event_date: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        if event_date < now + self.event_lead_time {
            return Err(EventHubError::validation(format!(
                "Field: eventDate. Error: must be at least {} hours in the future. Value: {}",
                self.event_lead_time.num_hours(),
                format_timestamp(event_date)
            )));
        }
        Ok(())
    }
}

fn apply_fields(event: &mut Event, update: &ValidatedUpdate) -> Result<()> {
    if let Some(limit) = update.participant_limit {
        if limit > 0 && i64::from(limit) < event.confirmed_requests {
            return Err(EventHubError::LimitBelowConfirmed {
                event_id: event.id,
                limit,
                confirmed: event.confirmed_requests,
            });
        }
    }

    if let Some(title) = &update.title {
        event.title = title.clone();
    }
    if let Some(annotation) = &update.annotation {
        event.annotation = annotation.clone();
    }
    if let Some(description) = &update.description {
        event.description = description.clone();
    }
    if let Some(category_id) = update.category_id {
        event.category_id = category_id;
    }
    if let Some(location) = update.location {
        event.location = location;
    }
    if let Some(event_date) = update.event_date {
        event.event_date = event_date;
    }
    if let Some(paid) = update.paid {
        event.paid = paid;
    }
    if let Some(limit) = update.participant_limit {
        event.participant_limit = limit;
    }
    if let Some(moderation) = update.request_moderation {
        event.request_moderation = moderation;
    }
    Ok(())
}
