//! View count enrichment
//!
//! Decorates event projections with view counts from the [`ViewCounter`].
//! A failed stats call never fails the caller: every event then shows zero
//! views.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::models::event::{event_id_from_uri, Event, EventFullDto, EventShortDto};
use crate::models::stats::StatsQuery;
use crate::services::stats::ViewCounter;
use crate::utils::helpers::now_seconds;
use crate::utils::logging::log_stats_failure;

#[derive(Clone)]
pub struct ViewEnrichment {
    counter: Arc<dyn ViewCounter>,
}

impl ViewEnrichment {
    pub fn new(counter: Arc<dyn ViewCounter>) -> Self {
        Self { counter }
    }

    /// Unique-IP view counts keyed by event id, one stats call per batch
    pub async fn views_for(&self, events: &[Event]) -> HashMap<i64, i64> {
        let mut views: HashMap<i64, i64> = events.iter().map(|e| (e.id, 0)).collect();
        let Some(start) = events.iter().map(|e| e.created_on).min() else {
            return views;
        };

        let query = StatsQuery {
            start,
            end: now_seconds().max(start),
            uris: events.iter().map(Event::view_uri).collect(),
            unique: true,
        };

        match self.counter.stats(&query).await {
            Ok(rows) => {
                for row in rows {
                    if let Some(slot) = event_id_from_uri(&row.uri).and_then(|id| views.get_mut(&id)) {
                        *slot = row.hits;
                    }
                }
                debug!(events = events.len(), "View counts merged");
            }
            Err(e) => {
                let context = format!("{} events", events.len());
                log_stats_failure("stats", &e.to_string(), Some(&context));
            }
        }

        views
    }

    pub async fn views_of(&self, event: &Event) -> i64 {
        self.views_for(std::slice::from_ref(event))
            .await
            .get(&event.id)
            .copied()
            .unwrap_or(0)
    }

    pub async fn full(&self, events: &[Event]) -> Vec<EventFullDto> {
        let views = self.views_for(events).await;
        events
            .iter()
            .map(|e| EventFullDto::from_event(e, views.get(&e.id).copied().unwrap_or(0)))
            .collect()
    }

    pub async fn short(&self, events: &[Event]) -> Vec<EventShortDto> {
        let views = self.views_for(events).await;
        events
            .iter()
            .map(|e| EventShortDto::from_event(e, views.get(&e.id).copied().unwrap_or(0)))
            .collect()
    }

    pub async fn full_one(&self, event: &Event) -> EventFullDto {
        EventFullDto::from_event(event, self.views_of(event).await)
    }

    /// Public single read: the current read is counted on top of the stored views
    pub async fn public_full_one(&self, event: &Event) -> EventFullDto {
        EventFullDto::from_event(event, self.views_of(event).await + 1)
    }
}
