//! Event repository implementation

use sqlx::{PgConnection, PgPool};

use crate::models::event::{AdminEventFilter, CreateEventRequest, Event, EventSort, EventStatus, PublicEventFilter};
use crate::utils::errors::EventHubError;

const EVENT_COLUMNS: &str = "id, title, annotation, description, category_id, initiator_id, lat, lon, event_date, \
     paid, participant_limit, request_moderation, status, created_on, published_on, confirmed_requests";

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, request: CreateEventRequest) -> Result<Event, EventHubError> {
        let sql = format!(
            r#"
            INSERT INTO events (title, annotation, description, category_id, initiator_id, lat, lon, event_date,
                                paid, participant_limit, request_moderation, status, created_on, confirmed_requests)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 0)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );

        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(request.title)
            .bind(request.annotation)
            .bind(request.description)
            .bind(request.category_id)
            .bind(request.initiator_id)
            .bind(request.location.lat)
            .bind(request.location.lon)
            .bind(request.event_date)
            .bind(request.paid)
            .bind(request.participant_limit)
            .bind(request.request_moderation)
            .bind(EventStatus::Pending.as_str())
            .bind(request.created_on)
            .fetch_one(&self.pool)
            .await?;

        Ok(event)
    }

    /// Find event by ID, restricted to its initiator
    pub async fn find_by_id_and_initiator(&self, id: i64, initiator_id: i64) -> Result<Option<Event>, EventHubError> {
        let sql = format!("SELECT {} FROM events WHERE id = $1 AND initiator_id = $2", EVENT_COLUMNS);
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(initiator_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Find a published event by ID
    pub async fn find_published_by_id(&self, id: i64) -> Result<Option<Event>, EventHubError> {
        let sql = format!("SELECT {} FROM events WHERE id = $1 AND status = $2", EVENT_COLUMNS);
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(EventStatus::Published.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// List events of an initiator with pagination
    pub async fn find_by_initiator(&self, initiator_id: i64, from: i64, size: i64) -> Result<Vec<Event>, EventHubError> {
        let sql = format!(
            "SELECT {} FROM events WHERE initiator_id = $1 ORDER BY id ASC LIMIT $2 OFFSET $3",
            EVENT_COLUMNS
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(initiator_id)
            .bind(size)
            .bind(from)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    /// Load and row-lock an event for the rest of the transaction
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: i64) -> Result<Option<Event>, EventHubError> {
        let sql = format!("SELECT {} FROM events WHERE id = $1 FOR UPDATE", EVENT_COLUMNS);
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(event)
    }

    /// Persist every mutable field of an event
    pub async fn save(&self, conn: &mut PgConnection, event: &Event) -> Result<Event, EventHubError> {
        let sql = format!(
            r#"
            UPDATE events
            SET title = $2,
                annotation = $3,
                description = $4,
                category_id = $5,
                lat = $6,
                lon = $7,
                event_date = $8,
                paid = $9,
                participant_limit = $10,
                request_moderation = $11,
                status = $12,
                published_on = $13,
                confirmed_requests = $14
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );

        let saved = sqlx::query_as::<_, Event>(&sql)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.annotation)
            .bind(&event.description)
            .bind(event.category_id)
            .bind(event.location.lat)
            .bind(event.location.lon)
            .bind(event.event_date)
            .bind(event.paid)
            .bind(event.participant_limit)
            .bind(event.request_moderation)
            .bind(event.status.as_str())
            .bind(event.published_on)
            .bind(event.confirmed_requests)
            .fetch_one(&mut *conn)
            .await?;

        Ok(saved)
    }

    /// Composite admin search; absent filters match everything
    pub async fn search_admin(&self, filter: &AdminEventFilter) -> Result<Vec<Event>, EventHubError> {
        let sql = format!(
            r#"
            SELECT {} FROM events
            WHERE ($1::bigint[] IS NULL OR initiator_id = ANY($1))
              AND ($2::text[] IS NULL OR status = ANY($2))
              AND ($3::bigint[] IS NULL OR category_id = ANY($3))
              AND ($4::timestamptz IS NULL OR event_date >= $4)
              AND ($5::timestamptz IS NULL OR event_date <= $5)
            ORDER BY id ASC
            LIMIT $6 OFFSET $7
            "#,
            EVENT_COLUMNS
        );

        let statuses: Option<Vec<String>> = filter
            .statuses
            .as_ref()
            .map(|s| s.iter().map(|status| status.as_str().to_string()).collect());

        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(filter.initiators.as_deref())
            .bind(statuses)
            .bind(filter.categories.as_deref())
            .bind(filter.range_start)
            .bind(filter.range_end)
            .bind(filter.size)
            .bind(filter.from)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    /// Public search over published events
    pub async fn search_public(&self, filter: &PublicEventFilter) -> Result<Vec<Event>, EventHubError> {
        let order = match filter.sort {
            EventSort::EventDate => "event_date ASC, id ASC",
            EventSort::Views => "id ASC",
        };
        let sql = format!(
            r#"
            SELECT {} FROM events
            WHERE status = $1
              AND ($2::text IS NULL OR annotation ILIKE '%' || $2 || '%' OR description ILIKE '%' || $2 || '%')
              AND ($3::bigint[] IS NULL OR category_id = ANY($3))
              AND ($4::boolean IS NULL OR paid = $4)
              AND event_date >= $5
              AND ($6::timestamptz IS NULL OR event_date <= $6)
              AND (NOT $7 OR participant_limit = 0 OR confirmed_requests < participant_limit)
            ORDER BY {}
            LIMIT $8 OFFSET $9
            "#,
            EVENT_COLUMNS, order
        );

        let text = filter.text.as_deref().map(str::trim).filter(|t| !t.is_empty());

        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(EventStatus::Published.as_str())
            .bind(text)
            .bind(filter.categories.as_deref())
            .bind(filter.paid)
            .bind(filter.range_start)
            .bind(filter.range_end)
            .bind(filter.only_available)
            .bind(filter.size)
            .bind(filter.from)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }
}
