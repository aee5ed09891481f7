//! Participation request repository implementation

use sqlx::{PgConnection, PgPool};

use crate::models::request::{CreateParticipationRequest, ParticipationRequest, RequestStatus};
use crate::utils::errors::EventHubError;

const REQUEST_COLUMNS: &str = "id, event_id, requester_id, created, status";
const UNIQUE_REQUEST_CONSTRAINT: &str = "uq_request";

#[derive(Debug, Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a request inside the caller's transaction
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        request: CreateParticipationRequest,
    ) -> Result<ParticipationRequest, EventHubError> {
        let sql = format!(
            "INSERT INTO requests (event_id, requester_id, created, status) VALUES ($1, $2, $3, $4) RETURNING {}",
            REQUEST_COLUMNS
        );

        sqlx::query_as::<_, ParticipationRequest>(&sql)
            .bind(request.event_id)
            .bind(request.requester_id)
            .bind(request.created)
            .bind(request.status.as_str())
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() && db_err.constraint() == Some(UNIQUE_REQUEST_CONSTRAINT) {
                        return EventHubError::DuplicateRequest {
                            event_id: request.event_id,
                            requester_id: request.requester_id,
                        };
                    }
                }
                EventHubError::Database(e)
            })
    }

    /// Find request by ID
    pub async fn find_by_id(&self, conn: &mut PgConnection, id: i64) -> Result<Option<ParticipationRequest>, EventHubError> {
        let sql = format!("SELECT {} FROM requests WHERE id = $1 FOR UPDATE", REQUEST_COLUMNS);
        let request = sqlx::query_as::<_, ParticipationRequest>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(request)
    }

    /// All requests made by a user
    pub async fn find_by_requester(&self, requester_id: i64) -> Result<Vec<ParticipationRequest>, EventHubError> {
        let sql = format!("SELECT {} FROM requests WHERE requester_id = $1 ORDER BY id ASC", REQUEST_COLUMNS);
        let requests = sqlx::query_as::<_, ParticipationRequest>(&sql)
            .bind(requester_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    /// All requests for an event
    pub async fn find_by_event(&self, event_id: i64) -> Result<Vec<ParticipationRequest>, EventHubError> {
        let sql = format!("SELECT {} FROM requests WHERE event_id = $1 ORDER BY id ASC", REQUEST_COLUMNS);
        let requests = sqlx::query_as::<_, ParticipationRequest>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    /// Load and row-lock a set of requests; missing ids are simply absent
    pub async fn find_by_ids_for_update(
        &self,
        conn: &mut PgConnection,
        ids: &[i64],
    ) -> Result<Vec<ParticipationRequest>, EventHubError> {
        let sql = format!(
            "SELECT {} FROM requests WHERE id = ANY($1) ORDER BY id ASC FOR UPDATE",
            REQUEST_COLUMNS
        );
        let requests = sqlx::query_as::<_, ParticipationRequest>(&sql)
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;

        Ok(requests)
    }

    /// Whether the user already holds a request for the event
    pub async fn exists_for(&self, conn: &mut PgConnection, event_id: i64, requester_id: i64) -> Result<bool, EventHubError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM requests WHERE event_id = $1 AND requester_id = $2)"
        )
        .bind(event_id)
        .bind(requester_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(exists)
    }

    /// Number of CONFIRMED requests for the event
    pub async fn count_confirmed(&self, conn: &mut PgConnection, event_id: i64) -> Result<i64, EventHubError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests WHERE event_id = $1 AND status = $2")
            .bind(event_id)
            .bind(RequestStatus::Confirmed.as_str())
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    /// Persist a new status for one request
    pub async fn update_status(
        &self,
        conn: &mut PgConnection,
        id: i64,
        status: RequestStatus,
    ) -> Result<ParticipationRequest, EventHubError> {
        let sql = format!("UPDATE requests SET status = $2 WHERE id = $1 RETURNING {}", REQUEST_COLUMNS);
        let request = sqlx::query_as::<_, ParticipationRequest>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(&mut *conn)
            .await?;

        Ok(request)
    }
}
