//! User repository implementation
//!
//! Users are managed elsewhere; the event service only needs to know that
//! a referenced user exists.

use sqlx::PgPool;

use crate::utils::errors::EventHubError;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a user with this ID exists
    pub async fn exists(&self, id: i64) -> Result<bool, EventHubError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}
