//! Category repository implementation

use sqlx::PgPool;

use crate::utils::errors::EventHubError;

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a category with this ID exists
    pub async fn exists(&self, id: i64) -> Result<bool, EventHubError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}
