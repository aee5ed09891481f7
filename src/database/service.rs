//! Database service layer
//!
//! Bundles the repositories over one pool and hands out transactions.

use sqlx::{Postgres, Transaction};

use crate::database::{CategoryRepository, DatabasePool, EventRepository, RequestRepository, UserRepository};
use crate::utils::errors::{EventHubError, Result};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub categories: CategoryRepository,
    pub events: EventRepository,
    pub requests: RequestRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            requests: RequestRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Start a transaction; dropping it without commit rolls back
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Fail with `UserNotFound` unless the user exists
    pub async fn ensure_user(&self, user_id: i64) -> Result<()> {
        if !self.users.exists(user_id).await? {
            return Err(EventHubError::UserNotFound { user_id });
        }
        Ok(())
    }

    /// Fail with `CategoryNotFound` unless the category exists
    pub async fn ensure_category(&self, category_id: i64) -> Result<()> {
        if !self.categories.exists(category_id).await? {
            return Err(EventHubError::CategoryNotFound { category_id });
        }
        Ok(())
    }
}
