//! Following repository.

use std::sync::Arc;

use crate::entities::{Following, following};
use noteread_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let count = Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_is_following() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert!(repo.is_following("user1", "user2").await.unwrap());
        assert!(!repo.is_following("user1", "user3").await.unwrap());
    }
}
