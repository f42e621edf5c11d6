//! Muting repository.

use std::sync::Arc;

use crate::entities::{Muting, muting};
use chrono::Utc;
use noteread_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

/// Muting repository for database operations.
#[derive(Clone)]
pub struct MutingRepository {
    db: Arc<DatabaseConnection>,
}

impl MutingRepository {
    /// Create a new muting repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get the IDs of users a user is currently muting.
    ///
    /// Expired mutes are not included.
    pub async fn find_active_mutee_ids(&self, muter_id: &str) -> AppResult<Vec<String>> {
        Muting::find()
            .select_only()
            .column(muting::Column::MuteeId)
            .filter(muting::Column::MuterId.eq(muter_id))
            .filter(
                Condition::any()
                    .add(muting::Column::ExpiresAt.is_null())
                    .add(muting::Column::ExpiresAt.gt(Utc::now().fixed_offset())),
            )
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_active_mutee_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "mutee_id" => sea_orm::Value::String(Some(Box::new("user2".to_string())))
                    },
                    maplit::btreemap! {
                        "mutee_id" => sea_orm::Value::String(Some(Box::new("user3".to_string())))
                    },
                ]])
                .into_connection(),
        );

        let repo = MutingRepository::new(db);
        let ids = repo.find_active_mutee_ids("user1").await.unwrap();

        assert_eq!(ids, vec!["user2".to_string(), "user3".to_string()]);
    }
}
