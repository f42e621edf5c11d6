//! Note thread muting repository.

use std::sync::Arc;

use crate::entities::{NoteThreadMuting, note_thread_muting};
use noteread_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Repository for thread mutes.
#[derive(Clone)]
pub struct NoteThreadMutingRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteThreadMutingRepository {
    /// Create a new thread muting repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's mute of the given thread.
    pub async fn find_by_user_and_thread(
        &self,
        user_id: &str,
        thread_id: &str,
    ) -> AppResult<Option<note_thread_muting::Model>> {
        NoteThreadMuting::find()
            .filter(note_thread_muting::Column::UserId.eq(user_id))
            .filter(note_thread_muting::Column::ThreadId.eq(thread_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_user_and_thread() {
        let mute = note_thread_muting::Model {
            id: "tm1".to_string(),
            user_id: "user1".to_string(),
            thread_id: "root1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mute.clone()]])
                .append_query_results([Vec::<note_thread_muting::Model>::new()])
                .into_connection(),
        );

        let repo = NoteThreadMutingRepository::new(db);
        assert_eq!(
            repo.find_by_user_and_thread("user1", "root1").await.unwrap(),
            Some(mute)
        );
        assert!(
            repo.find_by_user_and_thread("user1", "root2")
                .await
                .unwrap()
                .is_none()
        );
    }
}
