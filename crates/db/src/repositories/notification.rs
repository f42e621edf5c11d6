//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use noteread_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, UpdateResult};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Mark a user's unread notifications about the given notes as read.
    pub async fn mark_read_by_note_ids(&self, user_id: &str, note_ids: &[String]) -> AppResult<u64> {
        if note_ids.is_empty() {
            return Ok(0);
        }

        let result: UpdateResult = Notification::update_many()
            .filter(notification::Column::NotifieeId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .filter(notification::Column::NoteId.is_in(note_ids.iter().cloned()))
            .col_expr(notification::Column::IsRead, true.into())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
