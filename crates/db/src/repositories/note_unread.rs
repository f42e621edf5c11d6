//! Note unread repository.

use std::sync::Arc;

use crate::entities::{NoteUnread, note_unread};
use noteread_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    TransactionTrait, sea_query::OnConflict,
};

/// Repository for the per-user unread ledger.
#[derive(Clone)]
pub struct NoteUnreadRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteUnreadRepository {
    /// Create a new note unread repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an unread record by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<note_unread::Model>> {
        NoteUnread::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an unread record unless one already exists for the same (user, note).
    ///
    /// Returns `true` when a row was written.
    pub async fn insert_if_absent(&self, model: note_unread::Model) -> AppResult<bool> {
        let active: note_unread::ActiveModel = model.into();

        let rows = NoteUnread::insert(active)
            .on_conflict(
                OnConflict::columns([note_unread::Column::UserId, note_unread::Column::NoteId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows > 0)
    }

    /// Delete a user's unread records for the given notes.
    ///
    /// Returns the records this call removed. The rows are locked before the
    /// delete, so concurrent callers never both report the same record.
    pub async fn delete_by_note_ids(
        &self,
        user_id: &str,
        note_ids: &[String],
    ) -> AppResult<Vec<note_unread::Model>> {
        if note_ids.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let existing = NoteUnread::find()
            .filter(note_unread::Column::UserId.eq(user_id))
            .filter(note_unread::Column::NoteId.is_in(note_ids.iter().cloned()))
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !existing.is_empty() {
            NoteUnread::delete_many()
                .filter(note_unread::Column::Id.is_in(existing.iter().map(|r| r.id.clone())))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(existing)
    }

    /// Count a user's unread mentions.
    pub async fn count_mentioned(&self, user_id: &str) -> AppResult<u64> {
        NoteUnread::find()
            .filter(note_unread::Column::UserId.eq(user_id))
            .filter(note_unread::Column::IsMentioned.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's unread specified notes.
    pub async fn count_specified(&self, user_id: &str) -> AppResult<u64> {
        NoteUnread::find()
            .filter(note_unread::Column::UserId.eq(user_id))
            .filter(note_unread::Column::IsSpecified.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's unread channel notes.
    pub async fn count_in_channels(&self, user_id: &str) -> AppResult<u64> {
        NoteUnread::find()
            .filter(note_unread::Column::UserId.eq(user_id))
            .filter(note_unread::Column::NoteChannelId.is_not_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
