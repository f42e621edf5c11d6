//! Note repository.

use std::sync::Arc;

use crate::entities::{Note, note};
use noteread_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Note repository for database operations.
#[derive(Clone)]
pub struct NoteRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteRepository {
    /// Create a new note repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a note by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<note::Model>> {
        Note::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a note by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<note::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note not found: {id}")))
    }

    /// Find notes by IDs, newest first.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<note::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Note::find()
            .filter(note::Column::Id.is_in(ids.iter().cloned()))
            .order_by_desc(note::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
