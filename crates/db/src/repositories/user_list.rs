//! User list repository.

use std::sync::Arc;

use crate::entities::{UserListMember, user_list_member};
use noteread_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

/// Repository for user list memberships.
#[derive(Clone)]
pub struct UserListRepository {
    db: Arc<DatabaseConnection>,
}

impl UserListRepository {
    /// Create a new user list repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check if a user is a member of a list.
    pub async fn is_member(&self, list_id: &str, user_id: &str) -> AppResult<bool> {
        let count = UserListMember::find()
            .filter(user_list_member::Column::ListId.eq(list_id))
            .filter(user_list_member::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }
}
