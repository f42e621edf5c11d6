//! Channel following repository.

use std::sync::Arc;

use crate::entities::{ChannelFollowing, channel_following};
use noteread_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

/// Repository for channel follows.
#[derive(Clone)]
pub struct ChannelFollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl ChannelFollowingRepository {
    /// Create a new channel following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get the IDs of channels a user follows.
    pub async fn find_channel_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        ChannelFollowing::find()
            .select_only()
            .column(channel_following::Column::ChannelId)
            .filter(channel_following::Column::UserId.eq(user_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
