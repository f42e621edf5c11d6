//! Channel following entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Channel following - tracks which users follow which channels.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "channel_following")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The follower user ID.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// The channel being followed.
    #[sea_orm(indexed)]
    pub channel_id: String,

    /// When the follow was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
