//! Note thread muting entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's mute of a whole reply thread, keyed by the thread root note ID.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "note_thread_muting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who muted the thread.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Root note ID of the muted thread.
    #[sea_orm(indexed)]
    pub thread_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
