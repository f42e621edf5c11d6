//! Note entity.
//!
//! Only the columns the unread pipeline reads are mapped here; the note
//! table itself is owned by the posting pipeline.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Note visibility levels.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Visibility {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "home")]
    Home,
    #[sea_orm(string_value = "followers")]
    Followers,
    #[sea_orm(string_value = "specified")]
    Specified,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "note")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Author's host (None for local users)
    #[sea_orm(nullable)]
    pub user_host: Option<String>,

    /// Note text content
    #[sea_orm(column_type = "Text", nullable)]
    pub text: Option<String>,

    /// Content warning
    #[sea_orm(nullable)]
    pub cw: Option<String>,

    /// Visibility level
    pub visibility: Visibility,

    /// Reply target note ID
    #[sea_orm(nullable, indexed)]
    pub reply_id: Option<String>,

    /// Thread root ID (None when this note is the root)
    #[sea_orm(nullable, indexed)]
    pub thread_id: Option<String>,

    /// Mentioned user IDs
    #[sea_orm(column_type = "JsonBinary")]
    pub mentions: Json,

    /// Users who can see this note (for visibility = specified)
    #[sea_orm(column_type = "JsonBinary")]
    pub visible_user_ids: Json,

    /// Attached file IDs
    #[sea_orm(column_type = "JsonBinary")]
    pub file_ids: Json,

    /// Channel ID (if posted to a channel)
    #[sea_orm(nullable, indexed)]
    pub channel_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::note_unread::Entity")]
    NoteUnreads,
    #[sea_orm(has_many = "super::antenna_note::Entity")]
    AntennaNotes,
}

impl Related<super::note_unread::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NoteUnreads.def()
    }
}

impl Related<super::antenna_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AntennaNotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
