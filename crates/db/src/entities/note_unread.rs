//! Note unread entity - one outstanding unread marker per (user, note).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An unread marker for a note delivered to a user as a mention, a
/// specified (direct) note, or a followed-channel note.
///
/// `is_specified` and `is_mentioned` are never both set. Channel membership
/// is orthogonal and recorded through `note_channel_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "note_unread")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who has not read the note yet.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// The unread note.
    #[sea_orm(indexed)]
    pub note_id: String,

    /// Author of the note (denormalized for filtering).
    pub note_user_id: String,

    /// Whether the note was addressed to the user as a specified note.
    #[sea_orm(default_value = false)]
    pub is_specified: bool,

    /// Whether the note mentions the user.
    #[sea_orm(default_value = false)]
    pub is_mentioned: bool,

    /// Channel of the note (denormalized for filtering).
    #[sea_orm(nullable)]
    pub note_channel_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::note::Entity",
        from = "Column::NoteId",
        to = "super::note::Column::Id",
        on_delete = "Cascade"
    )]
    Note,
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Note.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
