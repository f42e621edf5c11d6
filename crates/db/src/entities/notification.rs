//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification types.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum NotificationType {
    #[sea_orm(string_value = "follow")]
    Follow,
    #[sea_orm(string_value = "mention")]
    Mention,
    #[sea_orm(string_value = "reply")]
    Reply,
    #[sea_orm(string_value = "renote")]
    Renote,
    #[sea_orm(string_value = "quote")]
    Quote,
    #[sea_orm(string_value = "reaction")]
    Reaction,
    #[sea_orm(string_value = "app")]
    App,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification
    #[sea_orm(indexed)]
    pub notifiee_id: String,

    /// The user who triggered the notification
    #[sea_orm(nullable)]
    pub notifier_id: Option<String>,

    /// Notification type
    pub notification_type: NotificationType,

    /// Related note ID
    #[sea_orm(nullable, indexed)]
    pub note_id: Option<String>,

    /// Has this notification been read?
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
