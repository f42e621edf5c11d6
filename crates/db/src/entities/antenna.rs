//! Antenna entity for filtered note streams.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which authors an antenna considers before keywords are applied.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AntennaSource {
    /// Match notes from the owner and the users they follow.
    #[sea_orm(string_value = "home")]
    Home,
    /// Any author.
    #[sea_orm(string_value = "all")]
    All,
    /// Authors listed in `users`.
    #[sea_orm(string_value = "users")]
    Users,
    /// Members of `user_list_id`.
    #[sea_orm(string_value = "list")]
    List,
    /// Authors whose host is listed in `instances`.
    #[sea_orm(string_value = "instances")]
    Instances,
}

/// Antenna entity - a saved filter continuously matched against incoming notes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "antenna")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner; only the owner's reads clear this antenna's ledger.
    #[sea_orm(indexed)]
    pub user_id: String,

    pub name: String,

    pub src: AntennaSource,

    /// Consulted when `src` is `list`.
    #[sea_orm(nullable)]
    pub user_list_id: Option<String>,

    /// `[["foo", "bar"], ["baz"]]` reads as `(foo AND bar) OR baz`.
    #[sea_orm(column_type = "JsonBinary")]
    pub keywords: Json,

    /// Any matching group vetoes the note.
    #[sea_orm(column_type = "JsonBinary")]
    pub exclude_keywords: Json,

    #[sea_orm(column_type = "JsonBinary")]
    pub users: Json,

    #[sea_orm(column_type = "JsonBinary")]
    pub instances: Json,

    #[sea_orm(default_value = false)]
    pub case_sensitive: bool,

    #[sea_orm(default_value = false)]
    pub with_replies: bool,

    /// Require at least one attachment.
    #[sea_orm(default_value = false)]
    pub with_file: bool,

    #[sea_orm(default_value = false)]
    pub notify: bool,

    /// Reject notes from remote authors.
    #[sea_orm(default_value = false)]
    pub local_only: bool,

    /// Inactive antennas never match.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::antenna_note::Entity")]
    AntennaNotes,
}

impl Related<super::antenna_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AntennaNotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
