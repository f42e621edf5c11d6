//! User list member entity.

use sea_orm::entity::prelude::*;

/// User list member entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_list_member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The list this member belongs to.
    #[sea_orm(indexed)]
    pub list_id: String,

    /// The user who is a member.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// When the member was added.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
