//! Create following, channel_following and user_list_member tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Following::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Following::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Following::FollowerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Following::FolloweeId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Following::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_following_follower_followee")
                    .table(Following::Table)
                    .col(Following::FollowerId)
                    .col(Following::FolloweeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChannelFollowing::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChannelFollowing::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ChannelFollowing::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChannelFollowing::ChannelId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChannelFollowing::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_channel_following_user_channel")
                    .table(ChannelFollowing::Table)
                    .col(ChannelFollowing::UserId)
                    .col(ChannelFollowing::ChannelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserListMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserListMember::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserListMember::ListId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserListMember::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserListMember::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_list_member_list_user")
                    .table(UserListMember::Table)
                    .col(UserListMember::ListId)
                    .col(UserListMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserListMember::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChannelFollowing::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Following::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Following {
    Table,
    Id,
    FollowerId,
    FolloweeId,
    CreatedAt,
}

#[derive(Iden)]
enum ChannelFollowing {
    Table,
    Id,
    UserId,
    ChannelId,
    CreatedAt,
}

#[derive(Iden)]
enum UserListMember {
    Table,
    Id,
    ListId,
    UserId,
    CreatedAt,
}
