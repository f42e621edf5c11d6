//! Create note table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Note::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Note::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Note::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Note::UserHost).string_len(256))
                    .col(ColumnDef::new(Note::Text).text())
                    .col(ColumnDef::new(Note::Cw).string_len(512))
                    .col(
                        ColumnDef::new(Note::Visibility)
                            .string_len(16)
                            .not_null()
                            .default("public"),
                    )
                    .col(ColumnDef::new(Note::ReplyId).string_len(32))
                    .col(ColumnDef::new(Note::ThreadId).string_len(32))
                    .col(
                        ColumnDef::new(Note::Mentions)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Note::VisibleUserIds)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Note::FileIds)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Note::ChannelId).string_len(32))
                    .col(
                        ColumnDef::new(Note::CreatedAt)
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
                    .name("idx_note_user_id")
                    .table(Note::Table)
                    .col(Note::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_note_thread_id")
                    .table(Note::Table)
                    .col(Note::ThreadId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_note_channel_id")
                    .table(Note::Table)
                    .col(Note::ChannelId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Note::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
    UserId,
    UserHost,
    Text,
    Cw,
    Visibility,
    ReplyId,
    ThreadId,
    Mentions,
    VisibleUserIds,
    FileIds,
    ChannelId,
    CreatedAt,
}
