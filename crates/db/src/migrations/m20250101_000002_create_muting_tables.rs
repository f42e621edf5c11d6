//! Create muting and note_thread_muting tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Muting::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Muting::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Muting::MuterId).string_len(32).not_null())
                    .col(ColumnDef::new(Muting::MuteeId).string_len(32).not_null())
                    .col(ColumnDef::new(Muting::ExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Muting::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (muter_id, mutee_id) - prevent duplicate mutes
        manager
            .create_index(
                Index::create()
                    .name("idx_muting_muter_mutee")
                    .table(Muting::Table)
                    .col(Muting::MuterId)
                    .col(Muting::MuteeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NoteThreadMuting::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NoteThreadMuting::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NoteThreadMuting::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NoteThreadMuting::ThreadId)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NoteThreadMuting::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, thread_id) - one mute per thread
        manager
            .create_index(
                Index::create()
                    .name("idx_note_thread_muting_user_thread")
                    .table(NoteThreadMuting::Table)
                    .col(NoteThreadMuting::UserId)
                    .col(NoteThreadMuting::ThreadId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NoteThreadMuting::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Muting::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Muting {
    Table,
    Id,
    MuterId,
    MuteeId,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
enum NoteThreadMuting {
    Table,
    Id,
    UserId,
    ThreadId,
    CreatedAt,
}
