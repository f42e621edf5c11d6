//! Create note_unread table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NoteUnread::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NoteUnread::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NoteUnread::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(NoteUnread::NoteId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(NoteUnread::NoteUserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NoteUnread::IsSpecified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(NoteUnread::IsMentioned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(NoteUnread::NoteChannelId).string_len(32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_unread_note")
                            .from(NoteUnread::Table, NoteUnread::NoteId)
                            .to(Note::Table, Note::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, note_id) - insert-or-ignore target
        manager
            .create_index(
                Index::create()
                    .name("idx_note_unread_user_note")
                    .table(NoteUnread::Table)
                    .col(NoteUnread::UserId)
                    .col(NoteUnread::NoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Category counts
        for (name, column) in [
            ("idx_note_unread_user_mentioned", NoteUnread::IsMentioned),
            ("idx_note_unread_user_specified", NoteUnread::IsSpecified),
            ("idx_note_unread_user_channel", NoteUnread::NoteChannelId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(NoteUnread::Table)
                        .col(NoteUnread::UserId)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NoteUnread::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum NoteUnread {
    Table,
    Id,
    UserId,
    NoteId,
    NoteUserId,
    IsSpecified,
    IsMentioned,
    NoteChannelId,
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
}
