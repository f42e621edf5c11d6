//! Create antenna and antenna_note tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Antenna::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Antenna::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Antenna::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Antenna::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Antenna::Src)
                            .string_len(16)
                            .not_null()
                            .default("all"),
                    )
                    .col(ColumnDef::new(Antenna::UserListId).string_len(32))
                    .col(
                        ColumnDef::new(Antenna::Keywords)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Antenna::ExcludeKeywords)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Antenna::Users)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Antenna::Instances)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Antenna::CaseSensitive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Antenna::WithReplies)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Antenna::WithFile)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Antenna::Notify)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Antenna::LocalOnly)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Antenna::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Antenna::CreatedAt)
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
                    .name("idx_antenna_user_id")
                    .table(Antenna::Table)
                    .col(Antenna::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AntennaNotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AntennaNotes::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AntennaNotes::AntennaId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AntennaNotes::NoteId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(AntennaNotes::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AntennaNotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_antenna_note_antenna")
                            .from(AntennaNotes::Table, AntennaNotes::AntennaId)
                            .to(Antenna::Table, Antenna::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_antenna_note_note")
                            .from(AntennaNotes::Table, AntennaNotes::NoteId)
                            .to(Note::Table, Note::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (antenna_id, note_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_antenna_note_unique")
                    .table(AntennaNotes::Table)
                    .col(AntennaNotes::AntennaId)
                    .col(AntennaNotes::NoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unread counts per antenna
        manager
            .create_index(
                Index::create()
                    .name("idx_antenna_note_antenna_is_read")
                    .table(AntennaNotes::Table)
                    .col(AntennaNotes::AntennaId)
                    .col(AntennaNotes::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AntennaNotes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Antenna::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Antenna {
    Table,
    Id,
    UserId,
    Name,
    Src,
    UserListId,
    Keywords,
    ExcludeKeywords,
    Users,
    Instances,
    CaseSensitive,
    WithReplies,
    WithFile,
    Notify,
    LocalOnly,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum AntennaNotes {
    #[iden = "antenna_note"]
    Table,
    Id,
    AntennaId,
    NoteId,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
}
