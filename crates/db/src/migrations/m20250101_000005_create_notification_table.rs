//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notification::NotifieeId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::NotifierId).string_len(32))
                    .col(
                        ColumnDef::new(Notification::NotificationType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::NoteId).string_len(32))
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unread notifications by note, for read-marking from timelines
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_notifiee_note")
                    .table(Notification::Table)
                    .col(Notification::NotifieeId)
                    .col(Notification::NoteId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    NotifieeId,
    NotifierId,
    NotificationType,
    NoteId,
    IsRead,
    CreatedAt,
}
