//! Database migrations.
//!
//! Schema migrations for the tables the unread pipeline reads and writes.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_note_table;
mod m20250101_000002_create_muting_tables;
mod m20250101_000003_create_following_tables;
mod m20250101_000004_create_antenna_tables;
mod m20250101_000005_create_notification_table;
mod m20250101_000006_create_note_unread_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_note_table::Migration),
            Box::new(m20250101_000002_create_muting_tables::Migration),
            Box::new(m20250101_000003_create_following_tables::Migration),
            Box::new(m20250101_000004_create_antenna_tables::Migration),
            Box::new(m20250101_000005_create_notification_table::Migration),
            Box::new(m20250101_000006_create_note_unread_table::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_order() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 6);
    }
}
