//! Antenna repository.

use std::collections::BTreeSet;
use std::sync::Arc;

use noteread_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};

use crate::entities::{Antenna, AntennaNotes, antenna, antenna_note};

/// Repository for antenna operations.
#[derive(Clone)]
pub struct AntennaRepository {
    db: Arc<DatabaseConnection>,
}

impl AntennaRepository {
    /// Create a new antenna repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ==================== Antenna Operations ====================

    /// Find all active antennas (for note matching).
    pub async fn find_all_active(&self) -> AppResult<Vec<antenna::Model>> {
        Antenna::find()
            .filter(antenna::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Antenna Note Operations ====================

    /// Mark the given notes as read in the given antennas.
    ///
    /// Returns the IDs of antennas that had at least one record flipped to
    /// read by this call. Unread rows are locked first, so a concurrent call
    /// sees them as already read.
    pub async fn mark_notes_read(
        &self,
        antenna_ids: &[String],
        note_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if antenna_ids.is_empty() || note_ids.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let unread = AntennaNotes::find()
            .filter(antenna_note::Column::AntennaId.is_in(antenna_ids.iter().cloned()))
            .filter(antenna_note::Column::NoteId.is_in(note_ids.iter().cloned()))
            .filter(antenna_note::Column::IsRead.eq(false))
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !unread.is_empty() {
            AntennaNotes::update_many()
                .col_expr(antenna_note::Column::IsRead, true.into())
                .filter(antenna_note::Column::Id.is_in(unread.iter().map(|r| r.id.clone())))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let touched: BTreeSet<String> = unread.into_iter().map(|r| r.antenna_id).collect();
        Ok(touched.into_iter().collect())
    }

    /// Count unread notes in an antenna.
    pub async fn count_unread_notes(&self, antenna_id: &str) -> AppResult<u64> {
        AntennaNotes::find()
            .filter(antenna_note::Column::AntennaId.eq(antenna_id))
            .filter(antenna_note::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether any of a user's antennas still has an unread note.
    pub async fn has_unread_for_user(&self, user_id: &str) -> AppResult<bool> {
        let found = AntennaNotes::find()
            .inner_join(Antenna)
            .filter(antenna::Column::UserId.eq(user_id))
            .filter(antenna_note::Column::IsRead.eq(false))
            .limit(1)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::antenna::AntennaSource;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn create_test_antenna(id: &str, user_id: &str, name: &str) -> antenna::Model {
        antenna::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            src: AntennaSource::All,
            user_list_id: None,
            keywords: json!([["test"]]),
            exclude_keywords: json!([]),
            users: json!([]),
            instances: json!([]),
            case_sensitive: false,
            with_replies: false,
            with_file: false,
            notify: false,
            local_only: false,
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_antenna_note(id: &str, antenna_id: &str, note_id: &str) -> antenna_note::Model {
        antenna_note::Model {
            id: id.to_string(),
            antenna_id: antenna_id.to_string(),
            note_id: note_id.to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_all_active() {
        let ant1 = create_test_antenna("ant1", "user1", "Antenna 1");
        let ant2 = create_test_antenna("ant2", "user2", "Antenna 2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ant1, ant2]])
                .into_connection(),
        );

        let repo = AntennaRepository::new(db);
        let result = repo.find_all_active().await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_notes_read_reports_touched_antennas() {
        let an1 = create_test_antenna_note("an1", "ant1", "note1");
        let an2 = create_test_antenna_note("an2", "ant1", "note2");
        let an3 = create_test_antenna_note("an3", "ant2", "note1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[an1, an2, an3]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = AntennaRepository::new(db);
        let touched = repo
            .mark_notes_read(
                &["ant1".to_string(), "ant2".to_string(), "ant3".to_string()],
                &["note1".to_string(), "note2".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(touched, vec!["ant1".to_string(), "ant2".to_string()]);
    }

    #[tokio::test]
    async fn test_mark_notes_read_already_read() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<antenna_note::Model>::new()])
                .into_connection(),
        );

        let repo = AntennaRepository::new(db);
        let touched = repo
            .mark_notes_read(&["ant1".to_string()], &["note1".to_string()])
            .await
            .unwrap();

        assert!(touched.is_empty());
    }

    #[tokio::test]
    async fn test_mark_notes_read_locks_rows_in_transaction() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_antenna_note("an1", "ant1", "note1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = AntennaRepository::new(Arc::clone(&db));
        repo.mark_notes_read(&["ant1".to_string()], &["note1".to_string()])
            .await
            .unwrap();
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);

        let statements = format!("{log:?}");
        assert!(statements.contains("FOR UPDATE"));
        assert!(statements.contains(" SET "));
    }

    #[tokio::test]
    async fn test_count_unread_notes() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(5))
                }]])
                .into_connection(),
        );

        let repo = AntennaRepository::new(db);
        assert_eq!(repo.count_unread_notes("ant1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_has_unread_for_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_antenna_note("an1", "ant1", "note1")]])
                .append_query_results([Vec::<antenna_note::Model>::new()])
                .into_connection(),
        );

        let repo = AntennaRepository::new(db);
        assert!(repo.has_unread_for_user("user1").await.unwrap());
        assert!(!repo.has_unread_for_user("user1").await.unwrap());
    }
}
