//! Note read command worker.

use noteread_common::AppResult;
use noteread_core::{NoteReadService, ReadableNote, UnreadFlags};
use noteread_db::repositories::NoteRepository;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pubsub::CommandSubscriber;

/// Commands accepted on the command channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NoteReadCommand {
    /// A note was delivered to a user.
    #[serde(rename_all = "camelCase")]
    NoteDelivered {
        user_id: String,
        note_id: String,
        #[serde(default)]
        is_specified: bool,
        #[serde(default)]
        is_mentioned: bool,
    },
    /// A user has seen these notes.
    #[serde(rename_all = "camelCase")]
    NotesRead {
        user_id: String,
        note_ids: Vec<String>,
    },
}

/// Feeds commands into the note read service.
#[derive(Clone)]
pub struct NoteReadWorker {
    service: NoteReadService,
    note_repo: NoteRepository,
}

impl NoteReadWorker {
    /// Create a new worker.
    #[must_use]
    pub const fn new(service: NoteReadService, note_repo: NoteRepository) -> Self {
        Self { service, note_repo }
    }

    /// Handle a single command.
    pub async fn handle(&self, command: NoteReadCommand) -> AppResult<()> {
        match command {
            NoteReadCommand::NoteDelivered {
                user_id,
                note_id,
                is_specified,
                is_mentioned,
            } => {
                let note = self.note_repo.get_by_id(&note_id).await?;
                self.service
                    .insert_note_unread(
                        &user_id,
                        &ReadableNote::from(&note),
                        UnreadFlags {
                            is_specified,
                            is_mentioned,
                        },
                    )
                    .await
            }
            NoteReadCommand::NotesRead { user_id, note_ids } => {
                let notes: Vec<ReadableNote> = self
                    .note_repo
                    .find_by_ids(&note_ids)
                    .await?
                    .iter()
                    .map(ReadableNote::from)
                    .collect();

                if notes.is_empty() {
                    debug!(user_id = %user_id, "No known notes to mark read");
                    return Ok(());
                }

                self.service.read(&user_id, &notes, None).await
            }
        }
    }

    /// Consume commands until `shutdown` is cancelled or the subscription ends.
    pub async fn run(self, subscriber: CommandSubscriber, shutdown: CancellationToken) {
        let mut messages = subscriber.messages();
        info!("Note read worker started");

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                message = messages.recv() => match message {
                    Ok(message) => {
                        let Some(payload) = message.value.as_string() else {
                            warn!("Ignoring non-string command payload");
                            continue;
                        };
                        self.dispatch(&payload).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Command subscriber lagged, commands dropped");
                    }
                    Err(RecvError::Closed) => {
                        warn!("Command stream closed");
                        break;
                    }
                },
            }
        }

        if let Err(e) = subscriber.close().await {
            warn!(error = %e, "Failed to close command subscription");
        }
        info!("Note read worker stopped");
    }

    async fn dispatch(&self, payload: &str) {
        let command = match serde_json::from_str::<NoteReadCommand>(payload) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "Failed to parse note read command");
                return;
            }
        };

        if let Err(e) = self.handle(command).await {
            e.log("Failed to handle note read command");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use noteread_common::AppError;
    use noteread_core::UnreadCategory;
    use noteread_core::test_utils::{InMemoryStores, RecordingEventPublisher};
    use noteread_db::entities::note::{self, Visibility};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn create_test_note(id: &str, user_id: &str, mentions: &[&str]) -> note::Model {
        note::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            user_host: None,
            text: Some("hello".to_string()),
            cw: None,
            visibility: Visibility::Public,
            reply_id: None,
            thread_id: None,
            mentions: json!(mentions),
            visible_user_ids: json!([]),
            file_ids: json!([]),
            channel_id: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_worker(
        db: MockDatabase,
        stores: &InMemoryStores,
    ) -> (NoteReadWorker, Arc<RecordingEventPublisher>) {
        let publisher = Arc::new(RecordingEventPublisher::default());
        let service = NoteReadService::new(
            stores.stores(),
            publisher.clone(),
            Duration::from_millis(2000),
        );
        let worker = NoteReadWorker::new(
            service,
            NoteRepository::new(Arc::new(db.into_connection())),
        );
        (worker, publisher)
    }

    #[test]
    fn test_parse_note_delivered() {
        let command: NoteReadCommand = serde_json::from_str(
            r#"{"type":"noteDelivered","userId":"alice","noteId":"note1","isMentioned":true}"#,
        )
        .unwrap();

        assert_eq!(
            command,
            NoteReadCommand::NoteDelivered {
                user_id: "alice".to_string(),
                note_id: "note1".to_string(),
                is_specified: false,
                is_mentioned: true,
            }
        );
    }

    #[test]
    fn test_parse_notes_read() {
        let command: NoteReadCommand = serde_json::from_str(
            r#"{"type":"notesRead","userId":"alice","noteIds":["note1","note2"]}"#,
        )
        .unwrap();

        assert_eq!(
            command,
            NoteReadCommand::NotesRead {
                user_id: "alice".to_string(),
                note_ids: vec!["note1".to_string(), "note2".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_unknown_command_fails() {
        assert!(serde_json::from_str::<NoteReadCommand>(r#"{"type":"noteDeleted"}"#).is_err());
    }

    #[tokio::test]
    async fn test_delivered_then_read() {
        let stores = InMemoryStores::default();
        let note = create_test_note("note1", "bob", &["alice"]);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[note.clone()]])
            .append_query_results([[note]]);
        let (worker, publisher) = create_worker(db, &stores);

        worker
            .handle(NoteReadCommand::NoteDelivered {
                user_id: "alice".to_string(),
                note_id: "note1".to_string(),
                is_specified: false,
                is_mentioned: true,
            })
            .await
            .unwrap();
        assert_eq!(stores.unreads.count_for("alice", UnreadCategory::Mentioned), 1);

        worker
            .handle(NoteReadCommand::NotesRead {
                user_id: "alice".to_string(),
                note_ids: vec!["note1".to_string()],
            })
            .await
            .unwrap();

        assert!(stores.unreads.all().is_empty());
        assert_eq!(
            publisher.stream_event_names("alice"),
            vec!["readAllUnreadMentions"]
        );
    }

    #[tokio::test]
    async fn test_delivered_unknown_note() {
        let stores = InMemoryStores::default();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<note::Model>::new()]);
        let (worker, _publisher) = create_worker(db, &stores);

        let result = worker
            .handle(NoteReadCommand::NoteDelivered {
                user_id: "alice".to_string(),
                note_id: "missing".to_string(),
                is_specified: false,
                is_mentioned: true,
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(stores.unreads.all().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_ignores_malformed_payload() {
        let stores = InMemoryStores::default();
        let (worker, publisher) =
            create_worker(MockDatabase::new(DatabaseBackend::Postgres), &stores);

        worker.dispatch("not json").await;

        assert!(stores.unreads.all().is_empty());
        assert!(publisher.stream_events("alice").is_empty());
    }
}
