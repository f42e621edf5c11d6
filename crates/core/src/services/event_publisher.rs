//! Event publisher service.
//!
//! Provides an abstraction for publishing unread/read events to a user's
//! main stream and push channel. The Redis implementation lives in the
//! server crate.

use async_trait::async_trait;
use noteread_common::AppResult;
use noteread_db::entities::antenna;
use serde_json::{Value, json};
use std::sync::Arc;

/// Events emitted by the unread pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteReadEvent {
    /// A mention is still unread after the notice delay.
    UnreadMention { note_id: String },
    /// A specified (direct) note is still unread after the notice delay.
    UnreadSpecifiedNote { note_id: String },
    /// A note in a followed channel is still unread after the notice delay.
    UnreadChannel { note_id: String },
    /// The user's last unread mention was read.
    ReadAllUnreadMentions,
    /// The user's last unread specified note was read.
    ReadAllUnreadSpecifiedNotes,
    /// The user's last unread channel note was read.
    ReadAllChannels,
    /// An antenna has no unread notes left.
    ReadAntenna { antenna: antenna::Model },
    /// None of the user's antennas has unread notes left.
    ReadAllAntennas,
}

impl NoteReadEvent {
    /// Event name on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UnreadMention { .. } => "unreadMention",
            Self::UnreadSpecifiedNote { .. } => "unreadSpecifiedNote",
            Self::UnreadChannel { .. } => "unreadChannel",
            Self::ReadAllUnreadMentions => "readAllUnreadMentions",
            Self::ReadAllUnreadSpecifiedNotes => "readAllUnreadSpecifiedNotes",
            Self::ReadAllChannels => "readAllChannels",
            Self::ReadAntenna { .. } => "readAntenna",
            Self::ReadAllAntennas => "readAllAntennas",
        }
    }

    /// Payload published on the user's main stream.
    #[must_use]
    pub fn body(&self) -> Value {
        match self {
            Self::UnreadMention { note_id }
            | Self::UnreadSpecifiedNote { note_id }
            | Self::UnreadChannel { note_id } => Value::String(note_id.clone()),
            Self::ReadAntenna { antenna } => serde_json::to_value(antenna).unwrap_or_default(),
            Self::ReadAllUnreadMentions
            | Self::ReadAllUnreadSpecifiedNotes
            | Self::ReadAllChannels
            | Self::ReadAllAntennas => Value::Null,
        }
    }

    /// Payload sent as a push notification, if this event is pushed at all.
    #[must_use]
    pub fn push_body(&self) -> Option<Value> {
        match self {
            Self::ReadAntenna { antenna } => Some(json!({ "antennaId": antenna.id })),
            Self::ReadAllAntennas => Some(Value::Null),
            _ => None,
        }
    }
}

/// Trait for publishing unread pipeline events.
///
/// This allows the core services to publish events
/// without directly depending on the pubsub implementation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event on a user's main stream.
    async fn publish_main_stream(&self, user_id: &str, event: &NoteReadEvent) -> AppResult<()>;

    /// Send an event as a push notification to a user.
    async fn push_notification(&self, user_id: &str, event: &NoteReadEvent) -> AppResult<()>;

    /// Publish an event on the main stream, and as a push notification when
    /// the event carries a push payload.
    async fn publish(&self, user_id: &str, event: &NoteReadEvent) -> AppResult<()> {
        self.publish_main_stream(user_id, event).await?;
        if event.push_body().is_some() {
            self.push_notification(user_id, event).await?;
        }
        Ok(())
    }
}

/// A no-op implementation of `EventPublisher` for when real-time events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_main_stream(&self, _user_id: &str, _event: &NoteReadEvent) -> AppResult<()> {
        Ok(())
    }

    async fn push_notification(&self, _user_id: &str, _event: &NoteReadEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Type alias for a shared event publisher.
pub type EventPublisherService = Arc<dyn EventPublisher>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use noteread_db::entities::antenna::AntennaSource;

    fn test_antenna() -> antenna::Model {
        antenna::Model {
            id: "ant1".to_string(),
            user_id: "user1".to_string(),
            name: "News".to_string(),
            src: AntennaSource::All,
            user_list_id: None,
            keywords: json!([["rust"]]),
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

    #[test]
    fn test_unread_events_carry_note_id() {
        let event = NoteReadEvent::UnreadMention {
            note_id: "note1".to_string(),
        };
        assert_eq!(event.name(), "unreadMention");
        assert_eq!(event.body(), json!("note1"));
        assert!(event.push_body().is_none());
    }

    #[test]
    fn test_read_all_events_have_no_body() {
        assert_eq!(NoteReadEvent::ReadAllChannels.name(), "readAllChannels");
        assert_eq!(NoteReadEvent::ReadAllChannels.body(), Value::Null);
        assert!(NoteReadEvent::ReadAllUnreadMentions.push_body().is_none());
    }

    #[test]
    fn test_antenna_events_are_pushed() {
        let event = NoteReadEvent::ReadAntenna {
            antenna: test_antenna(),
        };
        assert_eq!(event.name(), "readAntenna");
        assert_eq!(event.body()["id"], json!("ant1"));
        assert_eq!(event.body()["userId"], json!("user1"));
        assert_eq!(event.push_body(), Some(json!({ "antennaId": "ant1" })));

        assert_eq!(NoteReadEvent::ReadAllAntennas.push_body(), Some(Value::Null));
    }
}
