//! Mute filter for unread tracking.

use std::sync::Arc;

use noteread_common::AppResult;

use super::note_read::ReadableNote;
use super::stores::MuteDirectory;

/// Decides whether a delivered note is tracked as unread at all.
#[derive(Clone)]
pub struct MuteFilter {
    mutes: Arc<dyn MuteDirectory>,
}

impl MuteFilter {
    /// Create a new mute filter.
    #[must_use]
    pub const fn new(mutes: Arc<dyn MuteDirectory>) -> Self {
        Self { mutes }
    }

    /// Returns `false` if the user mutes the note's author or its thread.
    ///
    /// A note outside any thread is its own thread root.
    pub async fn should_track_unread(&self, user_id: &str, note: &ReadableNote) -> AppResult<bool> {
        let (muted_users, thread_muted) = futures::try_join!(
            self.mutes.muted_user_ids(user_id),
            self.mutes.is_thread_muted(user_id, note.thread_key()),
        )?;

        if muted_users.contains(&note.author.id) {
            return Ok(false);
        }

        Ok(!thread_muted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{InMemoryMutes, readable_note};

    #[tokio::test]
    async fn test_tracks_unmuted_note() {
        let filter = MuteFilter::new(Arc::new(InMemoryMutes::default()));
        let note = readable_note("note1", "author1");

        assert!(filter.should_track_unread("user1", &note).await.unwrap());
    }

    #[tokio::test]
    async fn test_muted_author_is_not_tracked() {
        let mutes = InMemoryMutes::default();
        mutes.mute_user("user1", "author1");
        let filter = MuteFilter::new(Arc::new(mutes));

        let note = readable_note("note1", "author1");
        assert!(!filter.should_track_unread("user1", &note).await.unwrap());

        // The mute belongs to user1 only
        assert!(filter.should_track_unread("user2", &note).await.unwrap());
    }

    #[tokio::test]
    async fn test_thread_mute_applies_to_replies() {
        let mutes = InMemoryMutes::default();
        mutes.mute_thread("user1", "root1");
        let filter = MuteFilter::new(Arc::new(mutes));

        let mut reply = readable_note("note2", "author1");
        reply.thread_id = Some("root1".to_string());
        assert!(!filter.should_track_unread("user1", &reply).await.unwrap());

        let root = readable_note("root1", "author1");
        assert!(!filter.should_track_unread("user1", &root).await.unwrap());

        let other = readable_note("note3", "author1");
        assert!(filter.should_track_unread("user1", &other).await.unwrap());
    }
}
