//! Store interfaces consumed by the unread pipeline.
//!
//! Each trait is implemented against the database repositories below; the
//! `test_utils` module provides in-memory implementations.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use noteread_common::AppResult;
use noteread_db::entities::{antenna, note_unread};
use noteread_db::repositories::{
    AntennaRepository, ChannelFollowingRepository, FollowingRepository, MutingRepository,
    NoteThreadMutingRepository, NoteUnreadRepository, NotificationRepository, UserListRepository,
};
use sea_orm::DatabaseConnection;

use super::antenna::DbAntennaDirectory;
use super::event_publisher::NoteReadEvent;
use super::note_read::{NoteAuthor, ReadableNote};

/// Unread ledger categories with an "all read" event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnreadCategory {
    /// The user was mentioned.
    Mentioned,
    /// The note was addressed to the user.
    Specified,
    /// The note was posted in a channel.
    Channel,
}

impl UnreadCategory {
    /// All categories, in the order their all-read checks run.
    pub const ALL: [Self; 3] = [Self::Mentioned, Self::Specified, Self::Channel];

    /// Whether a record counts towards this category.
    #[must_use]
    pub const fn contains(self, record: &note_unread::Model) -> bool {
        match self {
            Self::Mentioned => record.is_mentioned,
            Self::Specified => record.is_specified,
            Self::Channel => record.note_channel_id.is_some(),
        }
    }

    /// Event published when this category drains to zero.
    #[must_use]
    pub const fn all_read_event(self) -> NoteReadEvent {
        match self {
            Self::Mentioned => NoteReadEvent::ReadAllUnreadMentions,
            Self::Specified => NoteReadEvent::ReadAllUnreadSpecifiedNotes,
            Self::Channel => NoteReadEvent::ReadAllChannels,
        }
    }
}

/// Mutes that gate unread tracking.
#[async_trait]
pub trait MuteDirectory: Send + Sync {
    /// IDs of users the given user currently mutes.
    async fn muted_user_ids(&self, muter_id: &str) -> AppResult<Vec<String>>;

    /// Whether the user muted the thread.
    async fn is_thread_muted(&self, user_id: &str, thread_id: &str) -> AppResult<bool>;
}

/// Per-user unread ledger.
#[async_trait]
pub trait NoteUnreadStore: Send + Sync {
    /// Insert a record; returns `false` when one already exists for the same (user, note).
    async fn insert(&self, record: note_unread::Model) -> AppResult<bool>;

    /// Find a record by ID.
    async fn find(&self, id: &str) -> AppResult<Option<note_unread::Model>>;

    /// Delete a user's records for the given notes, returning the removed records.
    async fn delete_by_note_ids(
        &self,
        user_id: &str,
        note_ids: &[String],
    ) -> AppResult<Vec<note_unread::Model>>;

    /// Count a user's records in a category.
    async fn count(&self, user_id: &str, category: UnreadCategory) -> AppResult<u64>;
}

/// Channel follow lookups.
#[async_trait]
pub trait ChannelFollowingDirectory: Send + Sync {
    /// IDs of channels the user follows.
    async fn followed_channel_ids(&self, user_id: &str) -> AppResult<HashSet<String>>;
}

/// Antenna lookups and matching.
#[async_trait]
pub trait AntennaDirectory: Send + Sync {
    /// All active antennas.
    async fn list_antennas(&self) -> AppResult<Vec<antenna::Model>>;

    /// Whether the antenna accepts the note.
    async fn matches(
        &self,
        antenna: &antenna::Model,
        note: &ReadableNote,
        author: &NoteAuthor,
    ) -> AppResult<bool>;
}

/// Per-antenna unread ledger.
#[async_trait]
pub trait AntennaNoteStore: Send + Sync {
    /// Mark notes read in the given antennas; returns the antennas that had records flipped.
    async fn mark_read(&self, antenna_ids: &[String], note_ids: &[String])
    -> AppResult<Vec<String>>;

    /// Count unread notes in an antenna.
    async fn count_unread(&self, antenna_id: &str) -> AppResult<u64>;

    /// Whether any of the user's antennas has an unread note.
    async fn has_any_unread(&self, user_id: &str) -> AppResult<bool>;
}

/// Notification read-marking.
#[async_trait]
pub trait NotificationReader: Send + Sync {
    /// Mark the user's notifications about the given notes as read.
    async fn mark_read_by_note_ids(&self, user_id: &str, note_ids: &[String]) -> AppResult<u64>;
}

/// Every store the note read service consumes.
#[derive(Clone)]
pub struct NoteReadStores {
    /// User and thread mutes.
    pub mutes: Arc<dyn MuteDirectory>,
    /// Unread ledger.
    pub unreads: Arc<dyn NoteUnreadStore>,
    /// Channel follows.
    pub channels: Arc<dyn ChannelFollowingDirectory>,
    /// Antennas and their match predicate.
    pub antennas: Arc<dyn AntennaDirectory>,
    /// Antenna unread ledger.
    pub antenna_notes: Arc<dyn AntennaNoteStore>,
    /// Notifications.
    pub notifications: Arc<dyn NotificationReader>,
}

impl NoteReadStores {
    /// Build the database-backed stores.
    #[must_use]
    pub fn from_db(db: &Arc<DatabaseConnection>, antenna_cache_ttl: Duration) -> Self {
        let antenna_repo = AntennaRepository::new(Arc::clone(db));

        Self {
            mutes: Arc::new(DbMuteDirectory::new(
                MutingRepository::new(Arc::clone(db)),
                NoteThreadMutingRepository::new(Arc::clone(db)),
            )),
            unreads: Arc::new(NoteUnreadRepository::new(Arc::clone(db))),
            channels: Arc::new(ChannelFollowingRepository::new(Arc::clone(db))),
            antennas: Arc::new(DbAntennaDirectory::new(
                antenna_repo.clone(),
                FollowingRepository::new(Arc::clone(db)),
                UserListRepository::new(Arc::clone(db)),
                antenna_cache_ttl,
            )),
            antenna_notes: Arc::new(antenna_repo),
            notifications: Arc::new(NotificationRepository::new(Arc::clone(db))),
        }
    }
}

// ==================== Database adapters ====================

/// Mute directory backed by the muting tables.
#[derive(Clone)]
pub struct DbMuteDirectory {
    muting_repo: MutingRepository,
    thread_muting_repo: NoteThreadMutingRepository,
}

impl DbMuteDirectory {
    /// Create a new database mute directory.
    #[must_use]
    pub const fn new(
        muting_repo: MutingRepository,
        thread_muting_repo: NoteThreadMutingRepository,
    ) -> Self {
        Self {
            muting_repo,
            thread_muting_repo,
        }
    }
}

#[async_trait]
impl MuteDirectory for DbMuteDirectory {
    async fn muted_user_ids(&self, muter_id: &str) -> AppResult<Vec<String>> {
        self.muting_repo.find_active_mutee_ids(muter_id).await
    }

    async fn is_thread_muted(&self, user_id: &str, thread_id: &str) -> AppResult<bool> {
        Ok(self
            .thread_muting_repo
            .find_by_user_and_thread(user_id, thread_id)
            .await?
            .is_some())
    }
}

#[async_trait]
impl NoteUnreadStore for NoteUnreadRepository {
    async fn insert(&self, record: note_unread::Model) -> AppResult<bool> {
        self.insert_if_absent(record).await
    }

    async fn find(&self, id: &str) -> AppResult<Option<note_unread::Model>> {
        self.find_by_id(id).await
    }

    async fn delete_by_note_ids(
        &self,
        user_id: &str,
        note_ids: &[String],
    ) -> AppResult<Vec<note_unread::Model>> {
        Self::delete_by_note_ids(self, user_id, note_ids).await
    }

    async fn count(&self, user_id: &str, category: UnreadCategory) -> AppResult<u64> {
        match category {
            UnreadCategory::Mentioned => self.count_mentioned(user_id).await,
            UnreadCategory::Specified => self.count_specified(user_id).await,
            UnreadCategory::Channel => self.count_in_channels(user_id).await,
        }
    }
}

#[async_trait]
impl ChannelFollowingDirectory for ChannelFollowingRepository {
    async fn followed_channel_ids(&self, user_id: &str) -> AppResult<HashSet<String>> {
        Ok(self.find_channel_ids(user_id).await?.into_iter().collect())
    }
}

#[async_trait]
impl AntennaNoteStore for AntennaRepository {
    async fn mark_read(
        &self,
        antenna_ids: &[String],
        note_ids: &[String],
    ) -> AppResult<Vec<String>> {
        self.mark_notes_read(antenna_ids, note_ids).await
    }

    async fn count_unread(&self, antenna_id: &str) -> AppResult<u64> {
        self.count_unread_notes(antenna_id).await
    }

    async fn has_any_unread(&self, user_id: &str) -> AppResult<bool> {
        self.has_unread_for_user(user_id).await
    }
}

#[async_trait]
impl NotificationReader for NotificationRepository {
    async fn mark_read_by_note_ids(&self, user_id: &str, note_ids: &[String]) -> AppResult<u64> {
        Self::mark_read_by_note_ids(self, user_id, note_ids).await
    }
}
