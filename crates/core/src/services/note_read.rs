//! Note read service.
//!
//! Tracks which delivered notes a user has not acknowledged yet and clears
//! that ledger when notes are read.

use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;
use noteread_common::{AppError, AppResult, IdGenerator};
use noteread_db::entities::{antenna, note, note_unread};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::deferred_notice::DeferredNoticeScheduler;
use super::event_publisher::{EventPublisherService, NoteReadEvent};
use super::muting::MuteFilter;
use super::stores::{NoteReadStores, UnreadCategory};

/// Author of a note, as far as antenna matching is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteAuthor {
    pub id: String,
    /// `None` for local users.
    pub host: Option<String>,
}

/// The parts of a note the unread pipeline looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadableNote {
    pub id: String,
    pub author: NoteAuthor,
    pub text: Option<String>,
    pub cw: Option<String>,
    pub reply_id: Option<String>,
    pub thread_id: Option<String>,
    pub mentions: Vec<String>,
    pub visible_user_ids: Vec<String>,
    pub has_files: bool,
    pub channel_id: Option<String>,
}

impl ReadableNote {
    /// ID of the thread this note belongs to; a root note is its own thread.
    #[must_use]
    pub fn thread_key(&self) -> &str {
        self.thread_id.as_deref().unwrap_or(&self.id)
    }

    /// Content warning and text, joined for keyword matching.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        match (&self.cw, &self.text) {
            (Some(cw), Some(text)) => format!("{cw}\n{text}"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => String::new(),
        }
    }
}

impl From<&note::Model> for ReadableNote {
    fn from(note: &note::Model) -> Self {
        let string_list = |value: &serde_json::Value| -> Vec<String> {
            serde_json::from_value(value.clone()).unwrap_or_default()
        };

        Self {
            id: note.id.clone(),
            author: NoteAuthor {
                id: note.user_id.clone(),
                host: note.user_host.clone(),
            },
            text: note.text.clone(),
            cw: note.cw.clone(),
            reply_id: note.reply_id.clone(),
            thread_id: note.thread_id.clone(),
            mentions: string_list(&note.mentions),
            visible_user_ids: string_list(&note.visible_user_ids),
            has_files: !string_list(&note.file_ids).is_empty(),
            channel_id: note.channel_id.clone(),
        }
    }
}

/// How a note reached the user.
///
/// A note is either a mention or a specified (direct) note for a given
/// user, never both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnreadFlags {
    pub is_specified: bool,
    pub is_mentioned: bool,
}

impl UnreadFlags {
    fn validate(self, note_id: &str) -> AppResult<()> {
        if self.is_specified && self.is_mentioned {
            return Err(AppError::InvalidFlags {
                note_id: note_id.to_string(),
            });
        }
        Ok(())
    }
}

/// Lookups the caller already has at hand.
#[derive(Debug, Clone, Default)]
pub struct ReadInfo {
    /// Channels the reading user follows.
    pub following_channels: HashSet<String>,
}

/// Notes from one `read` call, grouped by unread category.
#[derive(Debug, Default)]
struct ReadBuckets {
    mentions: Vec<String>,
    specified: Vec<String>,
    channel: Vec<String>,
    antenna_notes: Vec<String>,
}

impl ReadBuckets {
    fn has_unread_records(&self) -> bool {
        !(self.mentions.is_empty() && self.specified.is_empty() && self.channel.is_empty())
    }

    /// Note IDs whose unread records should be removed.
    fn unread_note_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.mentions
            .iter()
            .chain(&self.specified)
            .chain(&self.channel)
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    /// Note IDs whose notifications should be marked read.
    fn notification_note_ids(&self) -> Vec<String> {
        self.mentions.iter().chain(&self.specified).cloned().collect()
    }
}

/// Service tracking unread notes per user.
#[derive(Clone)]
pub struct NoteReadService {
    stores: NoteReadStores,
    mute_filter: MuteFilter,
    event_publisher: EventPublisherService,
    notices: DeferredNoticeScheduler,
    id_gen: IdGenerator,
}

impl NoteReadService {
    /// Create a new note read service.
    #[must_use]
    pub fn new(
        stores: NoteReadStores,
        event_publisher: EventPublisherService,
        notice_delay: Duration,
    ) -> Self {
        Self {
            mute_filter: MuteFilter::new(stores.mutes.clone()),
            stores,
            event_publisher,
            notices: DeferredNoticeScheduler::new(notice_delay),
            id_gen: IdGenerator::new(),
        }
    }

    // ==================== Insert ====================

    /// Record that a note delivered to the user is unread.
    ///
    /// Nothing is recorded when the user mutes the author or the thread, or
    /// when a record for the same note already exists. Otherwise a notice is
    /// published after the configured delay if the record is still there.
    pub async fn insert_note_unread(
        &self,
        user_id: &str,
        note: &ReadableNote,
        flags: UnreadFlags,
    ) -> AppResult<()> {
        flags.validate(&note.id)?;

        let slot = self.notices.reserve()?;

        if !self.mute_filter.should_track_unread(user_id, note).await? {
            debug!(user_id, note_id = %note.id, "Skipping unread for muted note");
            return Ok(());
        }

        let record = note_unread::Model {
            id: self.id_gen.generate(),
            user_id: user_id.to_string(),
            note_id: note.id.clone(),
            note_user_id: note.author.id.clone(),
            is_specified: flags.is_specified,
            is_mentioned: flags.is_mentioned,
            note_channel_id: note.channel_id.clone(),
        };
        let record_id = record.id.clone();

        if !self.stores.unreads.insert(record).await? {
            debug!(user_id, note_id = %note.id, "Unread record already exists");
            return Ok(());
        }

        let mut events = Vec::with_capacity(3);
        if flags.is_mentioned {
            events.push(NoteReadEvent::UnreadMention {
                note_id: note.id.clone(),
            });
        }
        if flags.is_specified {
            events.push(NoteReadEvent::UnreadSpecifiedNote {
                note_id: note.id.clone(),
            });
        }
        if note.channel_id.is_some() {
            events.push(NoteReadEvent::UnreadChannel {
                note_id: note.id.clone(),
            });
        }

        let unreads = self.stores.unreads.clone();
        let publisher = self.event_publisher.clone();
        let user_id = user_id.to_string();

        slot.schedule(async move {
            match unreads.find(&record_id).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!(user_id = %user_id, record_id = %record_id, "Unread record already read");
                    return;
                }
                Err(e) => {
                    debug!(
                        user_id = %user_id,
                        record_id = %record_id,
                        error = %e,
                        "Unread record lookup failed, treating as read"
                    );
                    return;
                }
            }

            for event in &events {
                if let Err(e) = publisher.publish_main_stream(&user_id, event).await {
                    warn!(
                        user_id = %user_id,
                        event = event.name(),
                        error = %e,
                        "Failed to publish unread notice"
                    );
                }
            }
        });

        Ok(())
    }

    // ==================== Read ====================

    /// Mark notes as read by the user.
    ///
    /// Removes the user's unread records for the notes. When any note matches
    /// one of the user's antennas, the antenna-matched notes are flipped to
    /// read in every antenna the user owns. "All read" events are published
    /// for every category this call drained. Calling it again with the same
    /// notes is a no-op.
    pub async fn read(
        &self,
        user_id: &str,
        notes: &[ReadableNote],
        info: Option<&ReadInfo>,
    ) -> AppResult<()> {
        if notes.is_empty() {
            return Ok(());
        }

        let following_channels = match info {
            Some(info) => info.following_channels.clone(),
            None => self.stores.channels.followed_channel_ids(user_id).await?,
        };

        let my_antennas: Vec<antenna::Model> = self
            .stores
            .antennas
            .list_antennas()
            .await?
            .into_iter()
            .filter(|a| a.user_id == user_id)
            .collect();

        let buckets = self
            .classify(user_id, notes, &following_channels, &my_antennas)
            .await?;

        if buckets.has_unread_records() {
            let removed = self
                .stores
                .unreads
                .delete_by_note_ids(user_id, &buckets.unread_note_ids())
                .await?;

            let notification_note_ids = buckets.notification_note_ids();
            tokio::join!(
                self.publish_drained_categories(user_id, &removed),
                self.mark_notifications_read(user_id, &notification_note_ids),
            );
        }

        if !buckets.antenna_notes.is_empty() {
            let antenna_ids: Vec<String> = my_antennas.iter().map(|a| a.id.clone()).collect();
            let flipped = self
                .stores
                .antenna_notes
                .mark_read(&antenna_ids, &buckets.antenna_notes)
                .await?;

            self.publish_drained_antennas(user_id, &my_antennas, &flipped)
                .await;
        }

        Ok(())
    }

    /// Run [`read`](Self::read) in the background, logging failures.
    pub fn read_detached(
        &self,
        user_id: String,
        notes: Vec<ReadableNote>,
        info: Option<ReadInfo>,
    ) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.read(&user_id, &notes, info.as_ref()).await {
                e.log("Background read failed");
            }
        })
    }

    async fn classify(
        &self,
        user_id: &str,
        notes: &[ReadableNote],
        following_channels: &HashSet<String>,
        my_antennas: &[antenna::Model],
    ) -> AppResult<ReadBuckets> {
        let mut buckets = ReadBuckets::default();
        let mut antenna_hits = HashSet::new();

        for note in notes {
            if note.mentions.iter().any(|id| id == user_id) {
                buckets.mentions.push(note.id.clone());
            } else if note.visible_user_ids.iter().any(|id| id == user_id) {
                buckets.specified.push(note.id.clone());
            }

            if note
                .channel_id
                .as_ref()
                .is_some_and(|channel_id| following_channels.contains(channel_id))
            {
                buckets.channel.push(note.id.clone());
            }

            for antenna in my_antennas {
                if self
                    .stores
                    .antennas
                    .matches(antenna, note, &note.author)
                    .await?
                {
                    if antenna_hits.insert(note.id.as_str()) {
                        buckets.antenna_notes.push(note.id.clone());
                    }
                    break;
                }
            }
        }

        Ok(buckets)
    }

    /// Publish "all read" for each category that lost records and is now empty.
    async fn publish_drained_categories(&self, user_id: &str, removed: &[note_unread::Model]) {
        let touched = UnreadCategory::ALL
            .into_iter()
            .filter(|category| removed.iter().any(|r| category.contains(r)));

        join_all(touched.map(|category| async move {
            match self.stores.unreads.count(user_id, category).await {
                Ok(0) => self.publish(user_id, category.all_read_event()).await,
                Ok(_) => {}
                Err(e) => {
                    warn!(user_id, ?category, error = %e, "Failed to count unread records");
                }
            }
        }))
        .await;
    }

    async fn mark_notifications_read(&self, user_id: &str, note_ids: &[String]) {
        if note_ids.is_empty() {
            return;
        }

        match self
            .stores
            .notifications
            .mark_read_by_note_ids(user_id, note_ids)
            .await
        {
            Ok(count) => debug!(user_id, count, "Marked notifications read"),
            Err(e) => warn!(user_id, error = %e, "Failed to mark notifications read"),
        }
    }

    /// Publish "read antenna" for flipped antennas that are now empty, then
    /// "all antennas read" if nothing is left for the user.
    async fn publish_drained_antennas(
        &self,
        user_id: &str,
        antennas: &[antenna::Model],
        flipped: &[String],
    ) {
        if flipped.is_empty() {
            return;
        }

        join_all(
            antennas
                .iter()
                .filter(|a| flipped.contains(&a.id))
                .map(|antenna| async move {
                    match self.stores.antenna_notes.count_unread(&antenna.id).await {
                        Ok(0) => {
                            self.publish(
                                user_id,
                                NoteReadEvent::ReadAntenna {
                                    antenna: antenna.clone(),
                                },
                            )
                            .await;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(
                                user_id,
                                antenna_id = %antenna.id,
                                error = %e,
                                "Failed to count antenna unread notes"
                            );
                        }
                    }
                }),
        )
        .await;

        match self.stores.antenna_notes.has_any_unread(user_id).await {
            Ok(false) => self.publish(user_id, NoteReadEvent::ReadAllAntennas).await,
            Ok(true) => {}
            Err(e) => warn!(user_id, error = %e, "Failed to check unread antennas"),
        }
    }

    async fn publish(&self, user_id: &str, event: NoteReadEvent) {
        if let Err(e) = self.event_publisher.publish(user_id, &event).await {
            warn!(user_id, event = event.name(), error = %e, "Failed to publish read event");
        }
    }

    // ==================== Lifecycle ====================

    /// Cancel every pending unread notice. New inserts are rejected afterwards.
    pub fn shutdown(&self) {
        info!(pending = self.notices.pending(), "Cancelling pending unread notices");
        self.notices.shutdown();
    }

    /// Number of unread notices waiting to fire.
    #[must_use]
    pub fn pending_notices(&self) -> usize {
        self.notices.pending()
    }

    /// Wait until every notice task has finished. Only returns after shutdown.
    pub async fn wait_for_notices(&self) {
        self.notices.wait().await;
    }
}
