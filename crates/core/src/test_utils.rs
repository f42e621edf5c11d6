//! In-memory stores and a recording publisher for service-level tests.

#![allow(missing_docs, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use noteread_common::{AppError, AppResult};
use noteread_db::entities::{antenna, antenna_note, note_unread};

use crate::services::{
    AntennaDirectory, AntennaMatcher, AntennaNoteStore, ChannelFollowingDirectory, EventPublisher,
    MuteDirectory, NoteAuthor, NoteReadEvent, NoteReadStores, NoteUnreadStore, NotificationReader,
    ReadableNote, UnreadCategory,
};

/// A local note by `author_id` with no text, mentions or channel.
#[must_use]
pub fn readable_note(id: &str, author_id: &str) -> ReadableNote {
    ReadableNote {
        id: id.to_string(),
        author: NoteAuthor {
            id: author_id.to_string(),
            host: None,
        },
        text: None,
        cw: None,
        reply_id: None,
        thread_id: None,
        mentions: Vec::new(),
        visible_user_ids: Vec::new(),
        has_files: false,
        channel_id: None,
    }
}

// ==================== Mutes ====================

#[derive(Default)]
pub struct InMemoryMutes {
    users: Mutex<HashSet<(String, String)>>,
    threads: Mutex<HashSet<(String, String)>>,
}

impl InMemoryMutes {
    pub fn mute_user(&self, muter_id: &str, mutee_id: &str) {
        self.users
            .lock()
            .unwrap()
            .insert((muter_id.to_string(), mutee_id.to_string()));
    }

    pub fn mute_thread(&self, user_id: &str, thread_id: &str) {
        self.threads
            .lock()
            .unwrap()
            .insert((user_id.to_string(), thread_id.to_string()));
    }
}

#[async_trait]
impl MuteDirectory for InMemoryMutes {
    async fn muted_user_ids(&self, muter_id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|(muter, _)| muter == muter_id)
            .map(|(_, mutee)| mutee.clone())
            .collect())
    }

    async fn is_thread_muted(&self, user_id: &str, thread_id: &str) -> AppResult<bool> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .contains(&(user_id.to_string(), thread_id.to_string())))
    }
}

// ==================== Unread ledger ====================

#[derive(Default)]
pub struct InMemoryUnreads {
    records: Mutex<Vec<note_unread::Model>>,
    failing_counts: Mutex<HashSet<UnreadCategory>>,
    fail_inserts: Mutex<bool>,
    fail_finds: Mutex<bool>,
}

impl InMemoryUnreads {
    /// All records currently stored.
    pub fn all(&self) -> Vec<note_unread::Model> {
        self.records.lock().unwrap().clone()
    }

    /// Count a user's records in a category without going through the trait.
    pub fn count_for(&self, user_id: &str, category: UnreadCategory) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && category.contains(r))
            .count()
    }

    /// Delete a record behind the service's back.
    pub fn remove(&self, record_id: &str) {
        self.records.lock().unwrap().retain(|r| r.id != record_id);
    }

    /// Make counts for `category` fail.
    pub fn fail_counts_for(&self, category: UnreadCategory) {
        self.failing_counts.lock().unwrap().insert(category);
    }

    /// Make every insert fail.
    pub fn fail_inserts(&self) {
        *self.fail_inserts.lock().unwrap() = true;
    }

    /// Make every lookup by ID fail.
    pub fn fail_finds(&self) {
        *self.fail_finds.lock().unwrap() = true;
    }
}

#[async_trait]
impl NoteUnreadStore for InMemoryUnreads {
    async fn insert(&self, record: note_unread::Model) -> AppResult<bool> {
        if *self.fail_inserts.lock().unwrap() {
            return Err(AppError::Database("connection refused".to_string()));
        }

        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.user_id == record.user_id && r.note_id == record.note_id)
        {
            return Ok(false);
        }
        records.push(record);
        Ok(true)
    }

    async fn find(&self, id: &str) -> AppResult<Option<note_unread::Model>> {
        if *self.fail_finds.lock().unwrap() {
            return Err(AppError::Database("connection reset".to_string()));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn delete_by_note_ids(
        &self,
        user_id: &str,
        note_ids: &[String],
    ) -> AppResult<Vec<note_unread::Model>> {
        let mut records = self.records.lock().unwrap();
        let (removed, kept): (Vec<_>, Vec<_>) = records
            .drain(..)
            .partition(|r| r.user_id == user_id && note_ids.contains(&r.note_id));
        *records = kept;
        Ok(removed)
    }

    async fn count(&self, user_id: &str, category: UnreadCategory) -> AppResult<u64> {
        if self.failing_counts.lock().unwrap().contains(&category) {
            return Err(AppError::Database("count timed out".to_string()));
        }
        Ok(self.count_for(user_id, category) as u64)
    }
}

// ==================== Channels ====================

#[derive(Default)]
pub struct InMemoryChannels {
    follows: Mutex<HashMap<String, HashSet<String>>>,
    lookups: Mutex<usize>,
}

impl InMemoryChannels {
    pub fn follow(&self, user_id: &str, channel_id: &str) {
        self.follows
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .insert(channel_id.to_string());
    }

    /// How many times the follow list was queried.
    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl ChannelFollowingDirectory for InMemoryChannels {
    async fn followed_channel_ids(&self, user_id: &str) -> AppResult<HashSet<String>> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self
            .follows
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ==================== Antennas ====================

/// Antenna directory that applies the stateless matcher only; `home` and
/// `list` antennas match like `all`.
#[derive(Default)]
pub struct InMemoryAntennas {
    antennas: Mutex<Vec<antenna::Model>>,
    matcher: AntennaMatcher,
}

impl InMemoryAntennas {
    pub fn add(&self, antenna: antenna::Model) {
        self.antennas.lock().unwrap().push(antenna);
    }
}

#[async_trait]
impl AntennaDirectory for InMemoryAntennas {
    async fn list_antennas(&self) -> AppResult<Vec<antenna::Model>> {
        Ok(self.antennas.lock().unwrap().clone())
    }

    async fn matches(
        &self,
        antenna: &antenna::Model,
        note: &ReadableNote,
        author: &NoteAuthor,
    ) -> AppResult<bool> {
        Ok(self.matcher.matches_note(antenna, note, author))
    }
}

/// A keyword antenna owned by `user_id` over all notes.
#[must_use]
pub fn keyword_antenna(id: &str, user_id: &str, keyword: &str) -> antenna::Model {
    antenna::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: id.to_string(),
        src: antenna::AntennaSource::All,
        user_list_id: None,
        keywords: serde_json::json!([[keyword]]),
        exclude_keywords: serde_json::json!([]),
        users: serde_json::json!([]),
        instances: serde_json::json!([]),
        case_sensitive: false,
        with_replies: false,
        with_file: false,
        notify: false,
        local_only: false,
        is_active: true,
        created_at: Utc::now().into(),
    }
}

#[derive(Default)]
pub struct InMemoryAntennaNotes {
    rows: Mutex<Vec<antenna_note::Model>>,
    owners: Mutex<HashMap<String, String>>,
}

impl InMemoryAntennaNotes {
    /// Record an unread match of `note_id` in `antenna`.
    pub fn add(&self, antenna: &antenna::Model, note_id: &str) {
        self.owners
            .lock()
            .unwrap()
            .insert(antenna.id.clone(), antenna.user_id.clone());

        let mut rows = self.rows.lock().unwrap();
        let id = format!("an{}", rows.len() + 1);
        rows.push(antenna_note::Model {
            id,
            antenna_id: antenna.id.clone(),
            note_id: note_id.to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        });
    }

    pub fn is_read(&self, antenna_id: &str, note_id: &str) -> bool {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.antenna_id == antenna_id && r.note_id == note_id && r.is_read)
    }
}

#[async_trait]
impl AntennaNoteStore for InMemoryAntennaNotes {
    async fn mark_read(
        &self,
        antenna_ids: &[String],
        note_ids: &[String],
    ) -> AppResult<Vec<String>> {
        let mut flipped = Vec::new();
        for row in self.rows.lock().unwrap().iter_mut() {
            if !row.is_read && antenna_ids.contains(&row.antenna_id) && note_ids.contains(&row.note_id)
            {
                row.is_read = true;
                if !flipped.contains(&row.antenna_id) {
                    flipped.push(row.antenna_id.clone());
                }
            }
        }
        Ok(flipped)
    }

    async fn count_unread(&self, antenna_id: &str) -> AppResult<u64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.antenna_id == antenna_id && !r.is_read)
            .count() as u64)
    }

    async fn has_any_unread(&self, user_id: &str) -> AppResult<bool> {
        let owners = self.owners.lock().unwrap();
        Ok(self.rows.lock().unwrap().iter().any(|r| {
            !r.is_read && owners.get(&r.antenna_id).is_some_and(|owner| owner == user_id)
        }))
    }
}

// ==================== Notifications ====================

#[derive(Default)]
pub struct InMemoryNotifications {
    read: Mutex<Vec<(String, String)>>,
}

impl InMemoryNotifications {
    /// Note IDs whose notifications were marked read for the user.
    pub fn read_note_ids(&self, user_id: &str) -> Vec<String> {
        self.read
            .lock()
            .unwrap()
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, note)| note.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationReader for InMemoryNotifications {
    async fn mark_read_by_note_ids(&self, user_id: &str, note_ids: &[String]) -> AppResult<u64> {
        let mut read = self.read.lock().unwrap();
        for note_id in note_ids {
            read.push((user_id.to_string(), note_id.clone()));
        }
        Ok(note_ids.len() as u64)
    }
}

// ==================== Bundle ====================

/// Every in-memory store, kept around for assertions.
#[derive(Default, Clone)]
pub struct InMemoryStores {
    pub mutes: Arc<InMemoryMutes>,
    pub unreads: Arc<InMemoryUnreads>,
    pub channels: Arc<InMemoryChannels>,
    pub antennas: Arc<InMemoryAntennas>,
    pub antenna_notes: Arc<InMemoryAntennaNotes>,
    pub notifications: Arc<InMemoryNotifications>,
}

impl InMemoryStores {
    #[must_use]
    pub fn stores(&self) -> NoteReadStores {
        NoteReadStores {
            mutes: self.mutes.clone(),
            unreads: self.unreads.clone(),
            channels: self.channels.clone(),
            antennas: self.antennas.clone(),
            antenna_notes: self.antenna_notes.clone(),
            notifications: self.notifications.clone(),
        }
    }
}

// ==================== Publisher ====================

/// Where a recorded event was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    MainStream,
    Push,
}

/// Event publisher that records everything it is asked to publish.
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<(Delivery, String, NoteReadEvent)>>,
}

impl RecordingEventPublisher {
    /// Events published on the user's main stream, in order.
    pub fn stream_events(&self, user_id: &str) -> Vec<NoteReadEvent> {
        self.delivered(Delivery::MainStream, user_id)
    }

    /// Events pushed to the user, in order.
    pub fn pushed_events(&self, user_id: &str) -> Vec<NoteReadEvent> {
        self.delivered(Delivery::Push, user_id)
    }

    /// Stream event names for the user, in order.
    pub fn stream_event_names(&self, user_id: &str) -> Vec<&'static str> {
        self.stream_events(user_id)
            .iter()
            .map(NoteReadEvent::name)
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn delivered(&self, delivery: Delivery, user_id: &str) -> Vec<NoteReadEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, user, _)| *d == delivery && user == user_id)
            .map(|(_, _, event)| event.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish_main_stream(&self, user_id: &str, event: &NoteReadEvent) -> AppResult<()> {
        self.events.lock().unwrap().push((
            Delivery::MainStream,
            user_id.to_string(),
            event.clone(),
        ));
        Ok(())
    }

    async fn push_notification(&self, user_id: &str, event: &NoteReadEvent) -> AppResult<()> {
        self.events
            .lock()
            .unwrap()
            .push((Delivery::Push, user_id.to_string(), event.clone()));
        Ok(())
    }
}
