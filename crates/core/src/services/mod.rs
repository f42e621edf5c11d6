//! Unread pipeline services.

#![allow(missing_docs)]

pub mod antenna;
pub mod deferred_notice;
pub mod event_publisher;
pub mod muting;
pub mod note_read;
pub mod stores;

pub use antenna::{AntennaMatcher, DbAntennaDirectory};
pub use deferred_notice::{DeferredNoticeScheduler, NoticeSlot};
pub use event_publisher::{EventPublisher, EventPublisherService, NoOpEventPublisher, NoteReadEvent};
pub use muting::MuteFilter;
pub use note_read::{NoteAuthor, NoteReadService, ReadInfo, ReadableNote, UnreadFlags};
pub use stores::{
    AntennaDirectory, AntennaNoteStore, ChannelFollowingDirectory, DbMuteDirectory, MuteDirectory,
    NoteReadStores, NoteUnreadStore, NotificationReader, UnreadCategory,
};
