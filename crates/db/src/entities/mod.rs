//! Database entities.

#![allow(missing_docs)]

pub mod antenna;
pub mod antenna_note;
pub mod channel_following;
pub mod following;
pub mod muting;
pub mod note;
pub mod note_thread_muting;
pub mod note_unread;
pub mod notification;
pub mod user_list_member;

pub use antenna::Entity as Antenna;
pub use antenna_note::Entity as AntennaNotes;
pub use channel_following::Entity as ChannelFollowing;
pub use following::Entity as Following;
pub use muting::Entity as Muting;
pub use note::Entity as Note;
pub use note_thread_muting::Entity as NoteThreadMuting;
pub use note_unread::Entity as NoteUnread;
pub use notification::Entity as Notification;
pub use user_list_member::Entity as UserListMember;
