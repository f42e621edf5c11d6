//! Repositories over the unread pipeline's tables.

mod antenna;
mod channel_following;
mod following;
mod muting;
mod note;
mod note_thread_muting;
mod note_unread;
mod notification;
mod user_list;

pub use antenna::AntennaRepository;
pub use channel_following::ChannelFollowingRepository;
pub use following::FollowingRepository;
pub use muting::MutingRepository;
pub use note::NoteRepository;
pub use note_thread_muting::NoteThreadMutingRepository;
pub use note_unread::NoteUnreadRepository;
pub use notification::NotificationRepository;
pub use user_list::UserListRepository;
