//! Unread tracking for delivered notes.
//!
//! [`NoteReadService`] records which notes a user has not acknowledged yet
//! (mentions, specified notes, channel notes), sends a delayed "still unread"
//! notice for each new record, and clears the ledger in bulk when the user
//! reads notes, emitting "all read" events when a category drains. Antenna
//! matches live in a separate ledger with its own all-read detection.

pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use services::*;
