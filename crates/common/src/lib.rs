//! Common utilities and shared types for the note-read subsystem.
//!
//! This crate provides foundational components used across all workspace crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use noteread_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("{} -> {}", config.note_read.unread_notice_delay_ms, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
