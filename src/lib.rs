//! Shelterbot - Telegram bot for an animal-shelter adoption program
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, metrics and domain types
//! - `storage`: entity store traits with SQLite and in-memory backends
//! - `conversation`: correlation engine turning chat updates into dialogues
//! - `lifecycle`: periodic adoption state and report sweeps
//! - `telegram`: Bot API transport
//! - `cli`: command-line interface

pub mod cli;
pub mod conversation;
pub mod core;
pub mod lifecycle;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
