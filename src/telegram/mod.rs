//! Telegram transport: bot setup, update conversion and delivery

pub mod bot;
pub mod handlers;
pub mod inbound;
pub mod keyboards;
pub mod sink;

pub use bot::{create_bot, is_message_addressed_to_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use sink::TelegramSink;
