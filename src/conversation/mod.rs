//! Conversation engine: stitches stateless chat updates into multi-step dialogues.
//!
//! The transport hands over [`InboundEvent`]s; [`ConversationEngine::handle`]
//! classifies each one, runs exactly one handler chain and returns the
//! [`OutboundMessage`]s to send. Pending questions and data requests live in
//! the engine's registries and are never touched from outside this module.

pub mod callback;
pub mod catalog;
pub mod engine;
pub mod event;
mod handlers;
pub mod locks;
pub mod message_id;
pub mod registry;
pub mod router;
pub mod sink;
pub mod validation;

pub use callback::CallbackAction;
pub use engine::ConversationEngine;
pub use event::{InboundEvent, InlineButton, Keyboard, OutboundMessage, PhotoRef, PhotoVariant, ReplyRef};
pub use registry::{DataField, PendingQuestion};
pub use sink::{deliver, MediaFetcher, NotificationSink};
