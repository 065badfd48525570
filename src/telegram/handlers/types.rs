//! Handler error type and shared dependencies

use std::sync::Arc;

use teloxide::types::UserId;

use crate::conversation::{ConversationEngine, NotificationSink};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub engine: ConversationEngine,
    pub sink: Arc<dyn NotificationSink>,
    pub bot_username: Option<String>,
    pub bot_id: UserId,
}

impl HandlerDeps {
    pub fn new(
        engine: ConversationEngine,
        sink: Arc<dyn NotificationSink>,
        bot_username: Option<String>,
        bot_id: UserId,
    ) -> Self {
        Self {
            engine,
            sink,
            bot_username,
            bot_id,
        }
    }
}
