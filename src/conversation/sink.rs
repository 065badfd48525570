//! Outbound seams: message delivery and photo download.

use async_trait::async_trait;

use crate::conversation::event::{Keyboard, OutboundMessage, PhotoRef};
use crate::core::metrics::OUTBOUND_MESSAGES_TOTAL;
use crate::core::AppResult;

/// Sends text (optionally with a keyboard) to a chat.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()>;
}

/// Downloads photo attachments from the transport.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Bytes of the largest variant of `photo`.
    async fn largest_photo_bytes(&self, photo: &PhotoRef) -> AppResult<Vec<u8>>;
}

/// Sends `messages` in order. A failed send is logged and does not stop the rest.
///
/// Returns the number of messages delivered.
pub async fn deliver(sink: &dyn NotificationSink, messages: &[OutboundMessage]) -> usize {
    let mut delivered = 0;
    for message in messages {
        match sink.send(message.chat_id, &message.text, message.keyboard.as_ref()).await {
            Ok(()) => {
                delivered += 1;
                OUTBOUND_MESSAGES_TOTAL.with_label_values(&["sent"]).inc();
            }
            Err(e) => {
                OUTBOUND_MESSAGES_TOTAL.with_label_values(&["failed"]).inc();
                log::warn!("Failed to deliver message to chat {}: {}", message.chat_id, e);
            }
        }
    }
    delivered
}
