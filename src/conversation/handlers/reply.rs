use crate::conversation::catalog::texts;
use crate::conversation::engine::ConversationEngine;
use crate::conversation::event::{InboundEvent, OutboundMessage};
use crate::conversation::message_id::parse_message_id;
use crate::core::{AppError, AppResult};

impl ConversationEngine {
    /// A reply to an earlier message: the volunteer answering a forwarded question.
    ///
    /// Only the chat the question was forwarded to can close it. Anything that
    /// does not match an open question is a stale correlation and is dropped.
    pub(crate) async fn on_reply(&self, event: &InboundEvent) -> AppResult<Vec<OutboundMessage>> {
        let Some(reply_to) = &event.reply_to else {
            return Ok(Vec::new());
        };
        let Some(forwarded_id) = reply_to.text.as_deref().and_then(parse_message_id) else {
            return Ok(Vec::new());
        };
        let Some(answer) = event.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            // Stickers and other non-text replies leave the question open
            return Ok(Vec::new());
        };

        let question = self
            .questions
            .answer(event.chat_id, forwarded_id, answer.to_string())
            .await
            .ok_or(AppError::StaleCorrelation(forwarded_id))?;

        log::info!(
            "chat {}: answer to question {} delivered to chat {}",
            event.chat_id,
            forwarded_id,
            question.user_chat_id
        );
        Ok(vec![OutboundMessage::text(question.user_chat_id, texts::volunteer_reply(answer))])
    }
}
