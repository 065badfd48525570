//! Update classification and the dispatch boundary.

use crate::conversation::catalog::{texts, MenuCommand};
use crate::conversation::engine::ConversationEngine;
use crate::conversation::event::{InboundEvent, OutboundMessage};
use crate::core::metrics::{EVENTS_TOTAL, HANDLER_FAILURES_TOTAL};
use crate::core::{AppError, AppResult};

/// Which handler chain an event goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Callback,
    Menu(MenuCommand),
    Pending,
    Reply,
    Ignored,
}

impl Route {
    pub fn as_label(&self) -> &'static str {
        match self {
            Route::Callback => "callback",
            Route::Menu(_) => "menu",
            Route::Pending => "pending",
            Route::Reply => "reply",
            Route::Ignored => "ignored",
        }
    }
}

/// First match wins: callback, reply, menu label, open question or data request.
/// Everything else is untracked chatter.
pub fn classify(event: &InboundEvent, has_pending: bool) -> Route {
    if event.callback.is_some() {
        return Route::Callback;
    }
    if event.reply_to.is_some() {
        return Route::Reply;
    }
    if let Some(cmd) = event.text.as_deref().and_then(MenuCommand::from_label) {
        return Route::Menu(cmd);
    }
    if has_pending {
        return Route::Pending;
    }
    Route::Ignored
}

impl ConversationEngine {
    /// Handles one event and returns the messages to send, in order.
    ///
    /// Events of the same chat are processed one at a time. Handler errors
    /// never escape: they become a reply to the originating chat (or nothing,
    /// for stale replies).
    pub async fn handle(&self, event: InboundEvent) -> Vec<OutboundMessage> {
        let _chat_guard = self.locks.acquire(event.chat_id).await;

        let mut route = Route::Ignored;
        let result = self.dispatch(&event, &mut route).await;
        EVENTS_TOTAL.with_label_values(&[route.as_label()]).inc();

        match result {
            Ok(messages) => {
                log::debug!(
                    "chat {} routed to {}, {} outbound message(s)",
                    event.chat_id,
                    route.as_label(),
                    messages.len()
                );
                messages
            }
            Err(e) => recover(event.chat_id, route, e),
        }
    }

    async fn dispatch(&self, event: &InboundEvent, route: &mut Route) -> AppResult<Vec<OutboundMessage>> {
        let user = self.ensure_user(event.chat_id, event.sender_name.as_deref()).await?;
        let has_pending =
            self.questions.contains(event.chat_id).await || self.data_requests.contains(event.chat_id).await;
        *route = classify(event, has_pending);

        match *route {
            Route::Callback => {
                let token = event.callback.as_deref().unwrap_or_default();
                self.on_callback(user, token).await
            }
            Route::Reply => self.on_reply(event).await,
            Route::Menu(cmd) => self.on_menu(&user, cmd).await,
            Route::Pending => self.on_pending(user, event).await,
            Route::Ignored => Ok(Vec::new()),
        }
    }
}

/// Converts a handler error into what the chat gets to see.
fn recover(chat_id: i64, route: Route, err: AppError) -> Vec<OutboundMessage> {
    match err {
        AppError::StaleCorrelation(id) => {
            log::debug!("chat {}: reply to message {} matches no open question", chat_id, id);
            Vec::new()
        }
        AppError::NotFound(_) | AppError::InvalidInput(_) => {
            log::info!("chat {}: {}", chat_id, err);
            vec![OutboundMessage::text(chat_id, texts::error(&err.to_string()))]
        }
        AppError::MissingAttachment => vec![OutboundMessage::text(chat_id, texts::SEND_PHOTO)],
        other => {
            HANDLER_FAILURES_TOTAL.with_label_values(&[route.as_label()]).inc();
            log::error!("chat {}: {} handler failed: {}", chat_id, route.as_label(), other);
            vec![OutboundMessage::text(chat_id, texts::APOLOGY)]
        }
    }
}
