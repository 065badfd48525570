//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError};
use crate::conversation::{deliver, InboundEvent};
use crate::telegram::bot::is_message_addressed_to_bot;
use crate::telegram::inbound::{event_from_callback, event_from_message};

/// Creates the dispatcher schema for the bot.
///
/// Every update addressed to the bot becomes one [`InboundEvent`]; the engine
/// answers it and the replies go out through the sink in order.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(message_handler(deps.clone()))
        .branch(callback_handler(deps))
}

async fn process(deps: &HandlerDeps, event: InboundEvent) {
    let chat_id = event.chat_id;
    let replies = deps.engine.handle(event).await;
    let delivered = deliver(deps.sink.as_ref(), &replies).await;
    if delivered < replies.len() {
        log::warn!(
            "Only {}/{} replies delivered for an update from chat {}",
            delivered,
            replies.len(),
            chat_id
        );
    }
}

/// Handler for plain messages, photos and replies
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let bot_username = deps.bot_username.clone();
    let bot_id = deps.bot_id;

    Update::filter_message()
        .filter(move |msg: Message| is_message_addressed_to_bot(&msg, bot_username.as_deref(), bot_id))
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                process(&deps, event_from_message(&msg, deps.bot_username.as_deref())).await;
                Ok(())
            }
        })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            // Stops the client-side spinner whatever the outcome
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                log::warn!("Failed to answer callback query: {}", e);
            }

            match event_from_callback(&q) {
                Some(event) => process(&deps, event).await,
                None => log::debug!("Ignoring callback query without data from {}", q.from.id),
            }
            Ok(())
        }
    })
}
