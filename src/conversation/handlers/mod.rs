//! Handler chains, one per route. Each adds methods to [`ConversationEngine`](super::ConversationEngine).

mod callback;
mod data;
mod menu;
mod reply;
