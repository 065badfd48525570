//! The conversation engine: collaborators, registries and chat locks in one handle.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::conversation::locks::ChatLocks;
use crate::conversation::registry::{DataField, PendingDataRequests, PendingQuestion, PendingQuestions};
use crate::conversation::sink::MediaFetcher;
use crate::core::{AppResult, User};
use crate::storage::{EntityStore, ShelterCatalog};

/// Turns inbound events into outbound messages.
///
/// Cloning is cheap; clones share the registries and the chat locks, so one
/// engine can be handed to every dispatcher task.
#[derive(Clone)]
pub struct ConversationEngine {
    pub(crate) store: Arc<dyn EntityStore>,
    pub(crate) shelters: Arc<dyn ShelterCatalog>,
    pub(crate) media: Arc<dyn MediaFetcher>,
    pub(crate) questions: PendingQuestions,
    pub(crate) data_requests: PendingDataRequests,
    pub(crate) locks: ChatLocks,
}

impl ConversationEngine {
    pub fn new(store: Arc<dyn EntityStore>, shelters: Arc<dyn ShelterCatalog>, media: Arc<dyn MediaFetcher>) -> Self {
        Self {
            store,
            shelters,
            media,
            questions: PendingQuestions::new(),
            data_requests: PendingDataRequests::new(),
            locks: ChatLocks::new(),
        }
    }

    /// Snapshot of the chat's open question, if any.
    pub async fn pending_question(&self, chat_id: i64) -> Option<PendingQuestion> {
        self.questions.get(chat_id).await
    }

    /// The field the chat owes next, if any.
    pub async fn pending_field(&self, chat_id: i64) -> Option<DataField> {
        self.data_requests.get(chat_id).await
    }

    /// Loads the chat's user, creating it in `SEARCH` state on first contact.
    pub(crate) async fn ensure_user(&self, chat_id: i64, sender_name: Option<&str>) -> AppResult<User> {
        if let Some(user) = self.store.find_user_by_chat_id(chat_id).await? {
            return Ok(user);
        }
        let user = self.store.create_user(chat_id, sender_name.map(str::to_string)).await?;
        log::info!("New user #{} for chat {}", user.id, chat_id);
        Ok(user)
    }
}

/// Calendar day reports are filed under.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
