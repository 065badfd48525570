//! In-memory correlation tables owned by the conversation handlers.
//!
//! Both registries are cheap `Clone` handles over a `tokio::sync::Mutex`;
//! every public method takes the lock once, so each operation is atomic with
//! respect to the others even when a user's question and the volunteer's
//! reply are processed concurrently under different chat locks.

use std::collections::HashMap;
use std::sync::Arc;

use strum::{AsRefStr, Display, EnumIter, EnumString};
use tokio::sync::Mutex;

/// The single field a chat is expected to supply next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum DataField {
    UserPhone,
    UserEmail,
    ReportPhoto,
    ReportDiet,
    ReportBehavior,
    ReportWellbeing,
}

impl DataField {
    /// Prompt sent when the field is requested.
    pub fn prompt(&self) -> &'static str {
        match self {
            DataField::UserPhone => "Send your phone number, e.g. +7 900 123-45-67",
            DataField::UserEmail => "Send your e-mail address",
            DataField::ReportPhoto => "Send today's photo of the animal",
            DataField::ReportDiet => "Describe the animal's diet today",
            DataField::ReportBehavior => "Describe changes in behavior: new habits, dropped ones",
            DataField::ReportWellbeing => "Describe the animal's wellbeing and how it settles in",
        }
    }

    /// Button label in the data-entry keyboards.
    pub fn label(&self) -> &'static str {
        match self {
            DataField::UserPhone => "📞 Phone",
            DataField::UserEmail => "✉️ E-mail",
            DataField::ReportPhoto => "📷 Photo",
            DataField::ReportDiet => "🥣 Diet",
            DataField::ReportBehavior => "🐾 Behavior",
            DataField::ReportWellbeing => "❤️ Wellbeing",
        }
    }
}

/// A user's question routed to one volunteer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub user_chat_id: i64,
    pub volunteer_chat_id: i64,
    /// Id of the user message that carried the question; embedded in the forwarded text
    pub forwarded_message_id: Option<i32>,
    pub question_text: Option<String>,
    pub answer_text: Option<String>,
}

impl PendingQuestion {
    fn new(user_chat_id: i64, volunteer_chat_id: i64) -> Self {
        Self {
            user_chat_id,
            volunteer_chat_id,
            forwarded_message_id: None,
            question_text: None,
            answer_text: None,
        }
    }
}

/// Result of attaching a message to the user's open question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StampOutcome {
    /// Body recorded; the question must now be forwarded
    Stamped(PendingQuestion),
    /// The question already has a body and waits for the volunteer
    AlreadyAsked,
    /// The volunteer has another open question under the same message id
    IdInUse,
    /// No open question for this chat
    Missing,
}

#[derive(Default)]
struct QuestionTables {
    by_user: HashMap<i64, PendingQuestion>,
    /// (volunteer chat, forwarded message id) -> user chat
    by_forwarded: HashMap<(i64, i32), i64>,
}

impl QuestionTables {
    fn unindex(&mut self, question: &PendingQuestion) {
        if let Some(id) = question.forwarded_message_id {
            self.by_forwarded.remove(&(question.volunteer_chat_id, id));
        }
    }
}

/// Open questions keyed by user chat and by forwarded message id.
///
/// Forwarded ids are only unique within one chat, so the reverse index is
/// scoped by the volunteer chat the question went to.
#[derive(Clone, Default)]
pub struct PendingQuestions {
    inner: Arc<Mutex<QuestionTables>>,
}

impl PendingQuestions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a question from `user_chat_id` to `volunteer_chat_id`, replacing
    /// (and returning) any question the user still had open.
    pub async fn open(&self, user_chat_id: i64, volunteer_chat_id: i64) -> Option<PendingQuestion> {
        let mut tables = self.inner.lock().await;
        let previous = tables
            .by_user
            .insert(user_chat_id, PendingQuestion::new(user_chat_id, volunteer_chat_id));
        if let Some(previous) = &previous {
            tables.unindex(previous);
        }
        previous
    }

    pub async fn get(&self, user_chat_id: i64) -> Option<PendingQuestion> {
        self.inner.lock().await.by_user.get(&user_chat_id).cloned()
    }

    pub async fn contains(&self, user_chat_id: i64) -> bool {
        self.inner.lock().await.by_user.contains_key(&user_chat_id)
    }

    /// Attaches the question body and the carrying message id, once.
    pub async fn stamp(&self, user_chat_id: i64, message_id: i32, text: String) -> StampOutcome {
        let mut tables = self.inner.lock().await;
        let Some(question) = tables.by_user.get(&user_chat_id) else {
            return StampOutcome::Missing;
        };
        if question.question_text.is_some() {
            return StampOutcome::AlreadyAsked;
        }
        let key = (question.volunteer_chat_id, message_id);
        if tables.by_forwarded.contains_key(&key) {
            return StampOutcome::IdInUse;
        }

        tables.by_forwarded.insert(key, user_chat_id);
        let Some(question) = tables.by_user.get_mut(&user_chat_id) else {
            return StampOutcome::Missing;
        };
        question.forwarded_message_id = Some(message_id);
        question.question_text = Some(text);
        StampOutcome::Stamped(question.clone())
    }

    /// Closes the question `volunteer_chat_id` received under `forwarded_id`,
    /// returning it with the answer filled in. Unknown pairs yield `None`.
    pub async fn answer(&self, volunteer_chat_id: i64, forwarded_id: i32, answer: String) -> Option<PendingQuestion> {
        let mut tables = self.inner.lock().await;
        let user_chat_id = tables.by_forwarded.remove(&(volunteer_chat_id, forwarded_id))?;
        let mut question = tables.by_user.remove(&user_chat_id)?;
        question.answer_text = Some(answer);
        Some(question)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.by_user.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Which field each chat owes next.
#[derive(Clone, Default)]
pub struct PendingDataRequests {
    inner: Arc<Mutex<HashMap<i64, DataField>>>,
}

impl PendingDataRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or overwrites) the request, returning the replaced field.
    pub async fn request(&self, chat_id: i64, field: DataField) -> Option<DataField> {
        self.inner.lock().await.insert(chat_id, field)
    }

    pub async fn get(&self, chat_id: i64) -> Option<DataField> {
        self.inner.lock().await.get(&chat_id).copied()
    }

    pub async fn contains(&self, chat_id: i64) -> bool {
        self.inner.lock().await.contains_key(&chat_id)
    }

    /// Removes the request only if it is still `field`.
    pub async fn discard(&self, chat_id: i64, field: DataField) -> bool {
        let mut requests = self.inner.lock().await;
        if requests.get(&chat_id) == Some(&field) {
            requests.remove(&chat_id);
            true
        } else {
            false
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
