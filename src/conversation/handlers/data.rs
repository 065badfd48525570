use chrono::Utc;

use crate::conversation::catalog::texts;
use crate::conversation::engine::{today, ConversationEngine};
use crate::conversation::event::{InboundEvent, OutboundMessage};
use crate::conversation::registry::{DataField, StampOutcome};
use crate::conversation::validation::{validate_email, validate_phone};
use crate::core::{AppError, AppResult, Report, User};

fn message_text(event: &InboundEvent) -> Option<&str> {
    event.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

fn required_text(event: &InboundEvent) -> AppResult<String> {
    message_text(event)
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput("a text message was expected".to_string()))
}

impl ConversationEngine {
    /// Free text (or a photo) from a chat with an open question or data request.
    /// An open question takes precedence.
    pub(crate) async fn on_pending(&self, user: User, event: &InboundEvent) -> AppResult<Vec<OutboundMessage>> {
        if self.questions.contains(user.chat_id).await {
            return self.on_question(&user, event).await;
        }
        match self.data_requests.get(user.chat_id).await {
            Some(field) => self.on_data(&user, field, event).await,
            None => Ok(Vec::new()),
        }
    }

    async fn on_question(&self, user: &User, event: &InboundEvent) -> AppResult<Vec<OutboundMessage>> {
        let chat_id = user.chat_id;
        let Some(text) = message_text(event) else {
            return Ok(vec![OutboundMessage::text(chat_id, texts::WRITE_QUESTION)]);
        };

        let composed = texts::question_for_volunteer(event.message_id, text);
        let messages = match self.questions.stamp(chat_id, event.message_id, composed.clone()).await {
            StampOutcome::Stamped(question) => {
                log::info!(
                    "chat {}: question {} forwarded to chat {}",
                    chat_id,
                    event.message_id,
                    question.volunteer_chat_id
                );
                vec![
                    OutboundMessage::text(question.volunteer_chat_id, composed),
                    OutboundMessage::text(chat_id, texts::SENT_TO_VOLUNTEER),
                ]
            }
            StampOutcome::AlreadyAsked => vec![OutboundMessage::text(chat_id, texts::NOT_ANSWERED_YET)],
            StampOutcome::IdInUse => {
                log::warn!("chat {}: message id {} already used for this volunteer", chat_id, event.message_id);
                vec![OutboundMessage::text(chat_id, texts::SEND_AGAIN)]
            }
            StampOutcome::Missing => Vec::new(),
        };
        Ok(messages)
    }

    async fn on_data(&self, user: &User, field: DataField, event: &InboundEvent) -> AppResult<Vec<OutboundMessage>> {
        let chat_id = user.chat_id;
        match self.record_field(user, field, event).await {
            Err(AppError::MissingAttachment) => {
                // Keep the request so the user can simply send the photo
                Ok(vec![OutboundMessage::text(chat_id, texts::SEND_PHOTO)])
            }
            Err(e) => {
                self.data_requests.discard(chat_id, field).await;
                log::warn!("chat {}: failed to record {}: {}", chat_id, field, e);
                Ok(vec![OutboundMessage::text(chat_id, texts::error(&e.to_string()))])
            }
            Ok(()) => {
                self.data_requests.discard(chat_id, field).await;
                log::info!("chat {}: recorded {}", chat_id, field);
                Ok(vec![OutboundMessage::text(chat_id, texts::DATA_RECORDED)])
            }
        }
    }

    async fn record_field(&self, user: &User, field: DataField, event: &InboundEvent) -> AppResult<()> {
        match field {
            DataField::ReportPhoto => {
                let photo = event
                    .photo
                    .as_ref()
                    .filter(|p| !p.variants.is_empty())
                    .ok_or(AppError::MissingAttachment)?;
                let bytes = self.media.largest_photo_bytes(photo).await?;
                self.update_report(user, |report| report.photo = Some(bytes)).await
            }
            DataField::ReportDiet => {
                let text = required_text(event)?;
                self.update_report(user, |report| report.diet = Some(text)).await
            }
            DataField::ReportBehavior => {
                let text = required_text(event)?;
                self.update_report(user, |report| report.behavior = Some(text)).await
            }
            DataField::ReportWellbeing => {
                let text = required_text(event)?;
                self.update_report(user, |report| report.wellbeing = Some(text)).await
            }
            DataField::UserPhone => {
                let phone = validate_phone(&required_text(event)?)?;
                self.store.save_user(&User { phone: Some(phone), ..user.clone() }).await?;
                Ok(())
            }
            DataField::UserEmail => {
                let email = validate_email(&required_text(event)?)?;
                self.store.save_user(&User { email: Some(email), ..user.clone() }).await?;
                Ok(())
            }
        }
    }

    /// Applies `fill` to today's report, links the animal and stamps the submission time.
    async fn update_report(&self, user: &User, fill: impl FnOnce(&mut Report)) -> AppResult<()> {
        let mut report = self.store.find_or_create_todays_report(user, today()).await?;
        fill(&mut report);
        if report.animal_id.is_none() {
            report.animal_id = self.adopted_animal(user).await?;
        }
        report.submitted_at = Utc::now();
        self.store.save_report(&report).await?;
        Ok(())
    }

    /// The user's animal: the linked one, else the `IN_TEST` animal whose adopter they are.
    async fn adopted_animal(&self, user: &User) -> AppResult<Option<i64>> {
        if user.animal_id.is_some() {
            return Ok(user.animal_id);
        }
        let animals = self.store.find_animals_in_test_with_user().await?;
        Ok(animals.into_iter().find(|a| a.user_id == Some(user.id)).map(|a| a.id))
    }
}
