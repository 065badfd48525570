use rand::seq::IndexedRandom;

use crate::conversation::callback::CallbackAction;
use crate::conversation::catalog::{main_menu, texts};
use crate::conversation::engine::ConversationEngine;
use crate::conversation::event::OutboundMessage;
use crate::core::{AppError, AppResult, InfoTopic, User};

impl ConversationEngine {
    pub(crate) async fn on_callback(&self, user: User, token: &str) -> AppResult<Vec<OutboundMessage>> {
        let Some(action) = CallbackAction::decode(token) else {
            log::debug!("chat {}: ignoring unknown callback token {:?}", user.chat_id, token);
            return Ok(Vec::new());
        };
        log::info!("chat {}: callback {}", user.chat_id, action);

        match action {
            CallbackAction::Info(topic) => self.shelter_info(&user, topic).await,
            CallbackAction::AskVolunteer(volunteer_id) => {
                let volunteer = self
                    .store
                    .find_user(volunteer_id)
                    .await?
                    .filter(|u| u.is_volunteer)
                    .ok_or_else(|| AppError::not_found(format!("volunteer #{}", volunteer_id)))?;
                self.open_question(&user, &volunteer).await
            }
            CallbackAction::AskAny => {
                let volunteers: Vec<User> = self
                    .store
                    .find_volunteers()
                    .await?
                    .into_iter()
                    .filter(|v| v.chat_id != user.chat_id)
                    .collect();
                let chosen = volunteers.choose(&mut rand::rng()).cloned();
                match chosen {
                    Some(volunteer) => self.open_question(&user, &volunteer).await,
                    None => Ok(vec![OutboundMessage::text(user.chat_id, texts::NO_VOLUNTEERS)]),
                }
            }
            CallbackAction::RequestField(field) => {
                if let Some(previous) = self.data_requests.request(user.chat_id, field).await {
                    log::debug!("chat {}: request for {} replaced by {}", user.chat_id, previous, field);
                }
                Ok(vec![OutboundMessage::text(user.chat_id, field.prompt())])
            }
            CallbackAction::AssignShelter(shelter_id) => {
                let shelter = self
                    .shelters
                    .find_shelter(shelter_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("shelter #{}", shelter_id)))?;
                let mut updated = user;
                updated.shelter_id = Some(shelter.id);
                let saved = self.store.save_user(&updated).await?;
                log::info!("user #{} picked shelter '{}'", saved.id, shelter.name);
                Ok(vec![
                    OutboundMessage::text(saved.chat_id, texts::SHELTER_SELECTED).with_keyboard(main_menu())
                ])
            }
        }
    }

    async fn shelter_info(&self, user: &User, topic: InfoTopic) -> AppResult<Vec<OutboundMessage>> {
        let Some(shelter_id) = user.shelter_id else {
            return Ok(vec![OutboundMessage::text(user.chat_id, texts::NO_SHELTER)]);
        };
        let shelter = self
            .shelters
            .find_shelter(shelter_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("shelter #{}", shelter_id)))?;
        let text = shelter.info(topic).unwrap_or(texts::TOPIC_MISSING);
        Ok(vec![OutboundMessage::text(user.chat_id, text)])
    }

    async fn open_question(&self, user: &User, volunteer: &User) -> AppResult<Vec<OutboundMessage>> {
        if self.questions.open(user.chat_id, volunteer.chat_id).await.is_some() {
            log::info!("chat {}: previous open question discarded", user.chat_id);
        }
        log::info!("chat {}: question routed to volunteer #{}", user.chat_id, volunteer.id);
        Ok(vec![OutboundMessage::text(user.chat_id, texts::WRITE_QUESTION)])
    }
}
