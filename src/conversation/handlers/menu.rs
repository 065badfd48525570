use crate::conversation::catalog::{
    adoption_menu, contacts_menu, report_menu, shelter_choice, shelter_info_menu, texts, volunteer_menu, MenuCommand,
};
use crate::conversation::engine::ConversationEngine;
use crate::conversation::event::{Keyboard, OutboundMessage};
use crate::core::{AppResult, User};

impl ConversationEngine {
    pub(crate) async fn on_menu(&self, user: &User, cmd: MenuCommand) -> AppResult<Vec<OutboundMessage>> {
        let reply = |text: &str, keyboard: Keyboard| vec![OutboundMessage::text(user.chat_id, text).with_keyboard(keyboard)];

        let messages = match cmd {
            MenuCommand::Start | MenuCommand::ChangeShelter => {
                let shelters = self.shelters.list_shelters().await?;
                if shelters.is_empty() {
                    vec![OutboundMessage::text(user.chat_id, texts::NO_SHELTERS)]
                } else {
                    reply(texts::CHOOSE_SHELTER, shelter_choice(&shelters))
                }
            }
            MenuCommand::ShelterInfo | MenuCommand::HowToAdopt if user.shelter_id.is_none() => {
                vec![OutboundMessage::text(user.chat_id, texts::NO_SHELTER)]
            }
            MenuCommand::ShelterInfo => reply(texts::SHELTER_INFO, shelter_info_menu()),
            MenuCommand::HowToAdopt => reply(texts::HOW_TO_ADOPT, adoption_menu()),
            MenuCommand::SendReport => reply(texts::SEND_REPORT, report_menu()),
            MenuCommand::LeaveContacts => reply(texts::LEAVE_CONTACTS, contacts_menu()),
            MenuCommand::CallVolunteer => {
                let volunteers: Vec<User> = self
                    .store
                    .find_volunteers()
                    .await?
                    .into_iter()
                    .filter(|v| v.chat_id != user.chat_id)
                    .collect();
                reply(texts::CHOOSE_VOLUNTEER, volunteer_menu(&volunteers))
            }
        };
        Ok(messages)
    }
}
