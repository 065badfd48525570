//! Static catalog: menu labels, canned replies and keyboard layouts.

use strum::{EnumIter, IntoEnumIterator};

use crate::conversation::callback::CallbackAction;
use crate::conversation::event::{InlineButton, Keyboard};
use crate::conversation::registry::DataField;
use crate::core::{InfoTopic, Shelter, User};

/// Reply-keyboard commands. Matching is on the exact label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum MenuCommand {
    Start,
    ShelterInfo,
    HowToAdopt,
    SendReport,
    CallVolunteer,
    LeaveContacts,
    ChangeShelter,
}

impl MenuCommand {
    pub fn label(&self) -> &'static str {
        match self {
            MenuCommand::Start => "/start",
            MenuCommand::ShelterInfo => "ℹ️ Shelter info",
            MenuCommand::HowToAdopt => "🐶 How to adopt",
            MenuCommand::SendReport => "📝 Send report",
            MenuCommand::CallVolunteer => "🙋 Call a volunteer",
            MenuCommand::LeaveContacts => "📇 Leave contacts",
            MenuCommand::ChangeShelter => "🔁 Change shelter",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        MenuCommand::iter().find(|cmd| cmd.label() == text)
    }
}

pub mod texts {
    pub const CHOOSE_SHELTER: &str = "Hi! Which shelter are you interested in?";
    pub const NO_SHELTERS: &str = "No shelters are registered yet. Please come back later.";
    pub const SHELTER_SELECTED: &str = "Shelter selected. Use the menu below.";
    pub const NO_SHELTER: &str = "Please choose a shelter first: send /start.";
    pub const TOPIC_MISSING: &str = "The shelter has not published this information yet.";
    pub const SHELTER_INFO: &str = "What would you like to know about the shelter?";
    pub const HOW_TO_ADOPT: &str = "Everything you need to know before taking an animal home:";
    pub const SEND_REPORT: &str = "Daily report: send each part with the buttons below.";
    pub const CHOOSE_VOLUNTEER: &str = "Who would you like to ask?";
    pub const LEAVE_CONTACTS: &str = "Which contact would you like to leave?";
    pub const WRITE_QUESTION: &str = "Write your question in the next message.";
    pub const NO_VOLUNTEERS: &str = "No volunteers are available right now. Please try again later.";
    pub const SENT_TO_VOLUNTEER: &str = "Your question was sent to a volunteer.";
    pub const NOT_ANSWERED_YET: &str = "The volunteer has not answered your previous question yet.";
    pub const SEND_AGAIN: &str = "Please send your question once more.";
    pub const SEND_PHOTO: &str = "Please send a photo.";
    pub const DATA_RECORDED: &str = "Data recorded, thank you!";
    pub const APOLOGY: &str = "Sorry, something went wrong. Please try again later.";

    /// Text forwarded to the volunteer; the leading id is what replies are matched on.
    pub fn question_for_volunteer(message_id: i32, text: &str) -> String {
        format!("{}: message from user, reply using reply-to:\n{}", message_id, text)
    }

    pub fn volunteer_reply(text: &str) -> String {
        format!("volunteer reply:\n{}", text)
    }

    pub fn error(message: &str) -> String {
        format!("error: {}", message)
    }
}

/// Persistent menu shown once a shelter is chosen.
pub fn main_menu() -> Keyboard {
    Keyboard::Reply(vec![
        vec![
            MenuCommand::ShelterInfo.label().to_string(),
            MenuCommand::HowToAdopt.label().to_string(),
        ],
        vec![
            MenuCommand::SendReport.label().to_string(),
            MenuCommand::CallVolunteer.label().to_string(),
        ],
        vec![
            MenuCommand::LeaveContacts.label().to_string(),
            MenuCommand::ChangeShelter.label().to_string(),
        ],
    ])
}

fn one_per_row(buttons: impl IntoIterator<Item = InlineButton>) -> Keyboard {
    Keyboard::Inline(buttons.into_iter().map(|b| vec![b]).collect())
}

fn topic_buttons(topics: &[InfoTopic]) -> Keyboard {
    one_per_row(
        topics
            .iter()
            .map(|topic| InlineButton::new(topic.label(), CallbackAction::Info(*topic))),
    )
}

fn field_buttons(fields: &[DataField]) -> Keyboard {
    one_per_row(
        fields
            .iter()
            .map(|field| InlineButton::new(field.label(), CallbackAction::RequestField(*field))),
    )
}

pub fn shelter_choice(shelters: &[Shelter]) -> Keyboard {
    one_per_row(
        shelters
            .iter()
            .map(|s| InlineButton::new(format!("{} ({})", s.name, s.kind), CallbackAction::AssignShelter(s.id))),
    )
}

pub fn shelter_info_menu() -> Keyboard {
    topic_buttons(&[
        InfoTopic::About,
        InfoTopic::AddressSchedule,
        InfoTopic::SecurityPass,
        InfoTopic::SafetyRules,
        InfoTopic::Contacts,
    ])
}

pub fn adoption_menu() -> Keyboard {
    topic_buttons(&[
        InfoTopic::MeetingRules,
        InfoTopic::Documents,
        InfoTopic::Transport,
        InfoTopic::HomePuppy,
        InfoTopic::HomeAdult,
        InfoTopic::HomeDisabled,
        InfoTopic::HandlerAdvice,
        InfoTopic::RecommendedHandlers,
        InfoTopic::RefusalReasons,
    ])
}

pub fn report_menu() -> Keyboard {
    field_buttons(&[
        DataField::ReportPhoto,
        DataField::ReportDiet,
        DataField::ReportBehavior,
        DataField::ReportWellbeing,
    ])
}

pub fn contacts_menu() -> Keyboard {
    field_buttons(&[DataField::UserPhone, DataField::UserEmail])
}

/// One button per volunteer plus "any volunteer".
pub fn volunteer_menu(volunteers: &[User]) -> Keyboard {
    let mut buttons: Vec<InlineButton> = volunteers
        .iter()
        .map(|v| InlineButton::new(v.display_name(), CallbackAction::AskVolunteer(v.id)))
        .collect();
    buttons.push(InlineButton::new("Any volunteer", CallbackAction::AskAny));
    one_per_row(buttons)
}
