//! Domain entities shared by the conversation engine, the lifecycle scheduler and the stores.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Adoption lifecycle state of a user.
///
/// Stored as `SCREAMING_SNAKE_CASE` text (`"PROBATION"`, `"BLACKLIST"`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserState {
    /// Browsing, no adoption in progress
    #[default]
    Search,
    /// Volunteers approved the adoption, waiting for the sweep to confirm it
    Accepted,
    /// Probation passed
    Adopted,
    /// Volunteers refused the adoption
    Refuse,
    /// Probation failed, the animal must be returned
    Blacklist,
    /// Volunteers extended the probation period
    Prolonged,
    /// Probation running
    Probation,
    /// Probation over, waiting for a volunteer decision
    Decision,
}

/// Placement state of an animal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimalState {
    #[default]
    InShelter,
    InTest,
    HappyEnd,
}

/// Kind of animals a shelter takes care of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShelterKind {
    #[default]
    Dogs,
    Cats,
}

/// Static informational topics a shelter publishes.
///
/// The snake_case name doubles as the callback token suffix (`info:address_schedule`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InfoTopic {
    About,
    AddressSchedule,
    SecurityPass,
    SafetyRules,
    MeetingRules,
    Documents,
    Transport,
    HomePuppy,
    HomeAdult,
    HomeDisabled,
    HandlerAdvice,
    RecommendedHandlers,
    RefusalReasons,
    Contacts,
}

impl InfoTopic {
    /// Button label shown in the inline keyboards.
    pub fn label(&self) -> &'static str {
        match self {
            InfoTopic::About => "🏠 About the shelter",
            InfoTopic::AddressSchedule => "📍 Address and opening hours",
            InfoTopic::SecurityPass => "🛂 Car pass / security contact",
            InfoTopic::SafetyRules => "⚠️ Safety rules on site",
            InfoTopic::MeetingRules => "🤝 How to meet an animal",
            InfoTopic::Documents => "📄 Documents to adopt",
            InfoTopic::Transport => "🚗 Transport advice",
            InfoTopic::HomePuppy => "🍼 Home for a young animal",
            InfoTopic::HomeAdult => "🛋 Home for an adult animal",
            InfoTopic::HomeDisabled => "♿ Home for an animal with disabilities",
            InfoTopic::HandlerAdvice => "🎓 Handler advice",
            InfoTopic::RecommendedHandlers => "👩‍🏫 Recommended handlers",
            InfoTopic::RefusalReasons => "🚫 Why we may refuse",
            InfoTopic::Contacts => "☎️ Contacts",
        }
    }
}

/// A bot user: adopter, candidate or volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub chat_id: i64,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub state: UserState,
    /// Probation deadline
    pub end_test: Option<DateTime<Utc>>,
    pub is_volunteer: bool,
    pub animal_id: Option<i64>,
    pub shelter_id: Option<i64>,
    /// Optimistic concurrency counter, bumped by every successful save
    pub version: i64,
}

impl User {
    /// Name used in notifications: "name surname", the name alone, or the chat id.
    pub fn display_name(&self) -> String {
        match (self.name.as_deref(), self.surname.as_deref()) {
            (Some(name), Some(surname)) => format!("{} {}", name, surname),
            (Some(name), None) => name.to_string(),
            (None, Some(surname)) => surname.to_string(),
            (None, None) => format!("chat {}", self.chat_id),
        }
    }
}

/// An animal living in (or placed from) a shelter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub id: i64,
    pub name: String,
    pub breed: Option<String>,
    pub state: AnimalState,
    /// Adopter
    pub user_id: Option<i64>,
    pub version: i64,
}

/// Daily care report an adopter sends during probation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub animal_id: Option<i64>,
    pub user_id: i64,
    /// Day the report belongs to (one report per user and day)
    pub date: NaiveDate,
    /// Last time the adopter added something to it
    pub submitted_at: DateTime<Utc>,
    pub diet: Option<String>,
    pub behavior: Option<String>,
    pub wellbeing: Option<String>,
    #[serde(skip)]
    pub photo: Option<Vec<u8>>,
    pub version: i64,
}

/// A shelter and its static informational content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: i64,
    pub name: String,
    pub kind: ShelterKind,
    pub info: BTreeMap<InfoTopic, String>,
}

impl Shelter {
    /// Static text for a topic, if the shelter publishes one.
    pub fn info(&self, topic: InfoTopic) -> Option<&str> {
        self.info.get(&topic).map(String::as_str)
    }
}
