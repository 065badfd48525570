//! Inline button actions and their wire tokens.
//!
//! Token grammar (all ASCII, well under the 64-byte callback limit):
//!
//! ```text
//! info:<topic>      static shelter content, topic in snake_case
//! ask:<user id>     question for a specific volunteer
//! ask:any           question for whichever volunteer is available
//! field:<field>     request one data field (user_phone, report_photo, ...)
//! shelter:<id>      pick a shelter
//! ```

use std::fmt;
use std::str::FromStr;

use crate::conversation::registry::DataField;
use crate::core::InfoTopic;

/// A decoded inline button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Info(InfoTopic),
    AskVolunteer(i64),
    AskAny,
    RequestField(DataField),
    AssignShelter(i64),
}

impl CallbackAction {
    /// Decodes a token; anything outside the grammar yields `None`.
    pub fn decode(token: &str) -> Option<Self> {
        let (prefix, arg) = token.trim().split_once(':')?;
        match prefix {
            "info" => InfoTopic::from_str(arg).ok().map(CallbackAction::Info),
            "ask" if arg == "any" => Some(CallbackAction::AskAny),
            "ask" => arg.parse().ok().map(CallbackAction::AskVolunteer),
            "field" => DataField::from_str(arg).ok().map(CallbackAction::RequestField),
            "shelter" => arg.parse().ok().map(CallbackAction::AssignShelter),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Info(topic) => write!(f, "info:{}", topic),
            CallbackAction::AskVolunteer(id) => write!(f, "ask:{}", id),
            CallbackAction::AskAny => write!(f, "ask:any"),
            CallbackAction::RequestField(field) => write!(f, "field:{}", field),
            CallbackAction::AssignShelter(id) => write!(f, "shelter:{}", id),
        }
    }
}
