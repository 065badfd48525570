//! Fixtures over the in-memory store
//!
//! `TestEnvironment` wires a `MemoryStore`, a recording sink and a scripted
//! media fetcher into a conversation engine and a lifecycle runner.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use shelterbot::conversation::{ConversationEngine, InboundEvent, OutboundMessage};
use shelterbot::core::{Animal, AnimalState, InfoTopic, Report, Shelter, ShelterKind, User, UserState};
use shelterbot::lifecycle::LifecycleRunner;
use shelterbot::storage::MemoryStore;

use super::recorder::{RecordingSink, ScriptedMedia};

pub const PHOTO_BYTES: &[u8] = b"\xFF\xD8\xFFfake-jpeg";

pub fn adopter(chat_id: i64, state: UserState) -> User {
    User {
        id: 0,
        chat_id,
        name: Some(format!("Adopter{}", chat_id)),
        surname: None,
        phone: None,
        email: None,
        state,
        end_test: None,
        is_volunteer: false,
        animal_id: None,
        shelter_id: None,
        version: 0,
    }
}

pub fn volunteer(chat_id: i64) -> User {
    User {
        name: Some(format!("Volunteer{}", chat_id)),
        is_volunteer: true,
        ..adopter(chat_id, UserState::Search)
    }
}

pub fn animal(name: &str, user_id: Option<i64>, state: AnimalState) -> Animal {
    Animal {
        id: 0,
        name: name.to_string(),
        breed: None,
        state,
        user_id,
        version: 0,
    }
}

pub fn report(user_id: i64, animal_id: i64, submitted_at: DateTime<Utc>) -> Report {
    Report {
        id: 0,
        animal_id: Some(animal_id),
        user_id,
        date: submitted_at.date_naive(),
        submitted_at,
        diet: Some("dry food".to_string()),
        behavior: None,
        wellbeing: None,
        photo: None,
        version: 0,
    }
}

pub fn shelter(name: &str) -> Shelter {
    let mut info = BTreeMap::new();
    info.insert(InfoTopic::About, format!("{} takes care of dogs since 2010", name));
    info.insert(InfoTopic::AddressSchedule, "Green street 1, daily 9-18".to_string());
    Shelter {
        id: 0,
        name: name.to_string(),
        kind: ShelterKind::Dogs,
        info,
    }
}

/// Everything a scenario needs, sharing one store
pub struct TestEnvironment {
    pub store: Arc<MemoryStore>,
    pub sink: RecordingSink,
    pub media: ScriptedMedia,
    pub engine: ConversationEngine,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let sink = RecordingSink::new();
        let media = ScriptedMedia::new(PHOTO_BYTES);
        let engine = ConversationEngine::new(store.clone(), store.clone(), Arc::new(media.clone()));
        Self {
            store,
            sink,
            media,
            engine,
        }
    }

    pub fn runner(&self, support_chat_id: Option<i64>) -> LifecycleRunner {
        LifecycleRunner::new(self.store.clone(), Arc::new(self.sink.clone()), support_chat_id)
    }

    pub async fn send(&self, event: InboundEvent) -> Vec<OutboundMessage> {
        self.engine.handle(event).await
    }

    pub async fn text(&self, chat_id: i64, message_id: i32, text: &str) -> Vec<OutboundMessage> {
        self.send(InboundEvent::message(chat_id, message_id, text)).await
    }

    pub async fn press(&self, chat_id: i64, token: &str) -> Vec<OutboundMessage> {
        self.send(InboundEvent::callback(chat_id, token)).await
    }
}
