//! Test doubles for the outbound seams
//!
//! `RecordingSink` keeps every message it is asked to send; `ScriptedMedia`
//! hands out fixed photo bytes.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shelterbot::conversation::{Keyboard, MediaFetcher, NotificationSink, PhotoRef};
use shelterbot::core::{AppError, AppResult};

/// One recorded send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// Sink that records messages instead of sending them
#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    unreachable: Arc<Mutex<HashSet<i64>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later send to `chat_id` fails
    pub fn make_unreachable(&self, chat_id: i64) {
        self.unreachable.lock().unwrap().insert(chat_id);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.text)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()> {
        if self.unreachable.lock().unwrap().contains(&chat_id) {
            return Err(AppError::Validation(format!("chat {} blocked the bot", chat_id)));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }
}

/// Media fetcher returning the same bytes for every photo
#[derive(Clone)]
pub struct ScriptedMedia {
    bytes: Vec<u8>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl ScriptedMedia {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// File ids downloaded so far
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for ScriptedMedia {
    async fn largest_photo_bytes(&self, photo: &PhotoRef) -> AppResult<Vec<u8>> {
        let variant = photo.largest().ok_or(AppError::MissingAttachment)?;
        self.requested.lock().unwrap().push(variant.file_id.clone());
        Ok(self.bytes.clone())
    }
}
