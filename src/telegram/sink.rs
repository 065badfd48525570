//! Telegram-backed delivery and photo download.

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;

use crate::conversation::{Keyboard, MediaFetcher, NotificationSink, PhotoRef};
use crate::core::{AppError, AppResult};
use crate::telegram::keyboards::reply_markup;

/// Sends engine and sweep messages through the Bot API and fetches photo
/// attachments for report fields.
#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        match keyboard {
            Some(keyboard) => request.reply_markup(reply_markup(keyboard)).await?,
            None => request.await?,
        };
        Ok(())
    }
}

#[async_trait]
impl MediaFetcher for TelegramSink {
    async fn largest_photo_bytes(&self, photo: &PhotoRef) -> AppResult<Vec<u8>> {
        let variant = photo.largest().ok_or(AppError::MissingAttachment)?;
        let file = self.bot.get_file(FileId(variant.file_id.clone())).await?;

        let mut bytes = Vec::with_capacity(file.size as usize);
        self.bot.download_file(&file.path, &mut bytes).await?;
        log::debug!(
            "Downloaded photo {} ({}x{}, {} bytes)",
            variant.file_id,
            variant.width,
            variant.height,
            bytes.len()
        );
        Ok(bytes)
    }
}
