//! Conversion of engine keyboards into Telegram reply markup.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ReplyMarkup};

use crate::conversation::Keyboard;

/// Builds the Telegram markup for `keyboard`.
///
/// Inline buttons carry the encoded callback token; reply buttons send their
/// label back as a plain message.
pub fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Inline(rows) => {
            let rows: Vec<Vec<InlineKeyboardButton>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.action.encode()))
                        .collect()
                })
                .collect();
            ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
        }
        Keyboard::Reply(rows) => {
            let rows: Vec<Vec<KeyboardButton>> = rows
                .iter()
                .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect())
                .collect();
            ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard())
        }
    }
}
