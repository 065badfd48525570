//! Conversion of Telegram updates into engine events.

use teloxide::types::{CallbackQuery, Message};

use crate::conversation::{InboundEvent, PhotoRef, PhotoVariant, ReplyRef};

/// Removes `@bot_username` mentions, so `/start@shelter_bot` in a group reads
/// as `/start`. Text without a mention comes back untouched.
fn strip_bot_mention(text: &str, bot_username: Option<&str>) -> String {
    let Some(username) = bot_username.filter(|u| !u.is_empty()) else {
        return text.to_string();
    };
    let mention = format!("@{}", username.to_ascii_lowercase());
    // ASCII lowercasing keeps byte offsets valid in `text`
    let lowered = text.to_ascii_lowercase();

    let mut stripped = String::with_capacity(text.len());
    let mut rest = 0;
    for (start, _) in lowered.match_indices(&mention) {
        let end = start + mention.len();
        let longer_name = lowered[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if longer_name {
            continue;
        }
        stripped.push_str(&text[rest..start]);
        rest = end;
    }
    if rest == 0 {
        return text.to_string();
    }
    stripped.push_str(&text[rest..]);
    stripped.trim().to_string()
}

/// Flattens a message into an [`InboundEvent`].
///
/// Photo captions travel as the event text, minus any mention of the bot. The
/// replied-to message keeps its own text (or caption), which is where
/// forwarded question ids live.
pub fn event_from_message(msg: &Message, bot_username: Option<&str>) -> InboundEvent {
    let photo = msg.photo().map(|sizes| {
        PhotoRef::new(
            sizes
                .iter()
                .map(|size| PhotoVariant {
                    file_id: size.file.id.0.clone(),
                    width: size.width,
                    height: size.height,
                    file_size: Some(size.file.size),
                })
                .collect(),
        )
    });

    let text = msg
        .text()
        .or_else(|| msg.caption())
        .map(|text| strip_bot_mention(text, bot_username));

    let reply_to = msg.reply_to_message().map(|original| ReplyRef {
        message_id: original.id.0,
        text: original.text().or_else(|| original.caption()).map(str::to_string),
    });

    InboundEvent {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        sender_name: msg.from.as_ref().map(|user| user.first_name.clone()),
        text,
        callback: None,
        reply_to,
        photo,
    }
}

/// Flattens an inline button press. Returns `None` for queries without data.
///
/// The chat is the one holding the pressed message; for a message that is no
/// longer accessible the presser's private chat is used.
pub fn event_from_callback(query: &CallbackQuery) -> Option<InboundEvent> {
    let token = query.data.clone()?;
    let chat_id = query
        .message
        .as_ref()
        .map(|message| message.chat().id.0)
        .unwrap_or(query.from.id.0 as i64);

    Some(InboundEvent::callback(chat_id, token).from_sender(query.from.first_name.clone()))
}
