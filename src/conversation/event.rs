//! Transport-neutral inbound events and outbound messages.

use crate::conversation::callback::CallbackAction;

/// One size variant of a photo attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    /// Transport handle used to download the file
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u32>,
}

/// A photo attachment as delivered by the transport: several sizes of one image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhotoRef {
    pub variants: Vec<PhotoVariant>,
}

impl PhotoRef {
    pub fn new(variants: Vec<PhotoVariant>) -> Self {
        Self { variants }
    }

    /// The largest variant: by file size when every variant reports one,
    /// otherwise by pixel area.
    pub fn largest(&self) -> Option<&PhotoVariant> {
        if self.variants.iter().all(|v| v.file_size.is_some()) {
            self.variants.iter().max_by_key(|v| v.file_size)
        } else {
            self.variants.iter().max_by_key(|v| u64::from(v.width) * u64::from(v.height))
        }
    }
}

/// The message a reply points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRef {
    pub message_id: i32,
    pub text: Option<String>,
}

/// An already-parsed update from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub message_id: i32,
    /// Sender's first name, used when the user record is created
    pub sender_name: Option<String>,
    pub text: Option<String>,
    pub callback: Option<String>,
    pub reply_to: Option<ReplyRef>,
    pub photo: Option<PhotoRef>,
}

impl InboundEvent {
    /// A plain text message.
    pub fn message(chat_id: i64, message_id: i32, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// An inline button press.
    pub fn callback(chat_id: i64, token: impl Into<String>) -> Self {
        Self {
            chat_id,
            callback: Some(token.into()),
            ..Default::default()
        }
    }

    /// A photo, optionally with a caption.
    pub fn photo(chat_id: i64, message_id: i32, photo: PhotoRef, caption: Option<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: caption,
            photo: Some(photo),
            ..Default::default()
        }
    }

    pub fn replying_to(mut self, message_id: i32, text: impl Into<String>) -> Self {
        self.reply_to = Some(ReplyRef {
            message_id,
            text: Some(text.into()),
        });
        self
    }

    pub fn from_sender(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }
}

/// An inline button carrying a callback action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: CallbackAction,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Buttons under the message, each sending a callback token
    Inline(Vec<Vec<InlineButton>>),
    /// Persistent reply keyboard whose buttons send their label as text
    Reply(Vec<Vec<String>>),
}

/// A message the engine wants delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}
