//! Bot initialization and message addressing
//!
//! This module contains:
//! - Bot command enum and its registration in the Telegram UI
//! - Bot instance creation (custom Bot API server, request timeout)
//! - The check deciding whether a group message is meant for the bot

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::{ChatKind, Message, MessageEntityKind, UserId};
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Slash commands shown in the client's command menu
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "choose a shelter and open the main menu")]
    Start,
}

/// Creates a Bot instance with custom or default API URL
///
/// The token comes from `BOT_TOKEN` (or `TELOXIDE_TOKEN`).
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Missing token, invalid URL or HTTP client setup failure
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN (or TELOXIDE_TOKEN) is not set");
    }
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token, client);

    let bot = match config::BOT_API_URL.as_deref() {
        Some(api_url) => {
            log::info!("Using custom Bot API URL: {}", api_url);
            let url = url::Url::parse(api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Registers the command list in the Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Checks if a message is addressed to the bot
///
/// Private chats always are. In groups (a volunteers' support chat, say) only
/// replies to the bot's own messages and explicit @mentions count.
pub fn is_message_addressed_to_bot(msg: &Message, bot_username: Option<&str>, bot_id: UserId) -> bool {
    if matches!(msg.chat.kind, ChatKind::Private(_)) {
        return true;
    }

    if let Some(reply_to) = msg.reply_to_message() {
        if reply_to.from.as_ref().is_some_and(|from| from.id == bot_id) {
            return true;
        }
    }

    let (Some(text), Some(username)) = (msg.text(), bot_username) else {
        return false;
    };

    let mentioned = msg.entities().unwrap_or_default().iter().any(|entity| {
        matches!(entity.kind, MessageEntityKind::Mention)
            && text
                .get(entity.offset..entity.offset + entity.length)
                .map(|m| m.strip_prefix('@').unwrap_or(m))
                .is_some_and(|m| m.eq_ignore_ascii_case(username))
    });

    mentioned || text.contains(&format!("@{}", username))
}
