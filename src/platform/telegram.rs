use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, MessageEntityKind, UpdateKind};
use teloxide::update_listeners::{AsUpdateStream, Polling};
use tracing::{info, warn};

use crate::error::SendError;
use crate::platform::{parse_command, InboundUpdate, OutboundMessage, Sender, Transport};
use crate::relay::Relay;

/// Long-poll timeout passed to getUpdates
const POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// [`Transport`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        let chat_id = ChatId(message.chat_id);
        match &message.photo {
            Some(file_id) => {
                self.bot
                    .send_photo(chat_id, InputFile::file_id(FileId(file_id.clone())))
                    .caption(message.text.clone())
                    .await?;
            }
            None => {
                self.bot
                    .send_message(chat_id, message.text.clone())
                    .await?;
            }
        }
        Ok(())
    }
}

/// Convert a Telegram message into the platform-neutral update.
pub fn inbound_from_message(msg: &Message) -> InboundUpdate {
    let sender = msg.from.as_ref().and_then(|user| match i64::try_from(user.id.0) {
        Ok(id) => Some(Sender {
            id,
            handle: user
                .username
                .clone()
                .unwrap_or_else(|| user.first_name.clone()),
        }),
        Err(_) => {
            warn!("User id {} does not fit a chat id, dropping sender", user.id.0);
            None
        }
    });

    let text = msg.text().map(str::to_string);
    let command = if starts_with_bot_command(msg) {
        text.as_deref().and_then(parse_command)
    } else {
        None
    };

    let photo = msg
        .photo()
        .map(|sizes| sizes.iter().map(|p| p.file.id.0.clone()).collect())
        .unwrap_or_default();

    InboundUpdate {
        chat_id: msg.chat.id.0,
        sender,
        command,
        photo,
        caption: msg.caption().map(str::to_string),
        text,
    }
}

/// Telegram marks commands with a `bot_command` entity at the start of the text.
fn starts_with_bot_command(msg: &Message) -> bool {
    msg.entities().is_some_and(|entities| {
        entities
            .iter()
            .any(|e| e.offset == 0 && matches!(e.kind, MessageEntityKind::BotCommand))
    })
}

/// Non-message updates (edits, callbacks, ...) come through empty and are
/// skipped by the relay.
pub fn inbound_from_update(update: &Update) -> InboundUpdate {
    match &update.kind {
        UpdateKind::Message(msg) => inbound_from_message(msg),
        _ => InboundUpdate::default(),
    }
}

/// Poll Telegram and feed every update through the relay, one at a time.
pub async fn run(relay: Relay<TelegramTransport>, bot: Bot) -> anyhow::Result<()> {
    info!("Starting Telegram long polling...");

    let mut listener = Polling::builder(bot).timeout(POLL_TIMEOUT).build();
    let updates = listener.as_stream().filter_map(|res| async move {
        match res {
            Ok(update) => Some(inbound_from_update(&update)),
            Err(e) => {
                warn!("Failed to fetch updates: {}", e);
                None
            }
        }
    });

    relay.run(updates).await;

    Ok(())
}
