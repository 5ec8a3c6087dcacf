mod config;
mod error;
mod logging;
mod platform;
mod relay;
mod responses;

use std::path::PathBuf;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::platform::telegram::{self, TelegramTransport};
use crate::relay::Relay;
use crate::responses::ResponseTable;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Initialize logging
    logging::init(&config.logging).context("Failed to initialize logging")?;

    info!("Configuration loaded from: {}", config_path.display());
    info!("  Admin chats: {:?}", config.telegram.admin_ids);
    info!("  Sender chat: {}", config.relay.sender_chat_id);
    info!("  Acknowledge by: {}", config.relay.acknowledge);

    let responses = ResponseTable::load(&config.relay.responses_path)?;
    info!(
        "Loaded {} canned responses from {}",
        responses.len(),
        config.relay.responses_path.display()
    );
    if responses.is_empty() {
        warn!("Response table is empty, every command gets the fallback reply");
    }

    let bot = Bot::new(&config.telegram.bot_token);
    let me = bot
        .get_me()
        .await
        .context("Failed to authorize with the bot token")?;
    info!("Authorized as @{}", me.username());

    let relay = Relay::new(TelegramTransport::new(bot.clone()), &config, responses);

    info!("Bot is starting...");
    telegram::run(relay, bot).await?;

    Ok(())
}
