use std::path::PathBuf;

use thiserror::Error;

/// Startup failures. Any of these aborts the process before the relay runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set")]
    MissingToken,

    #[error("ADMIN_IDS is not set")]
    MissingAdminIds,

    #[error("failed to load environment file {}", .path.display())]
    Env {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("invalid chat id {value:?} in ADMIN_IDS")]
    InvalidAdminId {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("failed to read settings file {}", .path.display())]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {}", .path.display())]
    ParseSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read responses file {}", .path.display())]
    ReadResponses {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse responses file {}", .path.display())]
    ParseResponses {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single outbound send that did not go through.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),
}
