use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Which identity of the sender receives the acknowledgement.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AckTarget {
    /// The chat the update came from
    #[default]
    Chat,
    /// The sending user's id
    User,
}

impl std::fmt::Display for AckTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AckTarget::Chat => write!(f, "chat"),
            AckTarget::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Admin chats that receive forwarded submissions, in send order
    pub admin_ids: Vec<i64>,
}

/// The optional TOML settings file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    #[serde(default = "default_responses_path")]
    pub responses_path: PathBuf,
    /// Chat that never receives acknowledgements
    #[serde(default)]
    pub sender_chat_id: i64,
    #[serde(default)]
    pub acknowledge: AckTarget,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Empty disables file logging
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_keep_files")]
    pub keep_files: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            responses_path: default_responses_path(),
            sender_chat_id: 0,
            acknowledge: AckTarget::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            max_file_bytes: default_max_file_bytes(),
            keep_files: default_keep_files(),
        }
    }
}

impl LoggingConfig {
    pub fn log_file(&self) -> Option<&Path> {
        if self.file.as_os_str().is_empty() {
            None
        } else {
            Some(&self.file)
        }
    }
}

fn default_responses_path() -> PathBuf {
    PathBuf::from("responses/responses.json")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/feedbackbot.log")
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_keep_files() -> u32 {
    3
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadSettings {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::ParseSettings {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl TelegramConfig {
    /// Build from `BOT_TOKEN` and `ADMIN_IDS` as returned by `var`.
    pub fn from_env<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = var("BOT_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let raw_ids = var("ADMIN_IDS")
            .filter(|ids| !ids.trim().is_empty())
            .ok_or(ConfigError::MissingAdminIds)?;

        Ok(Self {
            bot_token,
            admin_ids: parse_admin_ids(&raw_ids)?,
        })
    }
}

/// Parse a comma-separated list of chat ids. Every element must be an integer.
pub fn parse_admin_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<i64>()
                .map_err(|source| ConfigError::InvalidAdminId {
                    value: part.to_string(),
                    source,
                })
        })
        .collect()
}

/// Read `KEY=value` pairs from a dotenv file. A missing file yields no pairs;
/// an unreadable or malformed one is an error.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(|source| ConfigError::Env {
                path: path.to_path_buf(),
                source,
            }),
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(source) => Err(ConfigError::Env {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl Config {
    /// Load `.env`, the process environment and the settings file.
    pub fn load(settings_path: &Path) -> Result<Self, ConfigError> {
        Self::load_from(settings_path, Path::new(".env"), |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], with explicit sources. Variables from `var`
    /// take precedence over the ones in `env_path`.
    pub fn load_from<F>(settings_path: &Path, env_path: &Path, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_env_file(env_path)?;
        let settings = Settings::load(settings_path)?;
        let telegram =
            TelegramConfig::from_env(|key| var(key).or_else(|| file_vars.get(key).cloned()))?;

        Ok(Self::from_parts(telegram, settings))
    }

    pub fn from_parts(telegram: TelegramConfig, settings: Settings) -> Self {
        Self {
            telegram,
            relay: settings.relay,
            logging: settings.logging,
        }
    }
}
