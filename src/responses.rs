use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;

/// Reply for commands that have no entry in the table.
pub const UNKNOWN_COMMAND: &str = "Unknown command";

/// Canned replies keyed by lowercase command name
#[derive(Debug, Clone, Default)]
pub struct ResponseTable {
    replies: HashMap<String, String>,
}

impl ResponseTable {
    pub fn new(replies: HashMap<String, String>) -> Self {
        let replies = replies
            .into_iter()
            .map(|(command, reply)| (command.to_lowercase(), reply))
            .collect();
        Self { replies }
    }

    /// Parse a JSON object mapping command names to reply text.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let replies: HashMap<String, String> = serde_json::from_str(content)?;
        Ok(Self::new(replies))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadResponses {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content).map_err(|source| ConfigError::ParseResponses {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up a command, ignoring case
    pub fn get(&self, command: &str) -> Option<&str> {
        self.replies
            .get(&command.to_lowercase())
            .map(String::as_str)
    }

    /// The reply for a command, or [`UNKNOWN_COMMAND`] when it is not in the table.
    pub fn reply_for(&self, command: &str) -> &str {
        self.get(command).unwrap_or(UNKNOWN_COMMAND)
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}
