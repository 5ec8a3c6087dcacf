pub mod telegram;

use async_trait::async_trait;

use crate::error::SendError;

/// Who sent an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    /// Username without the leading `@`
    pub handle: String,
}

/// One update received from the platform, before classification
#[derive(Debug, Clone, Default)]
pub struct InboundUpdate {
    /// Chat the update came from
    pub chat_id: i64,
    pub sender: Option<Sender>,
    /// Command name without the leading `/`
    pub command: Option<String>,
    /// File ids of the attached photo's size variants, smallest first
    pub photo: Vec<String>,
    pub caption: Option<String>,
    pub text: Option<String>,
}

/// What an update asks the relay to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Command { name: String },
    Photo { file_id: String, caption: String },
    Text { body: String },
    Unclassified,
}

impl InboundUpdate {
    /// Commands win over photos, photos over text.
    pub fn classify(&self) -> Submission {
        if let Some(name) = self.command.as_deref().filter(|c| !c.is_empty()) {
            return Submission::Command {
                name: name.to_string(),
            };
        }

        // Variants arrive smallest first; the last one is the full-size image.
        if let Some(file_id) = self.photo.last() {
            return Submission::Photo {
                file_id: file_id.clone(),
                caption: self.caption.clone().unwrap_or_default(),
            };
        }

        match self.text.as_deref() {
            Some(body) if !body.is_empty() => Submission::Text {
                body: body.to_string(),
            },
            _ => Submission::Unclassified,
        }
    }

    pub fn sender_handle(&self) -> &str {
        self.sender
            .as_ref()
            .map(|s| s.handle.as_str())
            .unwrap_or("unknown")
    }
}

/// Extract the command name from a message that starts with `/`.
///
/// `/Start@my_bot payload` yields `start`. Telegram command names are
/// ASCII letters, digits and `_`; anything else is not a command.
pub fn parse_command(text: &str) -> Option<String> {
    let token = text.strip_prefix('/')?.split(char::is_whitespace).next()?;
    let name = token.split('@').next().unwrap_or_default();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        None
    } else {
        Some(name.to_lowercase())
    }
}

/// A message to hand to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    /// Message text, or the caption when `photo` is set
    pub text: String,
    /// File id of a photo to resend
    pub photo: Option<String>,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            photo: None,
        }
    }

    pub fn photo(chat_id: i64, file_id: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: caption.into(),
            photo: Some(file_id.into()),
        }
    }
}

/// Delivers outbound messages. Implemented per messaging platform.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update() -> InboundUpdate {
        InboundUpdate {
            chat_id: 42,
            sender: Some(Sender {
                id: 42,
                handle: "alice".to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start"), Some("start".to_string()));
        assert_eq!(parse_command("/INFO please"), Some("info".to_string()));
        assert_eq!(parse_command("/start@feedback_bot"), Some("start".to_string()));
        assert_eq!(parse_command("hello /start"), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/@bot"), None);
    }

    #[test]
    fn test_slash_text_is_not_a_command() {
        assert_eq!(parse_command("/ hello"), None);
        assert_eq!(parse_command("/привет"), None);
        assert_eq!(parse_command("/10% off?"), None);
    }

    #[test]
    fn test_command_takes_priority() {
        let mut upd = update();
        upd.command = Some("start".to_string());
        upd.text = Some("/start".to_string());
        upd.photo = vec!["a".to_string()];
        assert_eq!(
            upd.classify(),
            Submission::Command {
                name: "start".to_string()
            }
        );
    }

    #[test]
    fn test_photo_uses_last_size_variant() {
        let mut upd = update();
        upd.photo = vec![
            "small".to_string(),
            "medium".to_string(),
            "large".to_string(),
        ];
        upd.caption = Some("look".to_string());
        assert_eq!(
            upd.classify(),
            Submission::Photo {
                file_id: "large".to_string(),
                caption: "look".to_string()
            }
        );
    }

    #[test]
    fn test_photo_without_caption() {
        let mut upd = update();
        upd.photo = vec!["only".to_string()];
        assert_eq!(
            upd.classify(),
            Submission::Photo {
                file_id: "only".to_string(),
                caption: String::new()
            }
        );
    }

    #[test]
    fn test_text() {
        let mut upd = update();
        upd.text = Some("hello".to_string());
        assert_eq!(
            upd.classify(),
            Submission::Text {
                body: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_empty_update_is_unclassified() {
        assert_eq!(update().classify(), Submission::Unclassified);

        let mut upd = update();
        upd.text = Some(String::new());
        upd.command = Some(String::new());
        assert_eq!(upd.classify(), Submission::Unclassified);
    }

    #[test]
    fn test_sender_handle_fallback() {
        assert_eq!(update().sender_handle(), "alice");
        let anonymous = InboundUpdate::default();
        assert_eq!(anonymous.sender_handle(), "unknown");
    }
}
