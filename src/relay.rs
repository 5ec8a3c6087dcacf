use futures::{Stream, StreamExt};
use tracing::{debug, error, info};

use crate::config::{AckTarget, Config};
use crate::error::SendError;
use crate::platform::{InboundUpdate, OutboundMessage, Submission, Transport};
use crate::responses::ResponseTable;

/// Sent back to the user once their submission has been forwarded.
pub const ACKNOWLEDGEMENT: &str = "Your message has been sent, thank you!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Answer to a command
    Reply,
    /// User submission relayed to an admin
    Forward,
    Acknowledgement,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Reply => write!(f, "reply"),
            MessageKind::Forward => write!(f, "forward"),
            MessageKind::Acknowledgement => write!(f, "acknowledgement"),
        }
    }
}

/// Result of one send attempt
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub chat_id: i64,
    pub kind: MessageKind,
    pub result: Result<(), SendError>,
}

impl DeliveryOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// What the relay did with an update
#[derive(Debug)]
pub enum Handled {
    Replied(DeliveryOutcome),
    Forwarded {
        /// One entry per recipient, in recipient order
        deliveries: Vec<DeliveryOutcome>,
        /// `None` when the acknowledgement was suppressed
        acknowledgement: Option<DeliveryOutcome>,
    },
    Ignored,
}

/// Forwards user submissions to the admin chats and answers commands.
///
/// All state is fixed at construction; the relay handles one update at a
/// time and never fails on a send error.
pub struct Relay<T> {
    transport: T,
    recipients: Vec<i64>,
    responses: ResponseTable,
    sender_chat_id: i64,
    acknowledge: AckTarget,
}

impl<T: Transport> Relay<T> {
    pub fn new(transport: T, config: &Config, responses: ResponseTable) -> Self {
        Self {
            transport,
            recipients: config.telegram.admin_ids.clone(),
            responses,
            sender_chat_id: config.relay.sender_chat_id,
            acknowledge: config.relay.acknowledge,
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle updates in arrival order until the stream ends.
    pub async fn run<S>(&self, updates: S)
    where
        S: Stream<Item = InboundUpdate>,
    {
        futures::pin_mut!(updates);
        while let Some(update) = updates.next().await {
            let chat_id = update.chat_id;
            match self.handle(&update).await {
                Handled::Replied(outcome) => {
                    debug!(
                        "Update from chat {}: {} to chat {} {}",
                        chat_id,
                        outcome.kind,
                        outcome.chat_id,
                        if outcome.is_ok() { "delivered" } else { "failed" }
                    );
                }
                Handled::Forwarded {
                    deliveries,
                    acknowledgement,
                } => {
                    let failed: Vec<i64> = deliveries
                        .iter()
                        .filter(|d| !d.is_ok())
                        .map(|d| d.chat_id)
                        .collect();
                    debug!(
                        "Update from chat {}: forwarded to {}/{} admin chats (failed: {:?}), acknowledgement {}",
                        chat_id,
                        deliveries.len() - failed.len(),
                        deliveries.len(),
                        failed,
                        match &acknowledgement {
                            Some(ack) if ack.is_ok() => "sent",
                            Some(_) => "failed",
                            None => "skipped",
                        }
                    );
                }
                Handled::Ignored => {}
            }
        }
        info!("Update stream ended");
    }

    pub async fn handle(&self, update: &InboundUpdate) -> Handled {
        match update.classify() {
            Submission::Command { name } => {
                debug!("Command /{} from chat {}", name, update.chat_id);
                Handled::Replied(self.reply_to_command(update.chat_id, &name).await)
            }
            Submission::Photo { file_id, caption } => {
                let caption = format!("Image from @{}\n\n{}", update.sender_handle(), caption);
                let deliveries = self.broadcast(&caption, Some(file_id.as_str())).await;
                let acknowledgement = self.acknowledge(update).await;
                Handled::Forwarded {
                    deliveries,
                    acknowledgement,
                }
            }
            Submission::Text { body } => {
                let text = format!("Text from @{}\n\n{}", update.sender_handle(), body);
                let deliveries = self.broadcast(&text, None).await;
                let acknowledgement = self.acknowledge(update).await;
                Handled::Forwarded {
                    deliveries,
                    acknowledgement,
                }
            }
            Submission::Unclassified => {
                debug!("Ignoring update from chat {}: nothing to relay", update.chat_id);
                Handled::Ignored
            }
        }
    }

    /// Send `text` (or the photo `file_id` captioned with `text`) to every
    /// recipient. A failed send does not stop the remaining ones.
    pub async fn broadcast(&self, text: &str, file_id: Option<&str>) -> Vec<DeliveryOutcome> {
        let mut deliveries = Vec::with_capacity(self.recipients.len());
        for &chat_id in &self.recipients {
            let message = match file_id {
                Some(file_id) => OutboundMessage::photo(chat_id, file_id, text),
                None => OutboundMessage::text(chat_id, text),
            };
            deliveries.push(self.deliver(message, MessageKind::Forward).await);
        }
        deliveries
    }

    pub async fn reply_to_command(&self, chat_id: i64, command: &str) -> DeliveryOutcome {
        let reply = self.responses.reply_for(command);
        self.deliver(OutboundMessage::text(chat_id, reply), MessageKind::Reply)
            .await
    }

    /// Confirm receipt to the sender, unless the target is the sender-chat sentinel.
    pub async fn acknowledge(&self, update: &InboundUpdate) -> Option<DeliveryOutcome> {
        let target = match self.acknowledge {
            AckTarget::Chat => Some(update.chat_id),
            AckTarget::User => update.sender.as_ref().map(|s| s.id),
        };

        let Some(chat_id) = target else {
            debug!("No sender on update from chat {}, skipping acknowledgement", update.chat_id);
            return None;
        };

        if chat_id == self.sender_chat_id {
            debug!("Chat {} is the sender chat, skipping acknowledgement", chat_id);
            return None;
        }

        Some(
            self.deliver(
                OutboundMessage::text(chat_id, ACKNOWLEDGEMENT),
                MessageKind::Acknowledgement,
            )
            .await,
        )
    }

    async fn deliver(&self, message: OutboundMessage, kind: MessageKind) -> DeliveryOutcome {
        let result = self.transport.send(&message).await;
        match &result {
            Ok(()) => info!("Sent {} to chat {}", kind, message.chat_id),
            Err(e) => error!("Failed to send {} to chat {}: {}", kind, message.chat_id, e),
        }
        DeliveryOutcome {
            chat_id: message.chat_id,
            kind,
            result,
        }
    }
}
