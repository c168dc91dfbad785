//! Messenger webhook delivery payloads.
//!
//! One delivery may batch several entries, each with several messaging
//! events from different users.

use serde::{Deserialize, Serialize};

/// `object` value for page subscriptions.
pub const PAGE_OBJECT: &str = "page";

/// Postback payload sent by the "Get Started" button.
pub const WELCOME_PAYLOAD: &str = "WELCOME";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

impl WebhookPayload {
    pub fn is_page(&self) -> bool {
        self.object == PAGE_OBJECT
    }

    /// All messaging events across all entries, in delivery order.
    pub fn into_events(self) -> impl Iterator<Item = MessagingEvent> {
        self.entry.into_iter().flat_map(|e| e.messaging)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagingEvent {
    pub sender: Party,
    #[serde(default)]
    pub recipient: Option<Party>,
    #[serde(default)]
    pub message: Option<EventMessage>,
    #[serde(default)]
    pub postback: Option<Postback>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub is_echo: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Postback {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub payload: String,
}

/// What the bot should do with one messaging event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A user typed text.
    Text { sender: String, text: String },
    /// A user sent media; only text is supported.
    Attachment { sender: String },
    /// A button press.
    Postback { sender: String, payload: String },
    /// Echo of our own outbound message, or nothing actionable.
    Ignored,
}

impl MessagingEvent {
    pub fn classify(self) -> InboundEvent {
        let sender = self.sender.id;
        match (self.message, self.postback) {
            (Some(message), _) if !message.is_echo => {
                if message.attachments.is_some() {
                    InboundEvent::Attachment { sender }
                } else {
                    match message.text {
                        Some(text) if !text.is_empty() => InboundEvent::Text { sender, text },
                        _ => InboundEvent::Ignored,
                    }
                }
            }
            (Some(_echo), _) => InboundEvent::Ignored,
            (None, Some(postback)) => InboundEvent::Postback {
                sender,
                payload: postback.payload,
            },
            (None, None) => InboundEvent::Ignored,
        }
    }
}
