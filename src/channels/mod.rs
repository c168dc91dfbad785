//! Messaging platform I/O: inbound webhook, payload types, outbound replies.

pub mod channel;
pub mod events;
pub mod messenger;
pub mod webhook;

pub use channel::*;
pub use events::{InboundEvent, WebhookPayload};
pub use messenger::MessengerChannel;
pub use webhook::{WebhookState, webhook_routes};
