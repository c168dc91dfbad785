//! Outbound channel seams.

use async_trait::async_trait;

use crate::error::ChannelError;

/// Delivers a text reply to one platform user.
///
/// Delivery is fire-and-forget from the conversation's point of view: the
/// caller logs a failure and moves on. Implementations must not retry.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Channel name, for logs.
    fn name(&self) -> &str;

    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), ChannelError>;
}

/// Resolves a platform user's public profile.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn first_name(&self, user_id: &str) -> Result<String, ChannelError>;
}
