//! Messenger channel — Send API replies and profile lookups.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::channels::{ProfileLookup, ReplySender};
use crate::error::ChannelError;

const CHANNEL_NAME: &str = "messenger";

/// Graph API version used for profile lookups.
const PROFILE_API_VERSION: &str = "v2.6";

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    first_name: Option<String>,
}

/// Talks to the Facebook Graph API on behalf of one page.
#[derive(Clone)]
pub struct MessengerChannel {
    client: reqwest::Client,
    graph_base: String,
    page_token: SecretString,
}

impl MessengerChannel {
    pub fn new(client: reqwest::Client, graph_base: &str, page_token: SecretString) -> Self {
        Self {
            client,
            graph_base: graph_base.trim_end_matches('/').to_string(),
            page_token,
        }
    }

    fn send_failed(reason: impl Into<String>) -> ChannelError {
        ChannelError::SendFailed {
            name: CHANNEL_NAME.into(),
            reason: reason.into(),
        }
    }
}

/// Send API request body.
pub fn text_envelope(recipient_id: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "recipient": { "id": recipient_id },
        "message": { "text": text }
    })
}

/// The Graph API reports failures as `{"error": {"message": ...}}`.
fn graph_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GraphErrorBody>(body)
        .ok()?
        .error?
        .message
}

#[async_trait]
impl ReplySender for MessengerChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), ChannelError> {
        let body = text_envelope(recipient_id, text);
        debug!(recipient = %recipient_id, "Messenger sendMessage");

        let resp = self
            .client
            .post(format!("{}/me/messages", self.graph_base))
            .query(&[("access_token", self.page_token.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::send_failed(e.to_string()))?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();

        if let Some(message) = graph_error_message(&raw) {
            return Err(Self::send_failed(message));
        }
        if !status.is_success() {
            return Err(Self::send_failed(format!("status {status}: {raw}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileLookup for MessengerChannel {
    async fn first_name(&self, user_id: &str) -> Result<String, ChannelError> {
        let lookup_failed = |reason: String| ChannelError::ProfileLookup {
            user_id: user_id.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(format!(
                "{}/{PROFILE_API_VERSION}/{user_id}",
                self.graph_base
            ))
            .query(&[
                ("access_token", self.page_token.expose_secret()),
                ("fields", "first_name"),
            ])
            .send()
            .await
            .map_err(|e| lookup_failed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(lookup_failed(format!("status {}", resp.status())));
        }

        let profile: Profile = resp.json().await.map_err(|e| lookup_failed(e.to_string()))?;
        profile
            .first_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| lookup_failed("profile has no first_name".into()))
    }
}
