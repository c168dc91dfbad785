//! Wit.ai `/message` client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::{NluExtraction, NluProvider};
use crate::error::NluError;

/// Classifies utterances through the Wit.ai HTTP API.
#[derive(Clone)]
pub struct WitClient {
    client: reqwest::Client,
    base_url: String,
    access_token: SecretString,
    api_version: String,
}

impl WitClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        access_token: SecretString,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            api_version: api_version.into(),
        }
    }
}

#[async_trait]
impl NluProvider for WitClient {
    async fn classify(&self, text: &str) -> Result<NluExtraction, NluError> {
        let url = format!("{}/message", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.access_token.expose_secret())
            .query(&[("v", self.api_version.as_str()), ("q", text)])
            .send()
            .await
            .map_err(|e| NluError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NluError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let extraction: NluExtraction = resp
            .json()
            .await
            .map_err(|e| NluError::InvalidResponse(e.to_string()))?;

        debug!(
            intents = ?extraction.intents,
            entities = ?extraction.entities,
            traits = ?extraction.traits,
            "Wit classification"
        );
        Ok(extraction)
    }
}
