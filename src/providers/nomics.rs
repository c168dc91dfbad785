//! Nomics currencies ticker connector.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::{Lookup, MarketData, Ticker};
use crate::error::ProviderError;

const PROVIDER: &str = "nomics";

/// Ticker interval requested on every call.
const INTERVAL: &str = "1h";

#[derive(Clone)]
pub struct NomicsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl NomicsClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn fetch(&self, symbol: &str, fiat: &str) -> Result<Vec<Ticker>, ProviderError> {
        let url = format!("{}/currencies/ticker", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.expose_secret()),
                ("ids", symbol),
                ("interval", INTERVAL),
                ("convert", fiat),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::BadStatus {
                provider: PROVIDER.into(),
                status: status.as_u16(),
            });
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl MarketData for NomicsClient {
    async fn ticker(&self, symbol: &str, fiat: &str) -> Lookup<Vec<Ticker>> {
        match self.fetch(symbol, fiat).await {
            Ok(tickers) if tickers.is_empty() => {
                debug!(symbol, fiat, "No ticker for symbol");
                Lookup::Empty
            }
            Ok(tickers) => {
                debug!(symbol, fiat, count = tickers.len(), "Ticker lookup succeeded");
                Lookup::Found(tickers)
            }
            Err(e) => {
                warn!(symbol, fiat, error = %e, "Ticker lookup failed");
                Lookup::Unavailable(e.to_string())
            }
        }
    }
}
