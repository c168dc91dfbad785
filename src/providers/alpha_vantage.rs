//! Alpha Vantage `GLOBAL_QUOTE` connector.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Lookup, StockQuote, StockQuotes};
use crate::error::ProviderError;

const PROVIDER: &str = "alpha_vantage";
const FUNCTION: &str = "GLOBAL_QUOTE";

const FIELD_SYMBOL: &str = "01. symbol";
const FIELD_PRICE: &str = "05. price";

/// Unknown symbols come back as `{"Global Quote": {}}` or `{}`. Throttling,
/// bad keys and malformed calls are reported with HTTP 200 and one of the
/// notice fields instead.
#[derive(Debug, Default, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    global_quote: HashMap<String, String>,
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
}

impl GlobalQuoteResponse {
    fn notice(&mut self) -> Option<String> {
        self.error_message
            .take()
            .or_else(|| self.note.take())
            .or_else(|| self.information.take())
    }

    fn into_quote(mut self) -> Option<StockQuote> {
        let symbol = self.global_quote.remove(FIELD_SYMBOL)?;
        let price = self.global_quote.remove(FIELD_PRICE)?;
        Some(StockQuote { symbol, price })
    }
}

#[derive(Clone)]
pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl AlphaVantageClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn fetch(&self, symbol: &str) -> Result<GlobalQuoteResponse, ProviderError> {
        let url = format!("{}/query", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("function", FUNCTION),
                ("symbol", symbol),
                ("apikey", self.api_key.expose_secret()),
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

        let mut body: GlobalQuoteResponse =
            resp.json().await.map_err(|e| ProviderError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;

        match body.notice() {
            Some(reason) => Err(ProviderError::Rejected {
                provider: PROVIDER.into(),
                reason,
            }),
            None => Ok(body),
        }
    }
}

#[async_trait]
impl StockQuotes for AlphaVantageClient {
    async fn global_quote(&self, symbol: &str) -> Lookup<StockQuote> {
        match self.fetch(symbol).await {
            Ok(resp) => match resp.into_quote() {
                Some(quote) => {
                    debug!(symbol, price = %quote.price, "Stock quote lookup succeeded");
                    Lookup::Found(quote)
                }
                None => {
                    debug!(symbol, "No stock quote for symbol");
                    Lookup::Empty
                }
            },
            Err(e) => {
                warn!(symbol, error = %e, "Stock quote lookup failed");
                Lookup::Unavailable(e.to_string())
            }
        }
    }
}
