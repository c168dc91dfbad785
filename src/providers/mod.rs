//! Fulfillment connectors: read-only market data and stock quote lookups.
//!
//! Both connectors make a single attempt and never return an error to the
//! caller. Failures are logged and folded into [`Lookup::Unavailable`] so
//! the dispatcher can pick the user-facing text per outcome.

pub mod alpha_vantage;
pub mod nomics;

pub use alpha_vantage::AlphaVantageClient;
pub use nomics::NomicsClient;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// Tagged result of one lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// The provider returned data.
    Found(T),
    /// The call succeeded but nothing matched (e.g. unknown symbol).
    Empty,
    /// Transport or provider failure. Carries a log-only detail.
    Unavailable(String),
}

/// One ticker record from the market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub rank: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub symbol: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub market_cap: String,
}

/// A stock quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub price: String,
}

/// Cryptocurrency ticker lookups.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Tickers for `symbol` priced in `fiat`. An empty array is [`Lookup::Empty`].
    async fn ticker(&self, symbol: &str, fiat: &str) -> Lookup<Vec<Ticker>>;
}

/// Equity quote lookups.
#[async_trait]
pub trait StockQuotes: Send + Sync {
    async fn global_quote(&self, symbol: &str) -> Lookup<StockQuote>;
}

/// Providers send some numeric fields as strings and some as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_accepts_mixed_field_types() {
        let ticker: Ticker = serde_json::from_value(serde_json::json!({
            "name": "Bitcoin",
            "rank": 1,
            "symbol": "BTC",
            "price": "50000.12",
            "market_cap": 900000000000u64,
            "logo_url": "ignored"
        }))
        .unwrap();
        assert_eq!(ticker.rank, "1");
        assert_eq!(ticker.price, "50000.12");
        assert_eq!(ticker.market_cap, "900000000000");
    }

    #[test]
    fn ticker_missing_fields_default_empty() {
        let ticker: Ticker = serde_json::from_str(r#"{"symbol": "BTC"}"#).unwrap();
        assert_eq!(ticker.symbol, "BTC");
        assert!(ticker.name.is_empty());
    }
}
