//! Natural-language understanding boundary.
//!
//! The NLU service turns one utterance into entities, traits and intents
//! with confidence scores. [`extract`] reduces that to the scalar slots the
//! router consumes.

pub mod extract;
pub mod wit;

pub use extract::{Amount, ExtractedSlots, PriceMarker, Subject, SubjectKind, Subjects};
pub use wit::WitClient;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NluError;

/// One scored candidate for an entity or trait.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Scalar, or an object carrying a nested `value`.
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub confidence: f64,
}

impl Candidate {
    pub fn new(value: impl Into<serde_json::Value>, confidence: f64) -> Self {
        Self {
            value: value.into(),
            confidence,
        }
    }
}

/// One ranked intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub name: serde_json::Value,
    #[serde(default)]
    pub confidence: f64,
}

impl Intent {
    pub fn new(name: impl Into<serde_json::Value>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// Structured result for one utterance. Candidate order is provider order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NluExtraction {
    #[serde(default)]
    pub entities: HashMap<String, Vec<Candidate>>,
    #[serde(default)]
    pub traits: HashMap<String, Vec<Candidate>>,
    #[serde(default)]
    pub intents: Vec<Intent>,
}

/// Classifies free text.
#[async_trait]
pub trait NluProvider: Send + Sync {
    async fn classify(&self, text: &str) -> Result<NluExtraction, NluError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wit_shape() {
        let raw = serde_json::json!({
            "text": "current price of btc",
            "entities": {
                "cryptocurrency:cryptocurrency": [
                    {"id": "1", "name": "cryptocurrency", "role": "cryptocurrency",
                     "value": "btc", "confidence": 0.95, "body": "btc"}
                ]
            },
            "intents": [{"id": "2", "name": "crypto-price", "confidence": 0.99}],
            "traits": {}
        });
        let parsed: NluExtraction = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.entities["cryptocurrency:cryptocurrency"][0].value, "btc");
        assert_eq!(parsed.intents[0].name, "crypto-price");
        assert!(parsed.traits.is_empty());
    }

    #[test]
    fn missing_sections_default_empty() {
        let parsed: NluExtraction = serde_json::from_str("{}").unwrap();
        assert!(parsed.entities.is_empty());
        assert!(parsed.intents.is_empty());
    }
}
