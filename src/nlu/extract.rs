//! Slot extraction: reduce an [`NluExtraction`] to first-qualifying scalars.
//!
//! Only the first candidate in provider order is ever considered. Missing
//! keys, empty arrays and falsy values all collapse to `None`.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use super::{Candidate, Intent, NluExtraction};

/// Traits must score strictly above this to count.
pub const TRAIT_CONFIDENCE_THRESHOLD: f64 = 0.9;

pub const TRAIT_GREETINGS: &str = "wit$greetings";
pub const TRAIT_BYE: &str = "wit$bye";
pub const ENTITY_CRYPTO: &str = "cryptocurrency:cryptocurrency";
pub const ENTITY_FIAT: &str = "fiatcurrency:fiatcurrency";
pub const ENTITY_PRICE: &str = "price:price";
pub const ENTITY_NUMBER: &str = "wit$number:number";
pub const ENTITY_STOCK: &str = "stock:stock";
pub const ENTITY_COMPANY: &str = "company:company";

const MARKET_CAP: &str = "market cap";

/// First trait candidate's value, if truthy and confidence > 0.9.
///
/// Structured values count as present and come back as their JSON text.
pub fn first_trait_value(traits: &HashMap<String, Vec<Candidate>>, name: &str) -> Option<String> {
    let first = traits.get(name)?.first()?;
    if !is_truthy(&first.value) || first.confidence <= TRAIT_CONFIDENCE_THRESHOLD {
        return None;
    }
    Some(scalar_string(&first.value).unwrap_or_else(|| first.value.to_string()))
}

/// First entity candidate's value, no confidence gate.
pub fn first_entity_value(entities: &HashMap<String, Vec<Candidate>>, name: &str) -> Option<String> {
    let first = entities.get(name)?.first()?;
    unwrap_value(&first.value)
}

/// Name of the top-ranked intent.
pub fn intent_name(intents: &[Intent]) -> Option<String> {
    unwrap_value(&intents.first()?.name)
}

/// Truthy scalar, or the truthy `value` field of an object.
fn unwrap_value(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value {
        Value::Object(map) => {
            let inner = map.get("value")?;
            if is_truthy(inner) {
                scalar_string(inner)
            } else {
                None
            }
        }
        other => scalar_string(other),
    }
}

/// JavaScript-style truthiness as used by the NLU payloads.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Which extraction slot a symbol-like value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    Crypto,
    Fiat,
    Company,
}

/// A symbol-like value, tagged with the slot the NLU put it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Crypto(String),
    Fiat(String),
    Company(String),
}

impl Subject {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Crypto(s) | Self::Fiat(s) | Self::Company(s) => s,
        }
    }
}

/// The three places a symbol may land, depending on how the NLU tagged it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subjects {
    pub crypto: Option<String>,
    pub fiat: Option<String>,
    pub company: Option<String>,
}

impl Subjects {
    pub fn get(&self, kind: SubjectKind) -> Option<Subject> {
        match kind {
            SubjectKind::Crypto => self.crypto.clone().map(Subject::Crypto),
            SubjectKind::Fiat => self.fiat.clone().map(Subject::Fiat),
            SubjectKind::Company => self.company.clone().map(Subject::Company),
        }
    }

    /// First present subject in `order`.
    pub fn first_of(&self, order: &[SubjectKind]) -> Option<Subject> {
        order.iter().find_map(|kind| self.get(*kind))
    }
}

/// Value of the `price` entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceMarker {
    MarketCap,
    Other(String),
}

impl From<String> for PriceMarker {
    fn from(value: String) -> Self {
        if value == MARKET_CAP {
            Self::MarketCap
        } else {
            Self::Other(value)
        }
    }
}

/// Value of the `number` entity.
///
/// Routing only cares that a number was said. Whether it fits in a
/// [`Decimal`] matters when the reply is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amount {
    Exact(Decimal),
    /// Raw text of a number `Decimal` can't hold, e.g. `1e30`.
    Unrepresentable(String),
}

impl Amount {
    pub const ONE: Self = Self::Exact(Decimal::ONE);

    pub fn parse(raw: String) -> Self {
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map(Self::Exact)
            .unwrap_or(Self::Unrepresentable(raw))
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Self::Exact(d) => Some(*d),
            Self::Unrepresentable(_) => None,
        }
    }
}

/// Per-message slots consumed by the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSlots {
    pub subjects: Subjects,
    pub price_marker: Option<PriceMarker>,
    pub amount: Option<Amount>,
    pub stock_marker: Option<String>,
    pub top_intent: Option<String>,
    pub greeting: bool,
    pub farewell: bool,
}

impl ExtractedSlots {
    pub fn from_extraction(nlu: &NluExtraction) -> Self {
        let entity = |name: &str| first_entity_value(&nlu.entities, name);

        Self {
            subjects: Subjects {
                crypto: entity(ENTITY_CRYPTO),
                fiat: entity(ENTITY_FIAT),
                company: entity(ENTITY_COMPANY),
            },
            price_marker: entity(ENTITY_PRICE).map(PriceMarker::from),
            amount: entity(ENTITY_NUMBER).map(Amount::parse),
            stock_marker: entity(ENTITY_STOCK),
            top_intent: intent_name(&nlu.intents),
            greeting: first_trait_value(&nlu.traits, TRAIT_GREETINGS).is_some(),
            farewell: first_trait_value(&nlu.traits, TRAIT_BYE).is_some(),
        }
    }

    pub fn is_market_cap(&self) -> bool {
        self.price_marker == Some(PriceMarker::MarketCap)
    }
}
