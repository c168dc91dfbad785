//! Intent router: an ordered rule table from slots to exactly one decision.
//!
//! Rules are evaluated top to bottom and the first match wins, so a row
//! shadows every row below it. Add new intents as new rows, never by
//! loosening an existing predicate.

use crate::nlu::{Amount, ExtractedSlots, SubjectKind};

/// Fiat used when the utterance names none.
pub const DEFAULT_FIAT: &str = "USD";

/// Intent name the NLU assigns to stock questions.
pub const STOCK_PRICE_INTENT: &str = "stock-price";

/// How a crypto quote is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// Full ticker detail ("btc", "current price of btc").
    Ticker,
    /// Unit price times amount in a fiat ("convert 2 btc to inr").
    Conversion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoQuote {
    pub symbol: String,
    pub fiat: String,
    pub amount: Amount,
    pub style: QuoteStyle,
}

/// The single action taken for one text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    Farewell,
    Greeting,
    CryptoQuote(CryptoQuote),
    CryptoMarketCap { symbol: String },
    StockQuote { symbol: String },
    Unsupported,
}

/// One row of the routing table.
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&ExtractedSlots) -> Option<RoutingDecision>,
}

/// Market cap lookups prefer the crypto slot, then fiat, then company.
const MARKET_CAP_ORDER: [SubjectKind; 3] =
    [SubjectKind::Crypto, SubjectKind::Fiat, SubjectKind::Company];

/// Stock lookups prefer the company slot, then crypto, then fiat.
const STOCK_ORDER: [SubjectKind; 3] =
    [SubjectKind::Company, SubjectKind::Crypto, SubjectKind::Fiat];

/// The routing table, highest priority first.
pub const RULES: &[Rule] = &[
    Rule {
        name: "farewell",
        apply: farewell,
    },
    Rule {
        name: "greeting",
        apply: greeting,
    },
    Rule {
        name: "crypto_ticker",
        apply: crypto_ticker,
    },
    Rule {
        name: "crypto_conversion",
        apply: crypto_conversion,
    },
    Rule {
        name: "market_cap",
        apply: market_cap,
    },
    Rule {
        name: "stock_quote",
        apply: stock_quote,
    },
];

/// Route slots to a decision.
pub fn route(slots: &ExtractedSlots) -> RoutingDecision {
    route_with_rule(slots).0
}

/// Route slots and report which rule fired (`"unsupported"` when none did).
pub fn route_with_rule(slots: &ExtractedSlots) -> (RoutingDecision, &'static str) {
    RULES
        .iter()
        .find_map(|rule| (rule.apply)(slots).map(|decision| (decision, rule.name)))
        .unwrap_or((RoutingDecision::Unsupported, "unsupported"))
}

fn farewell(slots: &ExtractedSlots) -> Option<RoutingDecision> {
    slots.farewell.then_some(RoutingDecision::Farewell)
}

fn greeting(slots: &ExtractedSlots) -> Option<RoutingDecision> {
    slots.greeting.then_some(RoutingDecision::Greeting)
}

fn crypto_ticker(slots: &ExtractedSlots) -> Option<RoutingDecision> {
    let symbol = slots.subjects.crypto.as_deref()?;
    if slots.price_marker.is_some() || slots.amount.is_some() || slots.stock_marker.is_some() {
        return None;
    }
    Some(RoutingDecision::CryptoQuote(CryptoQuote {
        symbol: symbol.to_uppercase(),
        fiat: DEFAULT_FIAT.to_string(),
        amount: Amount::ONE,
        style: QuoteStyle::Ticker,
    }))
}

fn crypto_conversion(slots: &ExtractedSlots) -> Option<RoutingDecision> {
    let symbol = slots.subjects.crypto.as_deref()?;
    if slots.price_marker.is_none() && slots.amount.is_none() {
        return None;
    }
    if slots.is_market_cap() {
        return None;
    }
    let fiat = slots
        .subjects
        .fiat
        .as_deref()
        .map(str::to_uppercase)
        .unwrap_or_else(|| DEFAULT_FIAT.to_string());
    Some(RoutingDecision::CryptoQuote(CryptoQuote {
        symbol: symbol.to_uppercase(),
        fiat,
        amount: slots.amount.clone().unwrap_or(Amount::ONE),
        style: QuoteStyle::Conversion,
    }))
}

fn market_cap(slots: &ExtractedSlots) -> Option<RoutingDecision> {
    if !slots.is_market_cap() {
        return None;
    }
    let subject = slots.subjects.first_of(&MARKET_CAP_ORDER)?;
    Some(RoutingDecision::CryptoMarketCap {
        symbol: subject.symbol().to_uppercase(),
    })
}

fn stock_quote(slots: &ExtractedSlots) -> Option<RoutingDecision> {
    if slots.top_intent.as_deref() != Some(STOCK_PRICE_INTENT) || slots.stock_marker.is_none() {
        return None;
    }
    let subject = slots.subjects.first_of(&STOCK_ORDER)?;
    Some(RoutingDecision::StockQuote {
        symbol: subject.symbol().to_uppercase(),
    })
}
