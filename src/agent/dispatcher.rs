//! Per-event orchestration.
//!
//! A delivery is unwrapped into messaging events and each one is handled in
//! its own task. Within one text message the chain is strictly sequential:
//! NLU → slot extraction → routing → fulfillment → exactly one reply.
//! Ordering across messages or users is not guaranteed.

use std::sync::Arc;

use tracing::{Instrument, debug, error, info, info_span, warn};

use super::reply;
use super::router::{self, CryptoQuote, QuoteStyle, RoutingDecision};
use super::session::SessionRegistry;
use crate::channels::events::{InboundEvent, MessagingEvent, WELCOME_PAYLOAD, WebhookPayload};
use crate::channels::{ProfileLookup, ReplySender};
use crate::nlu::{ExtractedSlots, NluProvider};
use crate::providers::{Lookup, MarketData, StockQuotes};

/// Everything the dispatcher talks to.
pub struct DispatcherDeps {
    pub nlu: Arc<dyn NluProvider>,
    pub market: Arc<dyn MarketData>,
    pub stocks: Arc<dyn StockQuotes>,
    pub sender: Arc<dyn ReplySender>,
    pub profiles: Arc<dyn ProfileLookup>,
    pub sessions: Arc<SessionRegistry>,
}

pub struct Dispatcher {
    deps: DispatcherDeps,
}

impl Dispatcher {
    pub fn new(deps: DispatcherDeps) -> Arc<Self> {
        Arc::new(Self { deps })
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.deps.sessions
    }

    /// Spawn one task per messaging event without awaiting any of them.
    ///
    /// The handles are returned for callers that want to wait (tests);
    /// the webhook drops them.
    pub fn dispatch(self: &Arc<Self>, payload: WebhookPayload) -> Vec<tokio::task::JoinHandle<()>> {
        payload
            .into_events()
            .map(|event| {
                let this = Arc::clone(self);
                tokio::spawn(async move { this.handle_event(event).await })
            })
            .collect()
    }

    /// Handle one messaging event to completion.
    pub async fn handle_event(&self, event: MessagingEvent) {
        match event.classify() {
            InboundEvent::Text { sender, text } => {
                let session_id = self.deps.sessions.find_or_create(&sender).await;
                let span = info_span!("message", user = %sender, session = %session_id);
                async {
                    if let Some(text) = self.handle_text(&text).await {
                        self.send(&sender, &text).await;
                    }
                }
                .instrument(span)
                .await;
            }
            InboundEvent::Attachment { sender } => {
                debug!(user = %sender, "Attachment received");
                self.send(&sender, reply::TEXT_ONLY).await;
            }
            InboundEvent::Postback { sender, payload } => {
                self.handle_postback(&sender, &payload).await;
            }
            InboundEvent::Ignored => {
                debug!("Ignoring non-actionable messaging event");
            }
        }
    }

    /// Classify, route and fulfil one utterance.
    ///
    /// Returns `None` when the NLU call fails: no reply is sent in that case.
    pub async fn handle_text(&self, text: &str) -> Option<String> {
        let extraction = match self.deps.nlu.classify(text).await {
            Ok(extraction) => extraction,
            Err(e) => {
                error!(error = %e, "NLU classification failed");
                return None;
            }
        };

        let slots = ExtractedSlots::from_extraction(&extraction);
        let (decision, rule) = router::route_with_rule(&slots);
        info!(rule, decision = ?decision, "Routed message");

        Some(self.fulfil(&decision).await)
    }

    /// Produce the reply text for a decision, calling a connector if needed.
    pub async fn fulfil(&self, decision: &RoutingDecision) -> String {
        match decision {
            RoutingDecision::Farewell => reply::FAREWELL.to_string(),
            RoutingDecision::Greeting => reply::GREETING.to_string(),
            RoutingDecision::Unsupported => reply::UNSUPPORTED.to_string(),
            RoutingDecision::CryptoQuote(quote) => self.crypto_quote(quote).await,
            RoutingDecision::CryptoMarketCap { symbol } => {
                match self.deps.market.ticker(symbol, router::DEFAULT_FIAT).await {
                    Lookup::Found(tickers) => tickers
                        .first()
                        .map(reply::market_cap)
                        .unwrap_or_else(|| reply::market_cap_unavailable(symbol)),
                    Lookup::Empty => reply::market_cap_unavailable(symbol),
                    Lookup::Unavailable(_) => reply::PROVIDER_UNAVAILABLE.to_string(),
                }
            }
            RoutingDecision::StockQuote { symbol } => {
                match self.deps.stocks.global_quote(symbol).await {
                    Lookup::Found(quote) => reply::stock_price(&quote),
                    Lookup::Empty => reply::stock_unavailable(symbol),
                    Lookup::Unavailable(_) => reply::PROVIDER_UNAVAILABLE.to_string(),
                }
            }
        }
    }

    async fn crypto_quote(&self, quote: &CryptoQuote) -> String {
        let tickers = match self.deps.market.ticker(&quote.symbol, &quote.fiat).await {
            Lookup::Found(tickers) => tickers,
            Lookup::Empty => return reply::invalid_crypto_symbol(&quote.symbol),
            Lookup::Unavailable(_) => return reply::PROVIDER_UNAVAILABLE.to_string(),
        };
        let Some(ticker) = tickers.first() else {
            return reply::invalid_crypto_symbol(&quote.symbol);
        };

        match quote.style {
            QuoteStyle::Ticker => reply::ticker_detail(ticker),
            QuoteStyle::Conversion => reply::conversion(ticker, &quote.amount, &quote.fiat),
        }
    }

    async fn handle_postback(&self, sender: &str, payload: &str) {
        if payload != WELCOME_PAYLOAD {
            debug!(user = %sender, payload, "Unhandled postback");
            return;
        }

        let first_name = match self.deps.profiles.first_name(sender).await {
            Ok(name) => Some(name),
            Err(e) => {
                warn!(user = %sender, error = %e, "Profile lookup failed");
                None
            }
        };
        self.send(sender, &reply::welcome(first_name.as_deref())).await;
    }

    /// Deliver a reply. Failures are logged and dropped.
    async fn send(&self, recipient: &str, text: &str) {
        if let Err(e) = self.deps.sender.send_text(recipient, text).await {
            error!(
                channel = self.deps.sender.name(),
                recipient = %recipient,
                error = %e,
                "Reply delivery failed"
            );
        }
    }
}
