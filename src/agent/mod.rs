//! Agent module — session registry, intent routing and per-event dispatch.

pub mod dispatcher;
pub mod reply;
pub mod router;
pub mod session;

pub use dispatcher::{Dispatcher, DispatcherDeps};
pub use router::{CryptoQuote, QuoteStyle, RoutingDecision, route};
pub use session::{Session, SessionId, SessionRegistry};
