//! Messenger webhook endpoints.
//!
//! - `GET /` answers the subscription handshake.
//! - `POST /` authenticates a delivery, hands its events to the dispatcher
//!   and acknowledges immediately with an empty 200.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, warn};

use crate::agent::Dispatcher;
use crate::channels::events::WebhookPayload;
use crate::safety::{SIGNATURE_HEADER, SignatureVerifier, Verification};

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    pub verifier: Arc<SignatureVerifier>,
    pub verify_token: Arc<str>,
    pub dispatcher: Arc<Dispatcher>,
}

/// Query parameters of the subscription handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Build the webhook router.
pub fn webhook_routes(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(verify_subscription).post(receive_delivery))
        .route("/health", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn health() -> impl IntoResponse {
    "ok"
}

/// GET /
///
/// Echo `hub.challenge` when the mode is `subscribe` and the token matches.
/// A matching request without a challenge gets an empty 200.
async fn verify_subscription(
    State(state): State<WebhookState>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    let subscribed = params.mode.as_deref() == Some("subscribe")
        && params.verify_token.as_deref() == Some(&*state.verify_token);

    if subscribed {
        (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
    } else {
        warn!(mode = ?params.mode, "Webhook verification rejected");
        StatusCode::BAD_REQUEST.into_response()
    }
}

/// POST /
async fn receive_delivery(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = match headers.get(SIGNATURE_HEADER).map(|v| v.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            warn!("Rejected delivery: non-ASCII signature header");
            return StatusCode::FORBIDDEN;
        }
    };

    match state.verifier.verify(signature, &body) {
        Ok(Verification::Verified) => {}
        Ok(Verification::Unsigned) => debug!("Processing unsigned delivery"),
        Err(e) => {
            warn!(error = %e, "Rejected delivery: signature check failed");
            return StatusCode::FORBIDDEN;
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected delivery: body is not a webhook payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    if payload.is_page() {
        state.dispatcher.dispatch(payload);
    } else {
        debug!(object = %payload.object, "Ignoring non-page delivery");
    }

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::agent::{DispatcherDeps, SessionRegistry};
    use crate::channels::{ProfileLookup, ReplySender};
    use crate::config::SessionConfig;
    use crate::error::{ChannelError, NluError};
    use crate::nlu::{NluExtraction, NluProvider};
    use crate::providers::{Lookup, MarketData, StockQuote, StockQuotes, Ticker};

    struct Nothing;

    #[async_trait]
    impl NluProvider for Nothing {
        async fn classify(&self, _text: &str) -> Result<NluExtraction, NluError> {
            Ok(NluExtraction::default())
        }
    }

    #[async_trait]
    impl MarketData for Nothing {
        async fn ticker(&self, _symbol: &str, _fiat: &str) -> Lookup<Vec<Ticker>> {
            Lookup::Empty
        }
    }

    #[async_trait]
    impl StockQuotes for Nothing {
        async fn global_quote(&self, _symbol: &str) -> Lookup<StockQuote> {
            Lookup::Empty
        }
    }

    #[async_trait]
    impl ProfileLookup for Nothing {
        async fn first_name(&self, user_id: &str) -> Result<String, ChannelError> {
            Err(ChannelError::ProfileLookup {
                user_id: user_id.into(),
                reason: "none".into(),
            })
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl ReplySender for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn send_text(&self, recipient_id: &str, _text: &str) -> Result<(), ChannelError> {
            self.0.lock().unwrap().push(recipient_id.to_string());
            Ok(())
        }
    }

    const SECRET: &str = "app-secret";
    const TOKEN: &str = "0123456789abcdef";

    fn app() -> (Router, Arc<SessionRegistry>) {
        let nothing = Arc::new(Nothing);
        let sessions = SessionRegistry::new(SessionConfig::default());
        let dispatcher = Dispatcher::new(DispatcherDeps {
            nlu: nothing.clone(),
            market: nothing.clone(),
            stocks: nothing.clone(),
            sender: Arc::new(Recorder::default()),
            profiles: nothing,
            sessions: Arc::clone(&sessions),
        });
        let state = WebhookState {
            verifier: Arc::new(SignatureVerifier::new(SecretString::from(SECRET))),
            verify_token: Arc::from(TOKEN),
            dispatcher,
        };
        (webhook_routes(state), sessions)
    }

    fn sign(body: &[u8]) -> String {
        SignatureVerifier::new(SecretString::from(SECRET))
            .sign(body)
            .unwrap()
    }

    async fn body_string(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post(body: &'static str, signature: Option<String>) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            req = req.header("X-Hub-Signature", sig);
        }
        req.body(Body::from(body)).unwrap()
    }

    const DELIVERY: &str =
        r#"{"object":"page","entry":[{"messaging":[{"sender":{"id":"42"},"message":{"text":"hi"}}]}]}"#;

    #[tokio::test]
    async fn handshake_echoes_challenge() {
        let (app, _) = app();
        let resp = app
            .oneshot(
                Request::get(format!(
                    "/?hub.mode=subscribe&hub.verify_token={TOKEN}&hub.challenge=12345"
                ))
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "12345");
    }

    #[tokio::test]
    async fn handshake_without_challenge_is_empty_200() {
        let (app, _) = app();
        let resp = app
            .oneshot(
                Request::get(format!("/?hub.mode=subscribe&hub.verify_token={TOKEN}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "");
    }

    #[tokio::test]
    async fn handshake_wrong_token_is_400() {
        let (app, _) = app();
        let resp = app
            .oneshot(
                Request::get("/?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn handshake_wrong_mode_is_400() {
        let (app, _) = app();
        let resp = app
            .oneshot(
                Request::get(format!(
                    "/?hub.mode=unsubscribe&hub.verify_token={TOKEN}&hub.challenge=1"
                ))
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signed_delivery_is_acknowledged_empty() {
        let (app, _) = app();
        let resp = app
            .oneshot(post(DELIVERY, Some(sign(DELIVERY.as_bytes()))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.is_empty());
    }

    #[tokio::test]
    async fn bad_signature_is_403() {
        let (app, _) = app();
        let tampered = sign(br#"{"object":"page","entry":[]}"#);
        let resp = app.oneshot(post(DELIVERY, Some(tampered))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unsupported_algorithm_is_403() {
        let (app, _) = app();
        let resp = app
            .oneshot(post(DELIVERY, Some("sha256=00".into())))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unsigned_delivery_is_accepted() {
        let (app, _) = app();
        let resp = app.oneshot(post(DELIVERY, None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let (app, _) = app();
        let body = "{not json";
        let resp = app
            .oneshot(post(body, Some(sign(body.as_bytes()))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_page_object_is_acknowledged_and_ignored() {
        let (app, sessions) = app();
        let body = r#"{"object":"instagram","entry":[{"messaging":[{"sender":{"id":"42"},"message":{"text":"hi"}}]}]}"#;
        let resp = app
            .oneshot(post(body, Some(sign(body.as_bytes()))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn health_ok() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "ok");
    }
}
