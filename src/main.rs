use std::sync::Arc;

use anyhow::Context;

use tickerbot::agent::session::spawn_expiry_task;
use tickerbot::agent::{Dispatcher, DispatcherDeps, SessionRegistry};
use tickerbot::channels::{MessengerChannel, WebhookState, webhook_routes};
use tickerbot::config::BotConfig;
use tickerbot::nlu::WitClient;
use tickerbot::providers::{AlphaVantageClient, NomicsClient};
use tickerbot::safety::SignatureVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("Failed to load configuration")?;
    let http = config.http_client()?;

    eprintln!("📈 tickerbot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: http://0.0.0.0:{}/", config.port);
    eprintln!("   Verify token: {}", config.verify_token);
    eprintln!(
        "   Sessions: max {}, idle timeout {}s\n",
        config.session.max_sessions,
        config.session.idle_timeout.as_secs()
    );

    // ── Sessions ────────────────────────────────────────────────────────
    let sessions = SessionRegistry::new(config.session.clone());
    let _expiry_handle = spawn_expiry_task(Arc::clone(&sessions), config.session.sweep_interval);

    // ── Connectors ──────────────────────────────────────────────────────
    let nlu = Arc::new(WitClient::new(
        http.clone(),
        &config.endpoints.wit,
        config.wit_token.clone(),
        config.wit_api_version.clone(),
    ));
    let market = Arc::new(NomicsClient::new(
        http.clone(),
        &config.endpoints.nomics,
        config.nomics_api_key.clone(),
    ));
    let stocks = Arc::new(AlphaVantageClient::new(
        http.clone(),
        &config.endpoints.alpha_vantage,
        config.stock_api_key.clone(),
    ));
    let messenger = Arc::new(MessengerChannel::new(
        http,
        &config.endpoints.graph,
        config.page_token.clone(),
    ));

    let dispatcher = Dispatcher::new(DispatcherDeps {
        nlu,
        market,
        stocks,
        sender: messenger.clone(),
        profiles: messenger,
        sessions,
    });

    // ── Webhook server ──────────────────────────────────────────────────
    let app = webhook_routes(WebhookState {
        verifier: Arc::new(SignatureVerifier::new(config.app_secret.clone())),
        verify_token: Arc::from(config.verify_token.as_str()),
        dispatcher,
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Listening for webhook deliveries");

    axum::serve(listener, app).await?;
    Ok(())
}
