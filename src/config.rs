//! Configuration types.

use std::time::Duration;

use rand::RngCore;
use secrecy::SecretString;

use crate::error::ConfigError;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8445;

/// Wit.ai API version sent with every `/message` call.
pub const DEFAULT_WIT_API_VERSION: &str = "20200513";

pub const DEFAULT_WIT_BASE_URL: &str = "https://api.wit.ai";
pub const DEFAULT_NOMICS_BASE_URL: &str = "https://api.nomics.com/v1";
pub const DEFAULT_ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// Session registry configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session idle timeout (sessions are pruned after this duration).
    pub idle_timeout: Duration,
    /// Upper bound on live sessions; the least recently seen one is evicted first.
    pub max_sessions: usize,
    /// How often the expiry sweep runs.
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(3600), // 1 hour
            max_sessions: 10_000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Base URLs of every outbound service. Overridable so tests can point at mocks.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub wit: String,
    pub nomics: String,
    pub alpha_vantage: String,
    pub graph: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            wit: DEFAULT_WIT_BASE_URL.to_string(),
            nomics: DEFAULT_NOMICS_BASE_URL.to_string(),
            alpha_vantage: DEFAULT_ALPHA_VANTAGE_BASE_URL.to_string(),
            graph: DEFAULT_GRAPH_BASE_URL.to_string(),
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub port: u16,
    /// Token the platform must echo during webhook verification.
    /// Generated at startup and never persisted.
    pub verify_token: String,
    pub wit_token: SecretString,
    pub wit_api_version: String,
    pub nomics_api_key: SecretString,
    pub stock_api_key: SecretString,
    pub page_token: SecretString,
    pub app_secret: SecretString,
    pub endpoints: Endpoints,
    pub session: SessionConfig,
    /// Optional per-request timeout for outbound HTTP. `None` keeps transport defaults.
    pub http_timeout: Option<Duration>,
}

impl BotConfig {
    /// Build the configuration from environment variables.
    ///
    /// `FB_PAGE_TOKEN` and `FB_APP_SECRET` are required; the provider keys
    /// default to empty strings, which the providers reject at request time.
    pub fn from_env() -> Result<Self, ConfigError> {
        let page_token = required_var("FB_PAGE_TOKEN")?;
        let app_secret = required_var("FB_APP_SECRET")?;

        let port = parsed_var("PORT")?.unwrap_or(DEFAULT_PORT);

        let endpoints = Endpoints {
            wit: env_or("TICKERBOT_WIT_URL", DEFAULT_WIT_BASE_URL),
            nomics: env_or("TICKERBOT_NOMICS_URL", DEFAULT_NOMICS_BASE_URL),
            alpha_vantage: env_or("TICKERBOT_ALPHA_VANTAGE_URL", DEFAULT_ALPHA_VANTAGE_BASE_URL),
            graph: env_or("TICKERBOT_GRAPH_URL", DEFAULT_GRAPH_BASE_URL),
        };

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            idle_timeout: parsed_var::<u64>("TICKERBOT_SESSION_IDLE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            max_sessions: parsed_var("TICKERBOT_MAX_SESSIONS")?.unwrap_or(defaults.max_sessions),
            sweep_interval: defaults.sweep_interval,
        };
        if session.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TICKERBOT_MAX_SESSIONS".into(),
                message: "must be at least 1".into(),
            });
        }

        let http_timeout = parsed_var::<u64>("TICKERBOT_HTTP_TIMEOUT_SECS")?.map(Duration::from_secs);

        Ok(Self {
            port,
            verify_token: generate_verify_token(),
            wit_token: SecretString::from(std::env::var("WIT_TOKEN").unwrap_or_default()),
            wit_api_version: env_or("WIT_API_VERSION", DEFAULT_WIT_API_VERSION),
            nomics_api_key: SecretString::from(std::env::var("NOMICS_API_KEY").unwrap_or_default()),
            stock_api_key: SecretString::from(std::env::var("STOCK_API_KEY").unwrap_or_default()),
            page_token: SecretString::from(page_token),
            app_secret: SecretString::from(app_secret),
            endpoints,
            session,
            http_timeout,
        })
    }

    /// Shared HTTP client for every outbound connector.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }
}

/// 8 random bytes, hex-encoded.
pub fn generate_verify_token() -> String {
    let mut buf = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

fn required_var(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}
