//! Error types for tickerbot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("NLU error: {0}")]
    Nlu(#[from] NluError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),
}

/// Webhook signature verification failures.
///
/// A missing header is not an error; see [`crate::safety::Verification::Unsigned`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Request signature does not match payload")]
    Mismatch,

    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid app secret: {0}")]
    InvalidKey(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Profile lookup failed for {user_id}: {reason}")]
    ProfileLookup { user_id: String, reason: String },
}

/// NLU service errors.
#[derive(Debug, thiserror::Error)]
pub enum NluError {
    #[error("NLU request failed: {0}")]
    RequestFailed(String),

    #[error("NLU returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Invalid NLU response: {0}")]
    InvalidResponse(String),
}

/// Data provider errors.
///
/// Connectors never surface these to callers; they are folded into
/// [`crate::providers::Lookup::Unavailable`] after being logged.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned status {status}")]
    BadStatus { provider: String, status: u16 },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} rejected the request: {reason}")]
    Rejected { provider: String, reason: String },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
