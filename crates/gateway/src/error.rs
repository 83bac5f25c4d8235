use thiserror::Error;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while invoking a model
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No API key configured for the provider
    #[error("Missing API key for provider: {0}")]
    MissingApiKey(String),

    /// HTTP-level failure talking to the provider
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a shape we cannot interpret
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The provider name is not one of the supported backends
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Concurrency limit must be at least 1
    #[error("Concurrency limit must be greater than 0")]
    InvalidConcurrencyLimit,

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error occurred
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl GatewayError {
    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}
