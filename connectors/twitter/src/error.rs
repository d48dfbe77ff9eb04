//! Twitter-specific error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while serving a tool call.
#[derive(Error, Debug)]
pub enum TwitterError {
    /// User input could not be resolved to a tweet ID
    #[error("Invalid tweet reference: '{input}' is neither a numeric ID nor a status URL")]
    InvalidReference { input: String },

    /// A tool argument is missing or out of range
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Session cookies are not configured
    #[error(
        "Missing Twitter credentials. Set TWITTER_CT0 and TWITTER_AUTH_TOKEN in {}.",
        path.display()
    )]
    MissingCredentials { path: PathBuf },

    /// The platform rejected the session cookies
    #[error("Authentication failed with provided cookies: {0}")]
    AuthenticationFailed(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Twitter API returned an error
    #[error("Twitter API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        retry_after: Option<u64>,
    },

    /// Rate limited
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// The requested user or tweet does not exist or is not visible
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response did not have the shape we rely on
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TwitterError {
    /// Shorthand for [`TwitterError::InvalidArgument`].
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// Get the suggested retry delay.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(Duration::from_secs(*retry_after)),
            Self::Api { retry_after, .. } => retry_after.map(Duration::from_secs),
            _ => None,
        }
    }
}

/// Result type for Twitter operations.
pub type TwitterResult<T> = Result<T, TwitterError>;
