//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TwitterError, TwitterResult};

/// Public bearer token of the x.com web client. Session requests are
/// authorised by the cookies; this only identifies the client application.
const WEB_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

/// Configuration for the Twitter MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// Base URL of the web API (default: https://x.com/i/api)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token sent alongside the session cookies
    #[serde(default = "default_bearer_token")]
    pub bearer_token: String,

    /// Client language sent in `x-twitter-client-language`
    #[serde(default = "default_language")]
    pub language: String,

    /// `.env` file holding `TWITTER_CT0` and `TWITTER_AUTH_TOKEN`
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    /// Request timeout
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// Extra reply pages fetched by `get_tweet_replies` beyond the first
    #[serde(default = "default_max_reply_pages")]
    pub max_reply_pages: u32,

    /// GraphQL operation IDs
    #[serde(default)]
    pub operations: GraphqlOperations,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_api_url() -> String {
    "https://x.com/i/api".into()
}

fn default_bearer_token() -> String {
    WEB_BEARER_TOKEN.into()
}

fn default_language() -> String {
    "en-US".into()
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_reply_pages() -> u32 {
    4
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// GraphQL operation IDs.
///
/// The web client rotates these on deploys; each one can be overridden
/// without a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlOperations {
    #[serde(default = "default_user_by_screen_name")]
    pub user_by_screen_name: String,

    #[serde(default = "default_tweet_detail")]
    pub tweet_detail: String,

    #[serde(default = "default_search_timeline")]
    pub search_timeline: String,

    #[serde(default = "default_home_timeline")]
    pub home_timeline: String,

    #[serde(default = "default_home_latest_timeline")]
    pub home_latest_timeline: String,

    #[serde(default = "default_user_tweets")]
    pub user_tweets: String,
}

fn default_user_by_screen_name() -> String {
    "NimuplG1OB7Fd2btCLdBOw".into()
}

fn default_tweet_detail() -> String {
    "U0HTv-bAWTBYylwEMT7x5A".into()
}

fn default_search_timeline() -> String {
    "flaR-PUMshxFWZWPNpq4zA".into()
}

fn default_home_timeline() -> String {
    "-X_hcgQzmHGl29-UXxPdsg".into()
}

fn default_home_latest_timeline() -> String {
    "U0cdisy7QFIoTfu3-Okw0A".into()
}

fn default_user_tweets() -> String {
    "QWF3SzpHmykQHsQMixG0cg".into()
}

impl Default for GraphqlOperations {
    fn default() -> Self {
        Self {
            user_by_screen_name: default_user_by_screen_name(),
            tweet_detail: default_tweet_detail(),
            search_timeline: default_search_timeline(),
            home_timeline: default_home_timeline(),
            home_latest_timeline: default_home_latest_timeline(),
            user_tweets: default_user_tweets(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts per request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay between retries in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            bearer_token: default_bearer_token(),
            language: default_language(),
            env_file: default_env_file(),
            timeout: default_timeout(),
            max_reply_pages: default_max_reply_pages(),
            operations: GraphqlOperations::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl TwitterConfig {
    /// Build a configuration from `TWITTER_MCP_*` environment variables,
    /// falling back to defaults for anything unset.
    ///
    /// `TWITTER_MCP_CONFIG` may point at a JSON file with the same fields;
    /// individual variables override it.
    pub fn from_env() -> TwitterResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TwitterConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> TwitterResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = match get("TWITTER_MCP_CONFIG") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    TwitterError::Config(format!("Cannot read config file {path}: {e}"))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    TwitterError::Config(format!("Invalid config file {path}: {e}"))
                })?
            }
            None => Self::default(),
        };

        if let Some(url) = get("TWITTER_MCP_API_URL") {
            config.api_url = url;
        }
        if let Some(language) = get("TWITTER_MCP_LANGUAGE") {
            config.language = language;
        }
        if let Some(path) = get("TWITTER_MCP_ENV_FILE") {
            config.env_file = PathBuf::from(path);
        }
        if let Some(secs) = get("TWITTER_MCP_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|e| {
                TwitterError::Config(format!("TWITTER_MCP_TIMEOUT_SECS must be an integer: {e}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(pages) = get("TWITTER_MCP_MAX_REPLY_PAGES") {
            config.max_reply_pages = pages.parse().map_err(|e| {
                TwitterError::Config(format!("TWITTER_MCP_MAX_REPLY_PAGES must be an integer: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> TwitterResult<()> {
        if url::Url::parse(&self.api_url).is_err() {
            return Err(TwitterError::Config(format!(
                "api_url is not a valid URL: {}",
                self.api_url
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(TwitterError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimitInfo {
    /// Maximum number of requests allowed in the window
    pub limit: Option<u32>,

    /// Remaining requests in the current window
    pub remaining: Option<u32>,

    /// Unix timestamp when the rate limit resets
    pub reset: Option<u64>,
}

impl RateLimitInfo {
    /// Parse rate limit info from response headers.
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            limit: header("x-rate-limit-limit").and_then(|v| v.parse().ok()),
            remaining: header("x-rate-limit-remaining").and_then(|v| v.parse().ok()),
            reset: header("x-rate-limit-reset").and_then(|v| v.parse().ok()),
        }
    }

    /// Check if we're rate limited (remaining == 0).
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Get the duration until rate limit resets.
    #[must_use]
    pub fn time_until_reset(&self) -> Option<Duration> {
        let reset = self.reset?;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?
            .as_secs();

        if reset > now {
            Some(Duration::from_secs(reset - now))
        } else {
            None
        }
    }
}
