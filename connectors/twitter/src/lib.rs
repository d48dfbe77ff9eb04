//! Twitter MCP server
//!
//! A Model Context Protocol server exposing read-only Twitter/X tools backed
//! by the web GraphQL API and a browser session's cookies.
//!
//! ## Tools
//!
//! - `get_user_info` - profile of a user by handle
//! - `get_tweet_by_id` - a tweet by numeric ID or status URL
//! - `search_tweets` - search, `Top` or `Latest`
//! - `get_timeline` / `get_latest_timeline` - home timelines
//! - `get_tweet_replies` - replies to a tweet, following reply cursors
//! - `get_trends` - trending topics by explore tab
//!
//! Write and direct-message tools are disabled.
//!
//! ## Credentials
//!
//! `TWITTER_CT0` and `TWITTER_AUTH_TOKEN` are read from the environment or the
//! configured `.env` file on every call; editing the file takes effect
//! without a restart.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod protocol;
pub mod reference;
pub mod server;
pub mod session;
pub mod timeline;
pub mod tools;
pub mod types;

pub use client::{GraphqlApiClient, PlatformClient};
pub use config::TwitterConfig;
pub use credentials::{CredentialProvider, Credentials, EnvFileCredentials, StaticCredentials};
pub use error::{TwitterError, TwitterResult};
pub use protocol::{ProtocolError, handle_message};
pub use reference::{TweetId, resolve};
pub use server::{ToolOutput, TwitterMcpServer};
pub use session::{ClientFactory, HttpClientFactory, SessionCache};
