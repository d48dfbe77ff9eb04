//! Tool catalog and argument parsing.
//!
//! Schemas carry no cookie parameters; authentication comes from the
//! configured credential source.

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{TwitterError, TwitterResult};

/// Tools that mutate the account or read private messages. They are not
/// listed and refuse to run.
pub const DISABLED_TOOLS: [&str; 7] = [
    "tweet",
    "like_tweet",
    "retweet",
    "send_dm",
    "add_reaction_to_message",
    "delete_dm",
    "get_dm_history",
];

/// Name of the deprecated authentication tool.
pub const AUTHENTICATE_TOOL: &str = "authenticate";

/// Reply to `authenticate`.
pub const AUTHENTICATE_GUIDANCE: &str =
    "Authentication is automatic using .env. The authenticate tool is deprecated.";

/// Default number of results for list tools.
pub const DEFAULT_COUNT: u32 = 20;

/// Upper bound for tweet counts.
pub const MAX_TWEET_COUNT: u32 = 100;

/// Upper bound for trend counts.
pub const MAX_TREND_COUNT: u32 = 50;

/// Tools served by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetUserInfo,
    GetTweetById,
    SearchTweets,
    GetTimeline,
    GetLatestTimeline,
    GetTweetReplies,
    GetTrends,
}

impl Tool {
    pub const ALL: [Self; 7] = [
        Self::GetUserInfo,
        Self::GetTweetById,
        Self::GetTimeline,
        Self::GetLatestTimeline,
        Self::SearchTweets,
        Self::GetTweetReplies,
        Self::GetTrends,
    ];

    /// Wire name of the tool.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetUserInfo => "get_user_info",
            Self::GetTweetById => "get_tweet_by_id",
            Self::SearchTweets => "search_tweets",
            Self::GetTimeline => "get_timeline",
            Self::GetLatestTimeline => "get_latest_timeline",
            Self::GetTweetReplies => "get_tweet_replies",
            Self::GetTrends => "get_trends",
        }
    }

    /// Look a tool up by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }
}

/// Whether `name` is a disabled tool.
#[must_use]
pub fn is_disabled(name: &str) -> bool {
    DISABLED_TOOLS.contains(&name)
}

/// Text returned when a disabled tool is called.
#[must_use]
pub fn disabled_message(name: &str) -> String {
    format!("Tool '{name}' is disabled on this server for safety.")
}

/// An entry in the `tools/list` response.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn count_schema(what: &str, max: u32) -> Value {
    json!({
        "type": "integer",
        "description": format!("Number of {what} to return (default: {DEFAULT_COUNT})"),
        "default": DEFAULT_COUNT,
        "minimum": 1,
        "maximum": max
    })
}

/// Every tool advertised by the server.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: Tool::GetUserInfo.name(),
            description: "Get information about a Twitter user",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "username": {
                        "type": "string",
                        "description": "The username (without @) to get info for"
                    }
                },
                "required": ["username"]
            }),
        },
        ToolDefinition {
            name: Tool::GetTweetById.name(),
            description: "Get a single tweet by its ID or status URL",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tweet_input": {
                        "type": "string",
                        "description": "Tweet ID or URL, e.g. https://x.com/user/status/1234567890"
                    }
                },
                "required": ["tweet_input"]
            }),
        },
        ToolDefinition {
            name: Tool::GetTimeline.name(),
            description: "Get tweets from your timeline",
            input_schema: json!({
                "type": "object",
                "properties": { "count": count_schema("tweets", MAX_TWEET_COUNT) }
            }),
        },
        ToolDefinition {
            name: Tool::GetLatestTimeline.name(),
            description: "Get latest tweets from your timeline",
            input_schema: json!({
                "type": "object",
                "properties": { "count": count_schema("tweets", MAX_TWEET_COUNT) }
            }),
        },
        ToolDefinition {
            name: Tool::SearchTweets.name(),
            description: "Search for tweets with a specific query",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The search query" },
                    "count": count_schema("tweets", MAX_TWEET_COUNT),
                    "product": {
                        "type": "string",
                        "description": "Type of results to return (e.g., 'Top' or 'Latest')",
                        "enum": ["Top", "Latest"],
                        "default": "Latest"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: Tool::GetTweetReplies.name(),
            description: "Get replies to a specific tweet",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tweet_id": {
                        "type": "string",
                        "description": "The ID or status URL of the tweet to get replies for"
                    },
                    "count": count_schema("replies", MAX_TWEET_COUNT)
                },
                "required": ["tweet_id"]
            }),
        },
        ToolDefinition {
            name: Tool::GetTrends.name(),
            description: "Get trending topics on Twitter",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "The category of trends to retrieve",
                        "enum": ["trending", "for-you", "news", "sports", "entertainment"],
                        "default": "trending"
                    },
                    "count": count_schema("trends", MAX_TREND_COUNT)
                }
            }),
        },
    ]
}

/// A required string argument.
pub fn required_str<'a>(args: &'a Value, name: &str) -> TwitterResult<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| TwitterError::invalid_argument(name, "is required"))
}

/// An optional string argument.
#[must_use]
pub fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// An optional count in `1..=max`, defaulting to [`DEFAULT_COUNT`].
pub fn count_arg(args: &Value, name: &str, max: u32) -> TwitterResult<u32> {
    let Some(raw) = args.get(name).filter(|v| !v.is_null()) else {
        return Ok(DEFAULT_COUNT.min(max));
    };
    let count = raw
        .as_u64()
        .ok_or_else(|| TwitterError::invalid_argument(name, "must be a positive integer"))?;
    if count == 0 || count > u64::from(max) {
        return Err(TwitterError::invalid_argument(
            name,
            format!("must be between 1 and {max}"),
        ));
    }
    u32::try_from(count).map_err(|_| TwitterError::invalid_argument(name, "out of range"))
}
