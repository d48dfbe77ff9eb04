//! Twitter web API types.
//!
//! The GraphQL endpoints return deeply nested, loosely versioned JSON, so
//! records are parsed field by field from [`serde_json::Value`] rather than
//! through derived deserializers. Missing optional fields become `None` or
//! zero; only a missing ID makes a record unparseable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TwitterError;
use crate::timeline::{self, ContentItem};

// ─────────────────────────────────────────────────────────────────────────────
// Pagination
// ─────────────────────────────────────────────────────────────────────────────

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in the page.
    pub items: Vec<T>,

    /// Cursor for the next (older) page.
    pub next_cursor: Option<String>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User Types
// ─────────────────────────────────────────────────────────────────────────────

/// Twitter user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID (`rest_id`)
    pub id: String,

    /// Handle without @
    pub screen_name: String,

    /// Display name
    pub name: String,

    /// Bio
    #[serde(default)]
    pub description: String,

    /// Followers count
    #[serde(default)]
    pub followers_count: u64,

    /// Following count
    #[serde(default)]
    pub following_count: u64,

    /// Tweet count
    #[serde(default)]
    pub statuses_count: u64,

    /// Legacy or Blue verification
    #[serde(default)]
    pub verified: bool,

    /// Account creation timestamp as returned by the API
    #[serde(default)]
    pub created_at: String,
}

impl User {
    /// Parse a `user_results.result` object.
    ///
    /// Returns `None` for `UserUnavailable` results and objects without an ID.
    #[must_use]
    pub fn from_result(result: &Value) -> Option<Self> {
        if typename(result) == Some("UserUnavailable") {
            return None;
        }
        let id = str_field(result, "rest_id")?;
        let legacy = result.get("legacy").unwrap_or(&Value::Null);
        let core = result.get("core").unwrap_or(&Value::Null);

        Some(Self {
            id,
            screen_name: str_field(core, "screen_name")
                .or_else(|| str_field(legacy, "screen_name"))
                .unwrap_or_default(),
            name: str_field(core, "name")
                .or_else(|| str_field(legacy, "name"))
                .unwrap_or_default(),
            description: str_field(legacy, "description").unwrap_or_default(),
            followers_count: u64_field(legacy, "followers_count"),
            following_count: u64_field(legacy, "friends_count"),
            statuses_count: u64_field(legacy, "statuses_count"),
            verified: bool_field(legacy, "verified") || bool_field(result, "is_blue_verified"),
            created_at: str_field(core, "created_at")
                .or_else(|| str_field(legacy, "created_at"))
                .unwrap_or_default(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tweet Types
// ─────────────────────────────────────────────────────────────────────────────

/// Twitter tweet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    /// Tweet ID (`rest_id`)
    pub id: String,

    /// Full text, preferring the long-form note text when present
    pub text: String,

    /// Author, when the response embeds it
    #[serde(default)]
    pub user: Option<User>,

    /// Creation timestamp as returned by the API
    #[serde(default)]
    pub created_at: String,

    /// Like count
    #[serde(default)]
    pub favorite_count: u64,

    /// Retweet count
    #[serde(default)]
    pub retweet_count: u64,

    /// Reply count
    #[serde(default)]
    pub reply_count: u64,

    /// Quote count
    #[serde(default)]
    pub quote_count: u64,

    /// View count, when exposed
    #[serde(default)]
    pub view_count: Option<u64>,

    /// Language (BCP47)
    #[serde(default)]
    pub lang: Option<String>,

    /// Whether the tweet quotes another tweet
    #[serde(default)]
    pub is_quote_status: bool,

    /// Whether the tweet may contain sensitive content
    #[serde(default)]
    pub possibly_sensitive: bool,

    /// ID of the tweet this one replies to
    #[serde(default)]
    pub in_reply_to: Option<String>,
}

impl Tweet {
    /// Parse a `tweet_results.result` object.
    ///
    /// Unwraps `TweetWithVisibilityResults`; returns `None` for tombstones and
    /// objects without an ID.
    #[must_use]
    pub fn from_result(result: &Value) -> Option<Self> {
        let result = match typename(result) {
            Some("TweetWithVisibilityResults") => result.get("tweet")?,
            Some("TweetTombstone" | "TweetUnavailable") => return None,
            _ => result,
        };
        let id = str_field(result, "rest_id")?;
        let legacy = result.get("legacy").unwrap_or(&Value::Null);

        let note_text = result
            .get("note_tweet")
            .and_then(|n| n.get("note_tweet_results"))
            .and_then(|n| n.get("result"))
            .and_then(|n| str_field(n, "text"));

        let user = result
            .get("core")
            .and_then(|c| c.get("user_results"))
            .and_then(|u| u.get("result"))
            .and_then(User::from_result);

        let view_count = result
            .get("views")
            .and_then(|v| v.get("count"))
            .and_then(|c| c.as_str().and_then(|s| s.parse().ok()).or_else(|| c.as_u64()));

        Some(Self {
            id,
            text: note_text
                .or_else(|| str_field(legacy, "full_text"))
                .unwrap_or_default(),
            user,
            created_at: str_field(legacy, "created_at").unwrap_or_default(),
            favorite_count: u64_field(legacy, "favorite_count"),
            retweet_count: u64_field(legacy, "retweet_count"),
            reply_count: u64_field(legacy, "reply_count"),
            quote_count: u64_field(legacy, "quote_count"),
            view_count,
            lang: str_field(legacy, "lang"),
            is_quote_status: bool_field(legacy, "is_quote_status"),
            possibly_sensitive: bool_field(legacy, "possibly_sensitive"),
            in_reply_to: str_field(legacy, "in_reply_to_status_id_str"),
        })
    }

    /// Parse the tweet carried by a content item, if any.
    #[must_use]
    pub fn from_item(item: &ContentItem<'_>) -> Option<Self> {
        item.tweet_result().and_then(Self::from_result)
    }

    /// Author handle, empty when the author is not embedded.
    #[must_use]
    pub fn author_screen_name(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.screen_name.as_str())
    }

    /// Author display name, empty when the author is not embedded.
    #[must_use]
    pub fn author_name(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.name.as_str())
    }

    /// Canonical status URL.
    #[must_use]
    pub fn url(&self) -> String {
        let handle = self.author_screen_name();
        let handle = if handle.is_empty() { "i/web" } else { handle };
        format!("https://x.com/{handle}/status/{}", self.id)
    }
}

/// Parse every tweet in a list of timeline instructions.
///
/// Non-tweet items (cursors, user modules, promoted placeholders) and entries
/// without content are skipped.
#[must_use]
pub fn tweets_from_instructions(instructions: &Value) -> Page<Tweet> {
    let entries = timeline::instruction_entries(instructions);
    let items = timeline::content_items(&entries)
        .iter()
        .filter_map(Tweet::from_item)
        .collect();
    Page {
        items,
        next_cursor: timeline::bottom_cursor(&entries),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversation Types
// ─────────────────────────────────────────────────────────────────────────────

/// A reply thread: the direct reply followed by its visible continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyThread {
    /// The direct reply.
    pub reply: Tweet,

    /// Further tweets in the same thread, in display order.
    pub continuation: Vec<Tweet>,
}

/// A focal tweet and the first page of its replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetDetail {
    /// The requested tweet.
    pub tweet: Tweet,

    /// Reply threads below it.
    pub replies: Vec<ReplyThread>,

    /// Cursor for more replies.
    pub next_cursor: Option<String>,
}

/// Split a conversation response into the focal tweet and reply threads.
///
/// Tweets before the focal one (the ancestors it replies to) are dropped, and
/// only reply thread modules after it become replies; promoted tweets and
/// related-tweet modules are skipped.
/// Returns `None` when the focal tweet is not in the response.
#[must_use]
pub fn detail_from_instructions(instructions: &Value, focal_id: &str) -> Option<TweetDetail> {
    let entries = timeline::instruction_entries(instructions);

    let (index, tweet) = entries.iter().enumerate().find_map(|(index, entry)| {
        let tweet = timeline::content_items(std::slice::from_ref(entry))
            .iter()
            .find_map(Tweet::from_item)?;
        (tweet.id == focal_id).then_some((index, tweet))
    })?;

    Some(TweetDetail {
        tweet,
        replies: reply_threads(&entries[index + 1..]),
        next_cursor: timeline::bottom_cursor(&entries),
    })
}

/// Parse reply threads from a conversation page fetched with a cursor.
#[must_use]
pub fn reply_threads_from_instructions(instructions: &Value) -> Page<ReplyThread> {
    let entries = timeline::instruction_entries(instructions);
    Page {
        items: reply_threads(&entries),
        next_cursor: timeline::bottom_cursor(&entries),
    }
}

fn reply_threads(entries: &[&Value]) -> Vec<ReplyThread> {
    timeline::conversation_threads(entries)
        .iter()
        .filter_map(|group| {
            let mut tweets = group.iter().filter_map(Tweet::from_item);
            let reply = tweets.next()?;
            Some(ReplyThread {
                reply,
                continuation: tweets.collect(),
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Search & Trends
// ─────────────────────────────────────────────────────────────────────────────

/// Search result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchProduct {
    /// Ranked by engagement.
    Top,
    /// Most recent first.
    #[default]
    Latest,
}

impl SearchProduct {
    /// Name used in GraphQL variables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Latest => "Latest",
        }
    }

    /// Parse leniently: anything other than `Top` means `Latest`.
    #[must_use]
    pub fn lenient(value: Option<&str>) -> Self {
        match value {
            Some("Top") => Self::Top,
            _ => Self::Latest,
        }
    }
}

/// Explore tab to read trends from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendCategory {
    #[default]
    Trending,
    ForYou,
    News,
    Sports,
    Entertainment,
}

impl TrendCategory {
    /// All categories, in the order tools advertise them.
    pub const ALL: [Self; 5] = [
        Self::Trending,
        Self::ForYou,
        Self::News,
        Self::Sports,
        Self::Entertainment,
    ];

    /// Tab identifier used by the guide endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::ForYou => "for-you",
            Self::News => "news",
            Self::Sports => "sports",
            Self::Entertainment => "entertainment",
        }
    }

    /// Entry ID prefix of the module holding this tab's trends.
    #[must_use]
    pub const fn entry_prefix(self) -> &'static str {
        match self {
            Self::Trending => "trends",
            _ => "Guide",
        }
    }
}

impl fmt::Display for TrendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendCategory {
    type Err = TwitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                TwitterError::invalid_argument(
                    "category",
                    format!(
                        "'{s}' is not one of trending, for-you, news, sports, entertainment"
                    ),
                )
            })
    }
}

/// A trending topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    /// Topic name
    pub name: String,

    /// Volume text such as "12.3K posts"
    #[serde(default)]
    pub tweets_count: Option<String>,

    /// Context such as "Trending in Sports"
    #[serde(default)]
    pub domain_context: Option<String>,

    /// Related topic names
    #[serde(default)]
    pub grouped_trends: Vec<String>,
}

impl Trend {
    /// Parse an `item.content.trend` object.
    #[must_use]
    pub fn from_data(trend: &Value) -> Option<Self> {
        let name = str_field(trend, "name")?;
        let metadata = trend.get("trendMetadata").unwrap_or(&Value::Null);
        let grouped_trends = trend
            .get("groupedTrends")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(|t| str_field(t, "name")).collect())
            .unwrap_or_default();

        Some(Self {
            name,
            tweets_count: str_field(metadata, "metaDescription"),
            domain_context: str_field(metadata, "domainContext"),
            grouped_trends,
        })
    }
}

/// Parse trends out of a guide response for `category`.
///
/// The guide lays trends out as a module whose items carry
/// `item.content.trend`; this shape differs from GraphQL timelines, so module
/// items are walked here rather than through `itemContent`. Items without a
/// trend are skipped.
#[must_use]
pub fn trends_from_guide(response: &Value, category: TrendCategory) -> Vec<Trend> {
    let instructions = response
        .get("timeline")
        .and_then(|t| t.get("instructions"))
        .unwrap_or(&Value::Null);
    let entries = timeline::instruction_entries(instructions);

    let prefix = category.entry_prefix();
    let Some(module) = entries
        .iter()
        .rev()
        .filter(|e| {
            e.get("entryId")
                .and_then(Value::as_str)
                .is_some_and(|id| id.starts_with(prefix))
        })
        .find_map(|e| e.get("content")?.get("timelineModule")?.get("items")?.as_array())
    else {
        return Vec::new();
    };

    module
        .iter()
        .filter_map(|item| item.get("item")?.get("content")?.get("trend"))
        .filter_map(Trend::from_data)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Field helpers
// ─────────────────────────────────────────────────────────────────────────────

fn typename(v: &Value) -> Option<&str> {
    v.get("__typename").and_then(Value::as_str)
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(String::from)
}

fn u64_field(v: &Value, key: &str) -> u64 {
    v.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn bool_field(v: &Value, key: &str) -> bool {
    v.get(key).and_then(Value::as_bool).unwrap_or(false)
}
