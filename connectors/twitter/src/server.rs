//! MCP server: tool and resource handlers.
//!
//! Every tool call loads the current credentials, obtains a verified client
//! from the session cache and dispatches to an `op_*` handler. Tool failures
//! are reported as text results prefixed with `Error:`.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{
    client::PlatformClient,
    config::TwitterConfig,
    credentials::{CredentialProvider, EnvFileCredentials},
    error::{TwitterError, TwitterResult},
    protocol::{PROTOCOL_VERSION, ProtocolError},
    reference::{self, normalize_username},
    session::{ClientFactory, HttpClientFactory, SessionCache},
    tools::{self, MAX_TREND_COUNT, MAX_TWEET_COUNT, Tool},
    types::{SearchProduct, TrendCategory, Tweet, User},
};

/// URI scheme of the server's resources.
const RESOURCE_SCHEME: &str = "twitter";

const DEFAULT_RESOURCE_USER: &str = "twitter";
const DEFAULT_RESOURCE_QUERY: &str = "python";

/// A readable `twitter://` resource.
enum Resource<'a> {
    Timeline,
    UserTweets(&'a str),
    Search(&'a str),
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(err: &TwitterError) -> Self {
        Self {
            text: format!("Error: {err}"),
            is_error: true,
        }
    }

    /// MCP `CallToolResult`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error
        })
    }
}

/// Twitter MCP server.
pub struct TwitterMcpServer {
    credentials: Arc<dyn CredentialProvider>,
    sessions: SessionCache,
    max_reply_pages: u32,
}

impl TwitterMcpServer {
    /// Create a server that reads cookies from the configured `.env` file and
    /// talks to the web API.
    #[must_use]
    pub fn new(config: TwitterConfig) -> Self {
        let credentials = Arc::new(EnvFileCredentials::new(config.env_file.clone()));
        let max_reply_pages = config.max_reply_pages;
        Self::with_parts(
            credentials,
            Box::new(HttpClientFactory::new(config)),
            max_reply_pages,
        )
    }

    /// Create a server from explicit credential and client sources.
    #[must_use]
    pub fn with_parts(
        credentials: Arc<dyn CredentialProvider>,
        factory: Box<dyn ClientFactory>,
        max_reply_pages: u32,
    ) -> Self {
        Self {
            credentials,
            sessions: SessionCache::new(factory),
            max_reply_pages,
        }
    }

    /// Handle the initialize method.
    #[instrument(skip(self, params))]
    pub fn handle_initialize(&self, params: &Value) -> Value {
        let client = params
            .get("clientInfo")
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(client, "Initializing MCP session");

        json!({
            "protocolVersion": params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(PROTOCOL_VERSION),
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false }
            },
            "serverInfo": {
                "name": "twitter-mcp",
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    /// Handle the tools/list method.
    #[must_use]
    pub fn handle_list_tools(&self) -> Value {
        json!({ "tools": tools::tool_definitions() })
    }

    /// Handle the tools/call method.
    #[instrument(skip(self, params))]
    pub async fn handle_call_tool(&self, params: &Value) -> Result<Value, ProtocolError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidParams("Missing 'name' field".into()))?;
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        Ok(self.call_tool(name, &args).await.to_value())
    }

    /// Run a tool by name.
    #[instrument(skip(self, args))]
    pub async fn call_tool(&self, name: &str, args: &Value) -> ToolOutput {
        if name == tools::AUTHENTICATE_TOOL {
            return ToolOutput::text(tools::AUTHENTICATE_GUIDANCE);
        }
        if tools::is_disabled(name) {
            info!(tool = name, "Refusing disabled tool");
            return ToolOutput::text(tools::disabled_message(name));
        }
        let Some(tool) = Tool::from_name(name) else {
            return ToolOutput {
                text: format!("Error: Unknown tool: {name}"),
                is_error: true,
            };
        };

        debug!(tool = name, "Invoking tool");
        let result = match self.client().await {
            Ok(client) => self.dispatch_operation(client.as_ref(), tool, args).await,
            Err(e) => Err(e),
        };

        match result.and_then(|value| Ok(serde_json::to_string_pretty(&value)?)) {
            Ok(text) => ToolOutput::text(text),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                ToolOutput::error(&e)
            }
        }
    }

    /// Handle the resources/list method.
    #[must_use]
    pub fn handle_list_resources(&self) -> Value {
        json!({
            "resources": [
                {
                    "uri": "twitter://timeline",
                    "name": "Twitter Timeline",
                    "description": "Get tweets from your timeline",
                    "mimeType": "application/json"
                },
                {
                    "uri": "twitter://user-tweets",
                    "name": "User Tweets",
                    "description": "Get tweets from a specific user (username in the URI fragment)",
                    "mimeType": "application/json"
                },
                {
                    "uri": "twitter://search",
                    "name": "Search Tweets",
                    "description": "Search for tweets (query in the URI fragment)",
                    "mimeType": "application/json"
                }
            ]
        })
    }

    /// Handle the resources/read method.
    #[instrument(skip(self, params))]
    pub async fn handle_read_resource(&self, params: &Value) -> Result<Value, ProtocolError> {
        let raw = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidParams("Missing 'uri' field".into()))?;
        let uri = Url::parse(raw)
            .map_err(|e| ProtocolError::InvalidParams(format!("Invalid URI '{raw}': {e}")))?;

        if uri.scheme() != RESOURCE_SCHEME {
            return Err(ProtocolError::InvalidParams(format!(
                "Unsupported URI scheme: {}",
                uri.scheme()
            )));
        }

        let target = uri
            .host_str()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| uri.path().trim_start_matches('/'));
        let fragment = uri.fragment().filter(|f| !f.is_empty());

        let resource = match target {
            "timeline" => Resource::Timeline,
            "user-tweets" => Resource::UserTweets(normalize_username(
                fragment.unwrap_or(DEFAULT_RESOURCE_USER),
            )?),
            "search" => Resource::Search(fragment.unwrap_or(DEFAULT_RESOURCE_QUERY)),
            other => {
                return Err(ProtocolError::InvalidParams(format!(
                    "Unknown resource path: {other}"
                )));
            }
        };

        let client = self.client().await?;
        let tweets = match resource {
            Resource::Timeline => client.home_timeline(tools::DEFAULT_COUNT).await?,
            Resource::UserTweets(username) => {
                let user = client.user_by_screen_name(username).await?;
                client.user_tweets(&user.id, tools::DEFAULT_COUNT).await?
            }
            Resource::Search(query) => {
                client
                    .search(query, tools::DEFAULT_COUNT, SearchProduct::Latest)
                    .await?
            }
        };

        let summaries: Vec<Value> = tweets.items.iter().map(tweet_summary).collect();
        let text = serde_json::to_string_pretty(&summaries)
            .map_err(|e| ProtocolError::Internal(e.to_string()))?;

        Ok(json!({
            "contents": [{
                "uri": raw,
                "mimeType": "application/json",
                "text": text
            }]
        }))
    }

    async fn client(&self) -> TwitterResult<Arc<dyn PlatformClient>> {
        let credentials = self.credentials.load()?;
        self.sessions.client(&credentials).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operation dispatch
    // ─────────────────────────────────────────────────────────────────────────

    async fn dispatch_operation(
        &self,
        client: &dyn PlatformClient,
        tool: Tool,
        args: &Value,
    ) -> TwitterResult<Value> {
        match tool {
            Tool::GetUserInfo => Self::op_get_user_info(client, args).await,
            Tool::GetTweetById => Self::op_get_tweet_by_id(client, args).await,
            Tool::SearchTweets => Self::op_search_tweets(client, args).await,
            Tool::GetTimeline => Self::op_get_timeline(client, args).await,
            Tool::GetLatestTimeline => Self::op_get_latest_timeline(client, args).await,
            Tool::GetTweetReplies => self.op_get_tweet_replies(client, args).await,
            Tool::GetTrends => Self::op_get_trends(client, args).await,
        }
    }

    async fn op_get_user_info(client: &dyn PlatformClient, args: &Value) -> TwitterResult<Value> {
        let username = normalize_username(tools::required_str(args, "username")?)?;
        let user = client.user_by_screen_name(username).await?;
        Ok(user_info(&user))
    }

    async fn op_get_tweet_by_id(client: &dyn PlatformClient, args: &Value) -> TwitterResult<Value> {
        let tweet_id = reference::resolve(tools::required_str(args, "tweet_input")?)?;
        let detail = client.tweet_detail(&tweet_id).await?;
        Ok(tweet_full(&detail.tweet))
    }

    async fn op_search_tweets(client: &dyn PlatformClient, args: &Value) -> TwitterResult<Value> {
        let query = tools::required_str(args, "query")?;
        let count = tools::count_arg(args, "count", MAX_TWEET_COUNT)?;
        let product = SearchProduct::lenient(tools::optional_str(args, "product"));

        let page = client.search(query, count, product).await?;
        Ok(tweet_summaries(&page.items, count))
    }

    async fn op_get_timeline(client: &dyn PlatformClient, args: &Value) -> TwitterResult<Value> {
        let count = tools::count_arg(args, "count", MAX_TWEET_COUNT)?;
        let page = client.home_timeline(count).await?;
        Ok(tweet_summaries(&page.items, count))
    }

    async fn op_get_latest_timeline(
        client: &dyn PlatformClient,
        args: &Value,
    ) -> TwitterResult<Value> {
        let count = tools::count_arg(args, "count", MAX_TWEET_COUNT)?;
        let page = client.latest_timeline(count).await?;
        Ok(tweet_summaries(&page.items, count))
    }

    async fn op_get_tweet_replies(
        &self,
        client: &dyn PlatformClient,
        args: &Value,
    ) -> TwitterResult<Value> {
        let tweet_id = reference::resolve(tools::required_str(args, "tweet_id")?)?;
        let count = tools::count_arg(args, "count", MAX_TWEET_COUNT)? as usize;

        let detail = client.tweet_detail(&tweet_id).await?;
        let mut replies: Vec<Tweet> = detail.replies.into_iter().map(|t| t.reply).collect();
        let mut cursor = detail.next_cursor;
        let mut pages = 0;

        while replies.len() < count && pages < self.max_reply_pages {
            let Some(current) = cursor.take() else {
                break;
            };
            pages += 1;
            match client.more_replies(&tweet_id, &current).await {
                Ok(page) if page.items.is_empty() => break,
                Ok(page) => {
                    replies.extend(page.items.into_iter().map(|t| t.reply));
                    cursor = page.next_cursor.filter(|next| *next != current);
                }
                Err(e) => {
                    warn!(tweet_id = %tweet_id, error = %e, "Stopping reply pagination");
                    break;
                }
            }
        }
        replies.truncate(count);

        let tweet = &detail.tweet;
        Ok(json!({
            "original_tweet": {
                "id": tweet.id,
                "text": tweet.text,
                "author": tweet.author_screen_name(),
                "reply_count": tweet.reply_count
            },
            "replies": replies.iter().map(reply_entry).collect::<Vec<_>>(),
            "total_replies_retrieved": replies.len()
        }))
    }

    async fn op_get_trends(client: &dyn PlatformClient, args: &Value) -> TwitterResult<Value> {
        let category: TrendCategory = tools::optional_str(args, "category")
            .map_or(Ok(TrendCategory::default()), str::parse)?;
        let count = tools::count_arg(args, "count", MAX_TREND_COUNT)?;

        let mut trends = client.trends(category, count).await?;
        trends.truncate(count as usize);
        Ok(serde_json::to_value(trends)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result payloads
// ─────────────────────────────────────────────────────────────────────────────

fn user_info(user: &User) -> Value {
    json!({
        "id": user.id,
        "username": user.screen_name,
        "name": user.name,
        "description": user.description,
        "followers_count": user.followers_count,
        "following_count": user.following_count,
        "tweet_count": user.statuses_count,
        "verified": user.verified,
        "created_at": user.created_at
    })
}

fn tweet_summary(tweet: &Tweet) -> Value {
    json!({
        "id": tweet.id,
        "text": tweet.text,
        "author": tweet.author_screen_name(),
        "author_name": tweet.author_name(),
        "created_at": tweet.created_at,
        "like_count": tweet.favorite_count,
        "retweet_count": tweet.retweet_count,
        "reply_count": tweet.reply_count
    })
}

fn tweet_summaries(tweets: &[Tweet], count: u32) -> Value {
    Value::Array(
        tweets
            .iter()
            .take(count as usize)
            .map(tweet_summary)
            .collect(),
    )
}

fn tweet_full(tweet: &Tweet) -> Value {
    json!({
        "id": tweet.id,
        "text": tweet.text,
        "author": tweet.author_screen_name(),
        "author_name": tweet.author_name(),
        "author_id": tweet.user.as_ref().map(|u| u.id.as_str()),
        "created_at": tweet.created_at,
        "like_count": tweet.favorite_count,
        "retweet_count": tweet.retweet_count,
        "reply_count": tweet.reply_count,
        "quote_count": tweet.quote_count,
        "view_count": tweet.view_count,
        "lang": tweet.lang,
        "is_quote_status": tweet.is_quote_status,
        "possibly_sensitive": tweet.possibly_sensitive,
        "url": tweet.url()
    })
}

fn reply_entry(reply: &Tweet) -> Value {
    json!({
        "id": reply.id,
        "text": reply.text,
        "author_id": reply.user.as_ref().map(|u| u.id.as_str()),
        "author_username": reply.author_screen_name(),
        "author_name": reply.author_name(),
        "created_at": reply.created_at,
        "reply_count": reply.reply_count,
        "retweet_count": reply.retweet_count,
        "favorite_count": reply.favorite_count,
        "in_reply_to": reply.in_reply_to
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credentials, StaticCredentials};
    use crate::reference::TweetId;
    use crate::types::{Page, ReplyThread, Trend, TweetDetail};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn tweet(id: &str, text: &str) -> Tweet {
        Tweet {
            id: id.into(),
            text: text.into(),
            user: Some(User {
                id: "42".into(),
                screen_name: "author".into(),
                name: "Author".into(),
                ..Default::default()
            }),
            reply_count: 2,
            ..Default::default()
        }
    }

    fn thread(id: &str) -> ReplyThread {
        ReplyThread {
            reply: tweet(id, &format!("reply {id}")),
            continuation: Vec::new(),
        }
    }

    /// Serves a fixed conversation and records the calls it receives.
    #[derive(Default)]
    struct FakeClient {
        calls: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl PlatformClient for FakeClient {
        async fn verify_session(&self) -> TwitterResult<()> {
            Ok(())
        }

        async fn user_by_screen_name(&self, screen_name: &str) -> TwitterResult<User> {
            self.record(format!("user:{screen_name}"));
            Ok(User {
                id: "42".into(),
                screen_name: screen_name.into(),
                name: "Someone".into(),
                followers_count: 10,
                following_count: 3,
                statuses_count: 99,
                ..Default::default()
            })
        }

        async fn tweet_detail(&self, tweet_id: &TweetId) -> TwitterResult<TweetDetail> {
            self.record(format!("detail:{tweet_id}"));
            Ok(TweetDetail {
                tweet: tweet(tweet_id.as_str(), "focal"),
                replies: vec![thread("1"), thread("2")],
                next_cursor: Some("page-2".into()),
            })
        }

        async fn more_replies(
            &self,
            _tweet_id: &TweetId,
            cursor: &str,
        ) -> TwitterResult<Page<ReplyThread>> {
            self.record(format!("more:{cursor}"));
            Ok(match cursor {
                "page-2" => Page {
                    items: vec![thread("3"), thread("4")],
                    next_cursor: Some("page-3".into()),
                },
                _ => Page {
                    items: vec![thread("5")],
                    next_cursor: None,
                },
            })
        }

        async fn search(
            &self,
            query: &str,
            _count: u32,
            product: SearchProduct,
        ) -> TwitterResult<Page<Tweet>> {
            self.record(format!("search:{query}:{}", product.as_str()));
            Ok(Page {
                items: (0..30).map(|i| tweet(&i.to_string(), query)).collect(),
                next_cursor: None,
            })
        }

        async fn home_timeline(&self, _count: u32) -> TwitterResult<Page<Tweet>> {
            self.record("home".into());
            Ok(Page {
                items: vec![tweet("10", "home")],
                next_cursor: None,
            })
        }

        async fn latest_timeline(&self, _count: u32) -> TwitterResult<Page<Tweet>> {
            self.record("latest".into());
            Ok(Page::default())
        }

        async fn user_tweets(&self, user_id: &str, _count: u32) -> TwitterResult<Page<Tweet>> {
            self.record(format!("user_tweets:{user_id}"));
            Ok(Page {
                items: vec![tweet("11", "mine")],
                next_cursor: None,
            })
        }

        async fn trends(&self, category: TrendCategory, _count: u32) -> TwitterResult<Vec<Trend>> {
            self.record(format!("trends:{category}"));
            Ok(vec![Trend {
                name: "#Rust".into(),
                ..Default::default()
            }])
        }
    }

    struct SharedFactory(Arc<FakeClient>);

    impl ClientFactory for SharedFactory {
        fn build(&self, _: &Credentials) -> TwitterResult<Arc<dyn PlatformClient>> {
            Ok(Arc::clone(&self.0) as Arc<dyn PlatformClient>)
        }
    }

    struct NoCredentials;

    impl CredentialProvider for NoCredentials {
        fn load(&self) -> TwitterResult<Credentials> {
            Err(TwitterError::MissingCredentials {
                path: PathBuf::from(".env"),
            })
        }
    }

    fn server() -> (TwitterMcpServer, Arc<FakeClient>) {
        let fake = Arc::new(FakeClient::default());
        let server = TwitterMcpServer::with_parts(
            Arc::new(StaticCredentials::new(Credentials::new("ct0", "token"))),
            Box::new(SharedFactory(Arc::clone(&fake))),
            4,
        );
        (server, fake)
    }

    fn parse(output: &ToolOutput) -> Value {
        assert!(!output.is_error, "unexpected error: {}", output.text);
        serde_json::from_str(&output.text).unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_is_deprecated() {
        let (server, fake) = server();
        let output = server.call_tool("authenticate", &json!({})).await;
        assert_eq!(output.text, tools::AUTHENTICATE_GUIDANCE);
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_tools_refuse() {
        let (server, fake) = server();
        for name in tools::DISABLED_TOOLS {
            let output = server.call_tool(name, &json!({"text": "hi"})).await;
            assert_eq!(
                output.text,
                format!("Tool '{name}' is disabled on this server for safety.")
            );
        }
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (server, _) = server();
        let output = server.call_tool("delete_account", &json!({})).await;
        assert!(output.is_error);
        assert_eq!(output.text, "Error: Unknown tool: delete_account");
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let fake = Arc::new(FakeClient::default());
        let server = TwitterMcpServer::with_parts(
            Arc::new(NoCredentials),
            Box::new(SharedFactory(fake)),
            4,
        );
        let output = server.call_tool("get_timeline", &json!({})).await;
        assert!(output.is_error);
        assert_eq!(
            output.text,
            "Error: Missing Twitter credentials. Set TWITTER_CT0 and TWITTER_AUTH_TOKEN in .env."
        );
    }

    #[tokio::test]
    async fn test_get_user_info_strips_at() {
        let (server, fake) = server();
        let output = server
            .call_tool("get_user_info", &json!({"username": "@jack"}))
            .await;
        let value = parse(&output);
        assert_eq!(value["username"], "jack");
        assert_eq!(value["following_count"], 3);
        assert_eq!(value["tweet_count"], 99);
        assert_eq!(fake.calls.lock().unwrap()[0], "user:jack");
    }

    #[tokio::test]
    async fn test_get_user_info_rejects_bare_at() {
        let (server, fake) = server();
        let output = server
            .call_tool("get_user_info", &json!({"username": "@"}))
            .await;
        assert!(output.is_error);
        assert!(output.text.contains("username"));
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_tweet_by_id_accepts_id_and_url() {
        let (server, _) = server();
        let by_id = parse(
            &server
                .call_tool("get_tweet_by_id", &json!({"tweet_input": "2006814700802363810"}))
                .await,
        );
        let by_url = parse(
            &server
                .call_tool(
                    "get_tweet_by_id",
                    &json!({"tweet_input": "https://x.com/danifesto/status/2006814700802363810?s=46&t=abc"}),
                )
                .await,
        );
        assert_eq!(by_id["id"], "2006814700802363810");
        assert_eq!(by_id["id"], by_url["id"]);
        assert_eq!(by_id["author_id"], "42");
        assert_eq!(
            by_id["url"],
            "https://x.com/author/status/2006814700802363810"
        );
    }

    #[tokio::test]
    async fn test_get_tweet_by_id_invalid_reference() {
        let (server, fake) = server();
        let output = server
            .call_tool("get_tweet_by_id", &json!({"tweet_input": "not-a-valid-reference"}))
            .await;
        assert!(output.is_error);
        assert!(output.text.starts_with("Error: "));
        assert!(output.text.contains("not-a-valid-reference"));
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_falls_back_to_latest() {
        let (server, fake) = server();
        let output = server
            .call_tool(
                "search_tweets",
                &json!({"query": "rust", "count": 5, "product": "Media"}),
            )
            .await;
        let value = parse(&output);
        assert_eq!(value.as_array().unwrap().len(), 5);
        assert_eq!(value[0]["author"], "author");
        assert_eq!(fake.calls.lock().unwrap()[0], "search:rust:Latest");
    }

    #[tokio::test]
    async fn test_count_out_of_range() {
        let (server, _) = server();
        let output = server
            .call_tool("get_timeline", &json!({"count": 500}))
            .await;
        assert!(output.is_error);
        assert!(output.text.contains("count"));
    }

    #[tokio::test]
    async fn test_replies_follow_cursor_until_count() {
        let (server, fake) = server();
        let output = server
            .call_tool(
                "get_tweet_replies",
                &json!({"tweet_id": "https://twitter.com/a/status/77", "count": 4}),
            )
            .await;
        let value = parse(&output);
        assert_eq!(value["original_tweet"]["id"], "77");
        assert_eq!(value["total_replies_retrieved"], 4);
        let ids: Vec<_> = value["replies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
        assert_eq!(*fake.calls.lock().unwrap(), ["detail:77", "more:page-2"]);
    }

    #[tokio::test]
    async fn test_replies_stop_when_cursor_runs_out() {
        let (server, fake) = server();
        let value = parse(
            &server
                .call_tool("get_tweet_replies", &json!({"tweet_id": "77"}))
                .await,
        );
        assert_eq!(value["total_replies_retrieved"], 5);
        assert_eq!(
            *fake.calls.lock().unwrap(),
            ["detail:77", "more:page-2", "more:page-3"]
        );
    }

    #[tokio::test]
    async fn test_get_trends_category() {
        let (server, fake) = server();
        let value = parse(
            &server
                .call_tool("get_trends", &json!({"category": "sports", "count": 10}))
                .await,
        );
        assert_eq!(value[0]["name"], "#Rust");
        assert_eq!(fake.calls.lock().unwrap()[0], "trends:sports");

        let output = server
            .call_tool("get_trends", &json!({"category": "weather"}))
            .await;
        assert!(output.is_error);
    }

    #[tokio::test]
    async fn test_read_resources() {
        let (server, fake) = server();

        let result = server
            .handle_read_resource(&json!({"uri": "twitter://user-tweets#rustlang"}))
            .await
            .unwrap();
        let text = result["contents"][0]["text"].as_str().unwrap();
        let tweets: Value = serde_json::from_str(text).unwrap();
        assert_eq!(tweets[0]["id"], "11");

        server
            .handle_read_resource(&json!({"uri": "twitter://search"}))
            .await
            .unwrap();

        assert_eq!(
            *fake.calls.lock().unwrap(),
            ["user:rustlang", "user_tweets:42", "search:python:Latest"]
        );
    }

    #[tokio::test]
    async fn test_read_resource_errors() {
        let (server, _) = server();

        let err = server
            .handle_read_resource(&json!({"uri": "https://x.com/timeline"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported URI scheme: https"));

        let err = server
            .handle_read_resource(&json!({"uri": "twitter://bookmarks"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown resource path: bookmarks"));

        let err = server
            .handle_read_resource(&json!({"uri": "twitter://user-tweets#@"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[test]
    fn test_list_tools_and_resources() {
        let (server, _) = server();
        assert_eq!(
            server.handle_list_tools()["tools"].as_array().unwrap().len(),
            Tool::ALL.len()
        );
        assert_eq!(
            server.handle_list_resources()["resources"]
                .as_array()
                .unwrap()
                .len(),
            3
        );
    }
}
