//! Twitter web GraphQL client.
//!
//! Requests are authorised by the session cookies of a logged-in browser,
//! the same way the x.com web app talks to its own backend. Responses are
//! handed to [`crate::timeline`] and [`crate::types`] for parsing; nothing in
//! this module reads paginated structures directly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::{
    config::{GraphqlOperations, RateLimitInfo, TwitterConfig},
    credentials::Credentials,
    error::{TwitterError, TwitterResult},
    reference::TweetId,
    types::{
        self, Page, ReplyThread, SearchProduct, Trend, TrendCategory, Tweet, TweetDetail, User,
    },
};

/// Read operations the tool handlers need from the platform.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Confirm the session cookies are accepted.
    async fn verify_session(&self) -> TwitterResult<()>;

    /// Look up a user by handle (without `@`).
    async fn user_by_screen_name(&self, screen_name: &str) -> TwitterResult<User>;

    /// Fetch a tweet with the first page of its replies.
    async fn tweet_detail(&self, tweet_id: &TweetId) -> TwitterResult<TweetDetail>;

    /// Fetch a further page of replies.
    async fn more_replies(&self, tweet_id: &TweetId, cursor: &str)
    -> TwitterResult<Page<ReplyThread>>;

    /// Search tweets.
    async fn search(
        &self,
        query: &str,
        count: u32,
        product: SearchProduct,
    ) -> TwitterResult<Page<Tweet>>;

    /// The "For you" home timeline.
    async fn home_timeline(&self, count: u32) -> TwitterResult<Page<Tweet>>;

    /// The "Following" home timeline, newest first.
    async fn latest_timeline(&self, count: u32) -> TwitterResult<Page<Tweet>>;

    /// Tweets posted by a user, by user ID.
    async fn user_tweets(&self, user_id: &str, count: u32) -> TwitterResult<Page<Tweet>>;

    /// Trending topics in a category.
    async fn trends(&self, category: TrendCategory, count: u32) -> TwitterResult<Vec<Trend>>;
}

/// Feature switches sent with tweet-returning GraphQL operations.
fn tweet_features() -> Value {
    json!({
        "rweb_tipjar_consumption_enabled": true,
        "responsive_web_graphql_exclude_directive_enabled": true,
        "verified_phone_label_enabled": false,
        "creator_subscriptions_tweet_preview_api_enabled": true,
        "responsive_web_graphql_timeline_navigation_enabled": true,
        "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
        "communities_web_enable_tweet_community_results_fetch": true,
        "c9s_tweet_anatomy_moderator_badge_enabled": true,
        "articles_preview_enabled": true,
        "tweetypie_unmention_optimization_enabled": true,
        "responsive_web_edit_tweet_api_enabled": true,
        "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
        "view_counts_everywhere_api_enabled": true,
        "longform_notetweets_consumption_enabled": true,
        "responsive_web_twitter_article_tweet_consumption_enabled": true,
        "tweet_awards_web_tipping_enabled": false,
        "creator_subscriptions_quote_tweet_preview_enabled": false,
        "freedom_of_speech_not_reach_fetch_enabled": true,
        "standardized_nudges_misinfo": true,
        "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": true,
        "rweb_video_timestamps_enabled": true,
        "longform_notetweets_rich_text_read_enabled": true,
        "longform_notetweets_inline_media_enabled": true,
        "responsive_web_enhance_cards_enabled": false
    })
}

/// Feature switches sent with user lookups.
fn user_features() -> Value {
    json!({
        "hidden_profile_likes_enabled": true,
        "hidden_profile_subscriptions_enabled": true,
        "responsive_web_graphql_exclude_directive_enabled": true,
        "verified_phone_label_enabled": false,
        "subscriptions_verification_info_is_identity_verified_enabled": true,
        "subscriptions_verification_info_verified_since_enabled": true,
        "highlights_tweets_tab_ui_enabled": true,
        "responsive_web_twitter_article_notes_tab_enabled": true,
        "creator_subscriptions_tweet_preview_api_enabled": true,
        "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
        "responsive_web_graphql_timeline_navigation_enabled": true
    })
}

/// Cookie-authenticated client for the x.com web API.
#[derive(Debug)]
pub struct GraphqlApiClient {
    client: Client,
    base_url: String,
    operations: GraphqlOperations,
    max_retries: u32,
    initial_delay_ms: u64,
    max_delay_ms: u64,
}

impl GraphqlApiClient {
    /// Create a client bound to one pair of session cookies.
    pub fn new(config: &TwitterConfig, credentials: &Credentials) -> TwitterResult<Self> {
        let headers = session_headers(config, credentials)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("twitter-mcp/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            operations: config.operations.clone(),
            max_retries: config.retry.max_attempts,
            initial_delay_ms: config.retry.initial_delay_ms,
            max_delay_ms: config.retry.max_delay_ms,
        })
    }

    fn graphql_url(&self, operation_id: &str, name: &str) -> String {
        format!("{}/graphql/{operation_id}/{name}", self.base_url)
    }

    /// Run a GraphQL query with variables and features in the query string.
    #[instrument(skip(self, variables, features))]
    async fn graphql_get(
        &self,
        operation_id: &str,
        name: &str,
        variables: &Value,
        features: &Value,
    ) -> TwitterResult<Value> {
        let url = self.graphql_url(operation_id, name);
        let params = [
            ("variables", variables.to_string()),
            ("features", features.to_string()),
        ];
        self.send(name, || self.client.get(&url).query(&params))
            .await
    }

    /// Run a GraphQL query with a JSON body.
    #[instrument(skip(self, variables, features))]
    async fn graphql_post(
        &self,
        operation_id: &str,
        name: &str,
        variables: &Value,
        features: &Value,
    ) -> TwitterResult<Value> {
        let url = self.graphql_url(operation_id, name);
        let body = json!({
            "variables": variables,
            "features": features,
            "queryId": operation_id,
        });
        self.send(name, || self.client.post(&url).json(&body)).await
    }

    /// GET a REST endpoint relative to the API base.
    #[instrument(skip(self, params))]
    async fn rest_get(&self, endpoint: &str, params: &[(&str, String)]) -> TwitterResult<Value> {
        let url = format!("{}{endpoint}", self.base_url);
        self.send(endpoint, || self.client.get(&url).query(params))
            .await
    }

    async fn send<F>(&self, endpoint: &str, build: F) -> TwitterResult<Value>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut delay = Duration::from_millis(self.initial_delay_ms);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, endpoint, "Making Twitter API request");

            match build().send().await {
                Ok(response) => match self.handle_response(response).await {
                    Ok(data) => return Ok(data),
                    Err(e) if e.is_retryable() && attempts < self.max_retries => {
                        if let Some(retry_after) = e.retry_after() {
                            delay = retry_after;
                        }
                        warn!(
                            attempt = attempts,
                            delay_ms = delay.as_millis(),
                            error = %e,
                            "Retrying Twitter API request"
                        );
                        tokio::time::sleep(delay).await;
                        delay = std::cmp::min(delay * 2, Duration::from_millis(self.max_delay_ms));
                    }
                    Err(e) => return Err(e),
                },
                Err(e) if (e.is_timeout() || e.is_connect()) && attempts < self.max_retries => {
                    warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Retrying after connection error"
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, Duration::from_millis(self.max_delay_ms));
                }
                Err(e) => return Err(TwitterError::Http(e)),
            }
        }
    }

    async fn handle_response(&self, response: Response) -> TwitterResult<Value> {
        let status = response.status();

        let rate_limit = RateLimitInfo::from_headers(response.headers());
        if rate_limit.is_exhausted() {
            debug!(reset = ?rate_limit.reset, "Rate limit exhausted");
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = rate_limit
                .time_until_reset()
                .map_or(60, |d| d.as_secs());
            return Err(TwitterError::RateLimited { retry_after });
        }

        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|body| first_error_message(&body))
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());

            if status == StatusCode::NOT_FOUND {
                return Err(TwitterError::NotFound(message));
            }
            return Err(TwitterError::Api {
                status: status.as_u16(),
                message,
                retry_after: rate_limit.time_until_reset().map(|d| d.as_secs()),
            });
        }

        let body: Value = serde_json::from_slice(&bytes)?;

        // GraphQL reports partial failures next to data; only fail when nothing came back.
        let has_data = body.get("data").is_some_and(|d| !d.is_null());
        if !has_data && let Some(message) = first_error_message(&body) {
            return Err(TwitterError::Api {
                status: status.as_u16(),
                message,
                retry_after: None,
            });
        }

        Ok(body)
    }

    fn conversation_variables(tweet_id: &TweetId, cursor: Option<&str>) -> Value {
        let mut variables = json!({
            "focalTweetId": tweet_id.as_str(),
            "referrer": "tweet",
            "with_rux_injections": false,
            "includePromotedContent": true,
            "withCommunity": true,
            "withQuickPromoteEligibilityTweetFields": true,
            "withBirdwatchNotes": true,
            "withVoice": true,
            "withV2Timeline": true
        });
        if let Some(cursor) = cursor {
            variables["cursor"] = json!(cursor);
        }
        variables
    }

    async fn conversation(&self, tweet_id: &TweetId, cursor: Option<&str>) -> TwitterResult<Value> {
        let body = self
            .graphql_get(
                &self.operations.tweet_detail,
                "TweetDetail",
                &Self::conversation_variables(tweet_id, cursor),
                &tweet_features(),
            )
            .await?;
        Ok(pointer_or_null(
            &body,
            "/data/threaded_conversation_with_injections_v2/instructions",
        ))
    }

    async fn home(&self, operation_id: &str, name: &str, count: u32) -> TwitterResult<Page<Tweet>> {
        let variables = json!({
            "count": count,
            "includePromotedContent": true,
            "latestControlAvailable": true,
            "requestContext": "launch",
            "withCommunity": true
        });
        let body = self
            .graphql_post(operation_id, name, &variables, &tweet_features())
            .await?;
        let instructions = pointer_or_null(&body, "/data/home/home_timeline_urt/instructions");
        Ok(types::tweets_from_instructions(&instructions))
    }
}

#[async_trait]
impl PlatformClient for GraphqlApiClient {
    #[instrument(skip(self))]
    async fn verify_session(&self) -> TwitterResult<()> {
        let body = self.rest_get("/1.1/account/settings.json", &[]).await?;
        match body.get("screen_name").and_then(Value::as_str) {
            Some(screen_name) => {
                debug!(screen_name, "Session verified");
                Ok(())
            }
            None => Err(TwitterError::UnexpectedResponse(
                "account settings did not include a screen name".into(),
            )),
        }
    }

    #[instrument(skip(self))]
    async fn user_by_screen_name(&self, screen_name: &str) -> TwitterResult<User> {
        let variables = json!({
            "screen_name": screen_name,
            "withSafetyModeUserFields": false
        });
        let body = self
            .graphql_get(
                &self.operations.user_by_screen_name,
                "UserByScreenName",
                &variables,
                &user_features(),
            )
            .await?;

        body.pointer("/data/user/result")
            .and_then(User::from_result)
            .ok_or_else(|| TwitterError::NotFound(format!("User @{screen_name}")))
    }

    #[instrument(skip(self))]
    async fn tweet_detail(&self, tweet_id: &TweetId) -> TwitterResult<TweetDetail> {
        let instructions = self.conversation(tweet_id, None).await?;
        types::detail_from_instructions(&instructions, tweet_id.as_str())
            .ok_or_else(|| TwitterError::NotFound(format!("Tweet {tweet_id}")))
    }

    #[instrument(skip(self))]
    async fn more_replies(
        &self,
        tweet_id: &TweetId,
        cursor: &str,
    ) -> TwitterResult<Page<ReplyThread>> {
        let instructions = self.conversation(tweet_id, Some(cursor)).await?;
        Ok(types::reply_threads_from_instructions(&instructions))
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        query: &str,
        count: u32,
        product: SearchProduct,
    ) -> TwitterResult<Page<Tweet>> {
        let variables = json!({
            "rawQuery": query,
            "count": count,
            "querySource": "typed_query",
            "product": product.as_str()
        });
        let body = self
            .graphql_get(
                &self.operations.search_timeline,
                "SearchTimeline",
                &variables,
                &tweet_features(),
            )
            .await?;
        let instructions = pointer_or_null(
            &body,
            "/data/search_by_raw_query/search_timeline/timeline/instructions",
        );
        Ok(types::tweets_from_instructions(&instructions))
    }

    #[instrument(skip(self))]
    async fn home_timeline(&self, count: u32) -> TwitterResult<Page<Tweet>> {
        self.home(&self.operations.home_timeline, "HomeTimeline", count)
            .await
    }

    #[instrument(skip(self))]
    async fn latest_timeline(&self, count: u32) -> TwitterResult<Page<Tweet>> {
        self.home(
            &self.operations.home_latest_timeline,
            "HomeLatestTimeline",
            count,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn user_tweets(&self, user_id: &str, count: u32) -> TwitterResult<Page<Tweet>> {
        let variables = json!({
            "userId": user_id,
            "count": count,
            "includePromotedContent": true,
            "withQuickPromoteEligibilityTweetFields": true,
            "withVoice": true,
            "withV2Timeline": true
        });
        let body = self
            .graphql_get(
                &self.operations.user_tweets,
                "UserTweets",
                &variables,
                &tweet_features(),
            )
            .await?;

        let instructions = body
            .pointer("/data/user/result/timeline_v2/timeline/instructions")
            .or_else(|| body.pointer("/data/user/result/timeline/timeline/instructions"))
            .cloned()
            .unwrap_or(Value::Null);
        Ok(types::tweets_from_instructions(&instructions))
    }

    #[instrument(skip(self))]
    async fn trends(&self, category: TrendCategory, count: u32) -> TwitterResult<Vec<Trend>> {
        let params = [
            ("count", count.to_string()),
            ("include_page_configuration", "false".to_string()),
            ("initial_tab_id", category.as_str().to_string()),
        ];
        let body = self.rest_get("/2/guide.json", &params).await?;
        let mut trends = types::trends_from_guide(&body, category);
        trends.truncate(count as usize);
        Ok(trends)
    }
}

fn session_headers(config: &TwitterConfig, credentials: &Credentials) -> TwitterResult<HeaderMap> {
    let value = |raw: &str, name: &str| {
        HeaderValue::from_str(raw)
            .map_err(|e| TwitterError::Config(format!("Invalid {name} header value: {e}")))
    };

    let mut cookie = value(&credentials.cookie_header(), "cookie")?;
    cookie.set_sensitive(true);
    let mut csrf = value(credentials.ct0(), "x-csrf-token")?;
    csrf.set_sensitive(true);
    let mut authorization = value(&format!("Bearer {}", config.bearer_token), "authorization")?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, cookie);
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(HeaderName::from_static("x-csrf-token"), csrf);
    headers.insert(
        HeaderName::from_static("x-twitter-auth-type"),
        HeaderValue::from_static("OAuth2Session"),
    );
    headers.insert(
        HeaderName::from_static("x-twitter-active-user"),
        HeaderValue::from_static("yes"),
    );
    headers.insert(
        HeaderName::from_static("x-twitter-client-language"),
        value(&config.language, "x-twitter-client-language")?,
    );
    Ok(headers)
}

fn first_error_message(body: &Value) -> Option<String> {
    body.get("errors")?
        .as_array()?
        .iter()
        .find_map(|e| e.get("message").and_then(Value::as_str))
        .map(String::from)
}

fn pointer_or_null(body: &Value, pointer: &str) -> Value {
    body.pointer(pointer).cloned().unwrap_or(Value::Null)
}
