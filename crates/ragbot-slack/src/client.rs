//! Outbound messages via the Slack Web API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SlackError, SlackResult};

const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Somewhere replies can be posted.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Post `text` to `channel`, inside `thread_ts` when given. Returns the
    /// timestamp of the new message.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> SlackResult<String>;
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// `chat.postMessage` over HTTPS with a bot token.
pub struct SlackWebClient {
    bot_token: String,
    api_base: String,
    http: reqwest::Client,
}

impl SlackWebClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Point at a different API root (trailing slash ignored).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl std::fmt::Debug for SlackWebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebClient")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl MessageSink for SlackWebClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> SlackResult<String> {
        let body = PostMessageRequest {
            channel,
            text,
            thread_ts,
        };

        let resp: PostMessageResponse = self
            .http
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        into_ts(resp).inspect(|ts| debug!(channel, ts = %ts, "Posted Slack message"))
    }
}

fn into_ts(resp: PostMessageResponse) -> SlackResult<String> {
    if resp.ok {
        Ok(resp.ts.unwrap_or_default())
    } else {
        Err(SlackError::Api(
            resp.error.unwrap_or_else(|| "unknown_error".to_string()),
        ))
    }
}
