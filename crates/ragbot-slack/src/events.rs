//! Events API payloads.
//!
//! Slack posts an envelope to the events endpoint. `url_verification` is the
//! one-time handshake; `event_callback` wraps the actual event, of which only
//! `app_mention` is acted on.

use std::sync::LazyLock;

use ragbot_common::ConversationKey;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A run of mentions with the spaces around it.
static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[ \t]*(?:<@[^>]+>[ \t]*)+").expect("mention pattern is valid")
});

/// Outer envelope of an Events API request.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        #[serde(default)]
        team_id: Option<String>,
        #[serde(default)]
        event_id: Option<String>,
        event: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

/// Inner event types we handle.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEvent {
    AppMention(AppMentionEvent),
    #[serde(other)]
    Unknown,
}

impl SlackEvent {
    /// Decode an inner event. Payloads that don't fit a known shape map to
    /// `Unknown` rather than failing the whole request.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or(SlackEvent::Unknown)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMentionEvent {
    #[serde(default)]
    pub user: Option<String>,
    /// Message text including the `<@BOT>` mention.
    #[serde(default)]
    pub text: String,
    pub channel: String,
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl AppMentionEvent {
    /// Thread root timestamp. A top-level mention starts its own thread.
    pub fn thread_root(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }

    /// One conversation per Slack thread.
    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey::new(self.thread_root())
    }

    /// The user's request with every mention removed.
    pub fn prompt(&self) -> String {
        extract_prompt(&self.text)
    }

    pub fn is_from_bot(&self) -> bool {
        self.bot_id.is_some()
    }
}

/// Strip `<@U…>` / `<@U…|name>` mentions and surrounding whitespace.
pub fn extract_prompt(text: &str) -> String {
    MENTION.replace_all(text, " ").trim().to_string()
}
