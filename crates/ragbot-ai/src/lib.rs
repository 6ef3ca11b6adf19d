//! Conversation core for ragbot.
//!
//! Provides:
//! - `SessionStore`: per-conversation turn history
//! - `TurnOrchestrator`: one request/response cycle with commit or rollback
//! - `AnswerCapability`: the seam to a generative backend
//! - `GeminiClient`: Vertex AI Gemini with RAG retrieval and SSE streaming

pub mod commands;
pub mod gemini;
pub mod session;
pub mod streaming;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use ragbot_common::ConversationKey;

pub use commands::{format_history, ControlCommand};
pub use gemini::{GeminiClient, GeminiConfig};
pub use session::{Reply, SessionStore, TurnError, TurnOrchestrator};

/// A backend that can answer a conversation.
#[async_trait]
pub trait AnswerCapability: Send + Sync {
    /// Whether the backend is configured well enough to accept requests.
    fn is_ready(&self) -> bool {
        true
    }

    /// Generate the next assistant message for `turns`.
    ///
    /// `Ok` with empty text means the backend answered with nothing;
    /// failures must be reported as `Err`.
    async fn generate(
        &self,
        key: &ConversationKey,
        turns: &[Turn],
        options: &GenerationOptions,
    ) -> Result<Generation, AiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// Ordered, finite, non-restartable sequence of text fragments.
pub type FragmentStream = BoxStream<'static, Result<String, AiError>>;

/// Result of a generation call: buffered text or a fragment stream.
pub enum Generation {
    Text(String),
    Stream(FragmentStream),
}

impl Generation {
    /// Drain the result, handing each non-empty fragment to `on_fragment`
    /// in delivery order, and return the concatenation.
    pub async fn collect<F>(self, mut on_fragment: F) -> Result<String, AiError>
    where
        F: FnMut(&str) + Send,
    {
        match self {
            Generation::Text(text) => {
                if !text.is_empty() {
                    on_fragment(&text);
                }
                Ok(text)
            }
            Generation::Stream(mut stream) => {
                let mut full = String::new();
                while let Some(fragment) = stream.next().await {
                    let fragment = fragment?;
                    if fragment.is_empty() {
                        continue;
                    }
                    on_fragment(&fragment);
                    full.push_str(&fragment);
                }
                Ok(full)
            }
        }
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generation::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Generation::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Model selection, sampling parameters, and grounding corpus for a call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: u32,
    /// Corpus resource name used for retrieval grounding.
    pub rag_corpus: Option<String>,
    /// Disable the four harm-category safety filters.
    pub safety_off: bool,
    /// Request a streamed response.
    pub stream: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 1.0,
            top_p: 0.95,
            max_output_tokens: 8192,
            rag_corpus: None,
            safety_off: true,
            stream: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
    #[error("Cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","text":"hi"}"#);
        assert_eq!(Role::User.as_str(), "user");
    }

    #[tokio::test]
    async fn collect_text_reports_single_fragment() {
        let mut seen = Vec::new();
        let text = Generation::Text("hello".into())
            .collect(|f: &str| seen.push(f.to_string()))
            .await
            .unwrap();
        assert_eq!(text, "hello");
        assert_eq!(seen, vec!["hello"]);
    }

    #[tokio::test]
    async fn collect_stream_concatenates_in_order() {
        let fragments = stream::iter(vec![
            Ok("Hel".to_string()),
            Ok(String::new()),
            Ok("lo".to_string()),
        ])
        .boxed();
        let mut seen = Vec::new();
        let text = Generation::Stream(fragments)
            .collect(|f: &str| seen.push(f.to_string()))
            .await
            .unwrap();
        assert_eq!(text, "Hello");
        assert_eq!(seen, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn collect_stream_surfaces_mid_stream_error() {
        let fragments = stream::iter(vec![
            Ok("partial".to_string()),
            Err(AiError::NetworkError("reset".into())),
        ])
        .boxed();
        let result = Generation::Stream(fragments).collect(|_: &str| {}).await;
        assert!(matches!(result, Err(AiError::NetworkError(_))));
    }

    #[test]
    fn ai_error_display() {
        assert_eq!(AiError::Timeout.to_string(), "Timeout");
        assert_eq!(AiError::Cancelled.to_string(), "Cancelled");
        assert_eq!(
            AiError::ApiError("HTTP 500".into()).to_string(),
            "API error: HTTP 500"
        );
    }
}
