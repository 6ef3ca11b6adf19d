//! Error types for the Slack host.

use thiserror::Error;

pub type SlackResult<T> = Result<T, SlackError>;

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("invalid request signature: {0}")]
    Signature(String),

    /// Slack answered with `ok: false`.
    #[error("Slack API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
