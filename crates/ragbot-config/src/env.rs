//! Environment variable overrides, applied on top of the TOML file.

use crate::schema::RagbotConfig;
use tracing::{debug, warn};

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut RagbotConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary lookup. Blank values are ignored.
pub fn apply_overrides_from(config: &mut RagbotConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .inspect(|_| debug!(key, "config override from environment"))
    };

    if let Some(v) = get("PROJECT_ID") {
        config.vertex.project_id = v;
    }
    if let Some(v) = get("LOCATION") {
        config.vertex.location = v;
    }
    if let Some(v) = get("MODEL_NAME") {
        config.vertex.model = v;
    }
    if let Some(v) = get("RAG_CORPUS_NAME") {
        config.vertex.rag_corpus = Some(v);
    }
    if let Some(v) = get("VERTEX_ACCESS_TOKEN") {
        config.vertex.access_token = Some(v);
    }
    if let Some(v) = get("SLACK_BOT_TOKEN") {
        config.slack.bot_token = v;
    }
    if let Some(v) = get("SLACK_SIGNING_SECRET") {
        config.slack.signing_secret = v;
    }
    if let Some(v) = get("SLACK_DEFAULT_CHANNEL") {
        config.slack.default_channel = Some(v);
    }
    if let Some(v) = get("PORT") {
        match v.parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!("ignoring PORT={v}: {e}"),
        }
    }
}
