use serde::{Deserialize, Serialize};

/// Slack app credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Bot OAuth token (`xoxb-...`).
    pub bot_token: String,
    /// Signing secret used to verify inbound requests.
    pub signing_secret: String,
    /// Fallback channel for `/api/notify`.
    pub default_channel: Option<String>,
}

impl SlackConfig {
    /// Names of the required settings that are still empty.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.signing_secret.trim().is_empty() {
            missing.push("SLACK_SIGNING_SECRET");
        }
        if self.bot_token.trim().is_empty() {
            missing.push("SLACK_BOT_TOKEN");
        }
        missing
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("default_channel", &self.default_channel)
            .finish()
    }
}
