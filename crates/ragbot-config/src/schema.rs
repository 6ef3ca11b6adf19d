//! Configuration schema types for ragbot.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod generation;
mod server;
mod session;
mod slack;
mod vertex;

pub use generation::*;
pub use server::*;
pub use session::*;
pub use slack::*;
pub use vertex::*;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagbotConfig {
    pub vertex: VertexConfig,
    pub generation: GenerationConfig,
    pub session: SessionConfig,
    pub slack: SlackConfig,
    pub server: ServerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: RagbotConfig = toml::from_str("").unwrap();
        assert_eq!(config.vertex.location, "asia-east1");
        assert_eq!(config.vertex.model, "gemini-2.5-flash");
        assert!(config.vertex.rag_corpus.is_none());
        assert_eq!(config.generation.max_output_tokens, 8192);
        assert_eq!(config.session.timeout_secs, 120);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: RagbotConfig = toml::from_str(
            r#"
[generation]
temperature = 0.2
"#,
        )
        .unwrap();
        assert_eq!(config.generation.temperature, 0.2);
        assert_eq!(config.generation.top_p, 0.95);
        assert!(config.generation.safety_off);
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let mut config = RagbotConfig::default();
        config.vertex.access_token = Some("ya29.secret".into());
        config.slack.bot_token = "xoxb-secret".into();
        config.slack.signing_secret = "shh".into();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("ya29.secret"));
        assert!(!dbg.contains("xoxb-secret"));
        assert!(!dbg.contains("shh"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
