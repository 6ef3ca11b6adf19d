//! Wiring from config to the answering backend.

use std::sync::Arc;
use std::time::Duration;

use ragbot_ai::{GeminiClient, GeminiConfig, GenerationOptions, SessionStore, TurnOrchestrator};
use ragbot_common::{ConfigError, RagbotError};
use ragbot_config::RagbotConfig;
use tracing::{info, warn};

pub fn gemini_config(config: &RagbotConfig) -> GeminiConfig {
    GeminiConfig::new(&config.vertex.project_id, &config.vertex.location)
        .with_access_token(config.vertex.access_token.clone().unwrap_or_default())
}

pub fn gemini_client(config: &RagbotConfig) -> Result<GeminiClient, RagbotError> {
    GeminiClient::new(gemini_config(config)).map_err(|e| RagbotError::Ai(e.to_string()))
}

pub fn generation_options(config: &RagbotConfig) -> GenerationOptions {
    let generation = &config.generation;
    GenerationOptions {
        model: config.vertex.model.clone(),
        temperature: generation.temperature,
        top_p: generation.top_p,
        max_output_tokens: generation.max_output_tokens,
        rag_corpus: config.vertex.rag_corpus.clone(),
        safety_off: generation.safety_off,
        stream: true,
    }
}

/// Settings the Vertex-backed commands cannot run without.
pub fn require_vertex(config: &RagbotConfig) -> Result<(), ConfigError> {
    let vertex = &config.vertex;
    if vertex.project_id.trim().is_empty() {
        return Err(ConfigError::MissingSetting("PROJECT_ID".into()));
    }
    if vertex.access_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(ConfigError::MissingSetting("VERTEX_ACCESS_TOKEN".into()));
    }
    Ok(())
}

/// Orchestrator over a fresh store. The Gemini backend is attached only
/// when a corpus is configured; otherwise submits report the service as
/// unavailable.
pub fn build_orchestrator(config: &RagbotConfig) -> Result<TurnOrchestrator, RagbotError> {
    let orchestrator = TurnOrchestrator::new(SessionStore::new())
        .with_options(generation_options(config))
        .with_timeout(Duration::from_secs(config.session.timeout_secs));

    if config.vertex.rag_corpus.is_none() {
        warn!("RAG_CORPUS_NAME is not set; answering is disabled");
        return Ok(orchestrator);
    }

    let client = gemini_client(config)?;
    if client.config().is_complete() {
        info!(
            project = %config.vertex.project_id,
            location = %config.vertex.location,
            model = %config.vertex.model,
            "Vertex AI backend ready"
        );
    } else {
        warn!("Vertex AI credentials incomplete; answering is disabled until configured");
    }
    Ok(orchestrator.with_capability(Arc::new(client)))
}
