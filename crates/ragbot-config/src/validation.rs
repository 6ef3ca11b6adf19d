//! Full configuration validation.
//!
//! Each check pushes a message; the messages are joined into a single
//! `ConfigError::ValidationError`.

mod helpers;


use crate::schema::RagbotConfig;
use ragbot_common::ConfigError;

use helpers::{validate_non_empty, validate_range, validate_range_f64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &RagbotConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_non_empty(&mut errors, "vertex.location", &config.vertex.location);
    validate_non_empty(&mut errors, "vertex.model", &config.vertex.model);
    if let Some(corpus) = &config.vertex.rag_corpus {
        if !corpus.contains("/ragCorpora/") {
            errors.push(format!(
                "vertex.rag_corpus = {corpus:?} is not a projects/.../locations/.../ragCorpora/... resource name"
            ));
        }
    }

    validate_range_f64(
        &mut errors,
        "generation.temperature",
        config.generation.temperature,
        0.0,
        2.0,
    );
    validate_range_f64(&mut errors, "generation.top_p", config.generation.top_p, 0.0, 1.0);
    validate_range(
        &mut errors,
        "generation.max_output_tokens",
        u64::from(config.generation.max_output_tokens),
        1,
        65_536,
    );

    validate_range(
        &mut errors,
        "session.timeout_secs",
        config.session.timeout_secs,
        1,
        3600,
    );

    validate_non_empty(&mut errors, "server.host", &config.server.host);
    if config.server.port == 0 {
        errors.push("server.port must not be 0".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
