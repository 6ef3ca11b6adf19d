//! Vertex AI client struct, request building, and response parsing.

use std::time::Duration;

use crate::{AiError, GenerationOptions, Role, Turn};

use super::config::GeminiConfig;

/// Harm categories switched off when `GenerationOptions::safety_off` is set.
pub(crate) const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

/// Vertex AI Gemini client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        // Overall deadline is enforced by the orchestrator.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub(crate) fn generate_url(&self, model: &str, stream: bool) -> String {
        let method = if stream {
            "streamGenerateContent?alt=sse"
        } else {
            "generateContent"
        };
        format!(
            "{}/v1/{}/publishers/google/models/{}:{}",
            self.config.base_url(),
            self.config.parent(),
            model,
            method
        )
    }

    /// Build the JSON request body for `generateContent`.
    pub(crate) fn build_request_body(
        &self,
        turns: &[Turn],
        options: &GenerationOptions,
    ) -> serde_json::Value {
        let contents: Vec<_> = turns
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": turn.text }]
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "temperature": options.temperature,
                "topP": options.top_p,
                "maxOutputTokens": options.max_output_tokens,
            }
        });

        if options.safety_off {
            let settings: Vec<_> = SAFETY_CATEGORIES
                .iter()
                .map(|category| serde_json::json!({ "category": category, "threshold": "OFF" }))
                .collect();
            body["safetySettings"] = serde_json::Value::Array(settings);
        }

        if let Some(corpus) = options.rag_corpus.as_deref().filter(|c| !c.is_empty()) {
            body["tools"] = serde_json::json!([{
                "retrieval": {
                    "vertexRagStore": {
                        "ragResources": [{ "ragCorpus": corpus }]
                    }
                }
            }]);
        }

        body
    }

    /// Map a non-success HTTP status to an error.
    pub(crate) async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AiError> {
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }
        Ok(response)
    }
}

/// Concatenate the text parts of the first candidate.
///
/// A response without candidates or content is an empty answer, not an error.
pub(crate) fn extract_text(json: &serde_json::Value) -> Result<String, AiError> {
    if let Some(message) = json["error"]["message"].as_str() {
        return Err(AiError::ApiError(message.to_string()));
    }

    let mut text = String::new();
    let parts = json["candidates"][0]["content"]["parts"].as_array();
    for part in parts.into_iter().flatten() {
        if let Some(t) = part["text"].as_str() {
            text.push_str(t);
        }
    }
    Ok(text)
}

/// Parse the text fragment carried by one streamed SSE chunk.
pub(crate) fn parse_stream_chunk(data: &str) -> Result<String, AiError> {
    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| AiError::ParseError(e.to_string()))?;
    extract_text(&json)
}
