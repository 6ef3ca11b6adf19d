//! AnswerCapability implementation for GeminiClient (buffered + streaming).

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

use ragbot_common::ConversationKey;

use crate::streaming::response_events;
use crate::{AiError, AnswerCapability, Generation, GenerationOptions, Turn};

use super::client::{extract_text, parse_stream_chunk, GeminiClient};

#[async_trait]
impl AnswerCapability for GeminiClient {
    fn is_ready(&self) -> bool {
        self.config.is_complete()
    }

    async fn generate(
        &self,
        key: &ConversationKey,
        turns: &[Turn],
        options: &GenerationOptions,
    ) -> Result<Generation, AiError> {
        let body = self.build_request_body(turns, options);
        let url = self.generate_url(&options.model, options.stream);

        debug!(
            conversation = %key,
            model = %options.model,
            turns = turns.len(),
            stream = options.stream,
            grounded = options.rag_corpus.is_some(),
            "Vertex AI request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?;
        let response = Self::check_status(response).await?;

        if !options.stream {
            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| AiError::ParseError(e.to_string()))?;
            return extract_text(&json).map(Generation::Text);
        }

        let fragments = response_events(response)
            .map(|event| event.and_then(|event| parse_stream_chunk(&event.data)))
            .boxed();
        Ok(Generation::Stream(fragments))
    }
}
