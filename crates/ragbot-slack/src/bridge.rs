//! Mention handling: turn a Slack mention into an orchestrator submit and
//! post the outcome back to the thread.

use std::sync::Arc;

use ragbot_ai::{format_history, ControlCommand, TurnError, TurnOrchestrator};
use ragbot_common::ConversationKey;
use tracing::{error, info, warn};

use crate::client::MessageSink;
use crate::events::{extract_prompt, AppMentionEvent};

pub const GREETING: &str = "👋 Hi! How can I help you?";
pub const NOT_CONFIGURED: &str = "⚠️ RAG engine not configured. Please check your Vertex AI setup.";
pub const GENERATION_FAILED: &str = "⚠️ Sorry, I encountered an error. Please try again.";
pub const CLEARED: &str = "🧹 Conversation history cleared.";

pub struct SlackBridge {
    orchestrator: Arc<TurnOrchestrator>,
    sink: Arc<dyn MessageSink>,
}

impl SlackBridge {
    pub fn new(orchestrator: Arc<TurnOrchestrator>, sink: Arc<dyn MessageSink>) -> Self {
        Self { orchestrator, sink }
    }

    pub fn orchestrator(&self) -> &Arc<TurnOrchestrator> {
        &self.orchestrator
    }

    pub fn sink(&self) -> &Arc<dyn MessageSink> {
        &self.sink
    }

    /// Answer a mention in its thread. Failures are logged; Slack has
    /// already been acknowledged by the time this runs.
    pub async fn handle_mention(&self, event: AppMentionEvent) {
        if event.is_from_bot() {
            return;
        }

        let key = event.conversation_key();
        info!(
            conversation = %key,
            channel = %event.channel,
            user = event.user.as_deref().unwrap_or("-"),
            "Handling Slack mention"
        );

        let reply = self.respond(&key, &event.text).await;
        if let Err(e) = self
            .sink
            .post_message(&event.channel, &reply, Some(event.thread_root()))
            .await
        {
            error!(conversation = %key, error = %e, "Failed to post Slack reply");
        }
    }

    /// The text to post for `raw_text` in conversation `key`.
    pub async fn respond(&self, key: &ConversationKey, raw_text: &str) -> String {
        let prompt = extract_prompt(raw_text);
        if prompt.is_empty() {
            return GREETING.to_string();
        }

        match ControlCommand::parse(&prompt) {
            Some(ControlCommand::Clear) => {
                self.orchestrator.clear(key).await;
                return CLEARED.to_string();
            }
            Some(ControlCommand::History) => {
                return format_history(&self.orchestrator.history(key));
            }
            // Exit has no meaning in a thread; treat it as a question.
            Some(ControlCommand::Exit) | None => {}
        }

        match self.orchestrator.submit(key, &prompt).await {
            Ok(reply) => reply.text().to_string(),
            Err(TurnError::EmptyInput) => GREETING.to_string(),
            Err(TurnError::ServiceUnavailable(reason)) => {
                warn!(conversation = %key, %reason, "Answering service unavailable");
                NOT_CONFIGURED.to_string()
            }
            Err(TurnError::Generation(e)) => {
                error!(conversation = %key, error = %e, "Generation failed");
                GENERATION_FAILED.to_string()
            }
        }
    }
}
