//! Turn orchestration: append, generate, then commit or roll back.

use std::sync::Arc;
use std::time::Duration;

use ragbot_common::ConversationKey;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{AiError, AnswerCapability, GenerationOptions, Role, Turn};

use super::store::SessionStore;
use super::types::{KeyLocks, PendingTurn, Reply, TurnError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Drives request/response cycles while keeping each conversation's
/// history consistent. Submits on the same key run one at a time; submits
/// on different keys run in parallel.
pub struct TurnOrchestrator {
    store: SessionStore,
    capability: Option<Arc<dyn AnswerCapability>>,
    options: GenerationOptions,
    timeout: Duration,
    locks: KeyLocks,
}

impl TurnOrchestrator {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            capability: None,
            options: GenerationOptions::default(),
            timeout: DEFAULT_TIMEOUT,
            locks: KeyLocks::default(),
        }
    }

    pub fn with_capability(mut self, capability: Arc<dyn AnswerCapability>) -> Self {
        self.capability = Some(capability);
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Submit a user utterance and wait for the full answer.
    pub async fn submit(
        &self,
        key: &ConversationKey,
        user_text: &str,
    ) -> Result<Reply, TurnError> {
        self.submit_with_cancel(key, user_text, &CancellationToken::new(), |_: &str| {})
            .await
    }

    /// Like [`submit`](Self::submit), handing each fragment to
    /// `on_fragment` as it arrives.
    pub async fn submit_streaming<F>(
        &self,
        key: &ConversationKey,
        user_text: &str,
        on_fragment: F,
    ) -> Result<Reply, TurnError>
    where
        F: FnMut(&str) + Send,
    {
        self.submit_with_cancel(key, user_text, &CancellationToken::new(), on_fragment)
            .await
    }

    /// Submit with an external cancellation signal. Cancellation and
    /// timeout are reported as `TurnError::Generation` and roll back.
    pub async fn submit_with_cancel<F>(
        &self,
        key: &ConversationKey,
        user_text: &str,
        cancel: &CancellationToken,
        mut on_fragment: F,
    ) -> Result<Reply, TurnError>
    where
        F: FnMut(&str) + Send,
    {
        let text = user_text.trim();
        if text.is_empty() {
            return Err(TurnError::EmptyInput);
        }
        let capability = self.ready_capability()?;

        let _lock = self.locks.lock(key).await;
        let pending = PendingTurn::begin(&self.store, key, text);
        let turns = self.store.get(key);

        debug!(conversation = %key, turns = turns.len(), "Dispatching generation");

        let call = async {
            capability
                .generate(key, &turns, &self.options)
                .await?
                .collect(&mut on_fragment)
                .await
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AiError::Cancelled),
            result = tokio::time::timeout(self.timeout, call) => {
                result.unwrap_or(Err(AiError::Timeout))
            }
        };

        match outcome {
            Ok(answer) if answer.is_empty() => {
                pending.commit();
                info!(conversation = %key, "Backend returned no text");
                Ok(Reply::NoResponse)
            }
            Ok(answer) => {
                pending.commit();
                self.store.append(key, Role::Assistant, answer.as_str());
                debug!(conversation = %key, chars = answer.len(), "Turn committed");
                Ok(Reply::Answer(answer))
            }
            Err(e) => {
                drop(pending);
                warn!(conversation = %key, error = %e, "Generation failed, turn rolled back");
                Err(TurnError::Generation(e))
            }
        }
    }

    /// Current history of a conversation, for display.
    pub fn history(&self, key: &ConversationKey) -> Vec<Turn> {
        self.store.get(key)
    }

    /// Clear a conversation once any in-flight submit on it has finished.
    pub async fn clear(&self, key: &ConversationKey) {
        let _lock = self.locks.lock(key).await;
        self.store.clear(key);
        info!(conversation = %key, "Conversation cleared");
    }

    fn ready_capability(&self) -> Result<&Arc<dyn AnswerCapability>, TurnError> {
        match &self.capability {
            None => Err(TurnError::ServiceUnavailable(
                "no answering backend configured".into(),
            )),
            Some(capability) if !capability.is_ready() => Err(TurnError::ServiceUnavailable(
                "answering backend is not ready".into(),
            )),
            Some(capability) => Ok(capability),
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}
