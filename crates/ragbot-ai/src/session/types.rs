//! Session result types and concurrency guards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use ragbot_common::ConversationKey;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use crate::{AiError, Role};

use super::store::SessionStore;

/// Successful outcome of a submitted turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The backend answered; the answer is now in the history.
    Answer(String),
    /// The backend answered with nothing. The user turn stays in history.
    NoResponse,
}

impl Reply {
    pub const NO_RESPONSE_TEXT: &'static str = "⚠️ No response generated.";

    /// Text to show the user.
    pub fn text(&self) -> &str {
        match self {
            Reply::Answer(text) => text,
            Reply::NoResponse => Self::NO_RESPONSE_TEXT,
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, Reply::Answer(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// Input was empty after trimming. Nothing was sent or stored.
    #[error("empty input")]
    EmptyInput,
    /// No usable backend. Nothing was sent or stored.
    #[error("answering service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The backend call failed, timed out, or was cancelled.
    /// The pending user turn has been rolled back.
    #[error("generation failed: {0}")]
    Generation(#[source] AiError),
}

/// Owns the user turn appended at the start of a submit. Unless committed,
/// dropping it rolls the turn back, so a cancelled future cannot leave a
/// half-finished exchange behind.
pub(crate) struct PendingTurn<'a> {
    store: &'a SessionStore,
    key: &'a ConversationKey,
    armed: bool,
}

impl<'a> PendingTurn<'a> {
    pub(crate) fn begin(store: &'a SessionStore, key: &'a ConversationKey, text: &str) -> Self {
        store.append(key, Role::User, text);
        Self {
            store,
            key,
            armed: true,
        }
    }

    /// Keep the user turn.
    pub(crate) fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if self.armed && self.store.rollback_last(self.key) {
            debug!(conversation = %self.key, "Rolled back pending user turn");
        }
    }
}

/// Per-conversation async locks. Entries nobody holds or waits on are
/// pruned on the next acquisition.
#[derive(Default)]
pub(crate) struct KeyLocks {
    locks: Mutex<HashMap<ConversationKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    pub(crate) async fn lock(&self, key: &ConversationKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
