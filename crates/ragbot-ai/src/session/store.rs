//! Session store: maps conversation keys to ordered turn histories.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ragbot_common::ConversationKey;

use crate::{Role, Turn};

type Conversations = HashMap<ConversationKey, Vec<Turn>>;

/// Thread-safe conversation store. Clones share the same data.
///
/// Operations hold the lock only for the duration of the call and never
/// await, so they are safe to use from `Drop`.
#[derive(Clone, Default)]
pub struct SessionStore {
    conversations: Arc<RwLock<Conversations>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Conversations> {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Conversations> {
        self.conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of a conversation's turns; empty if the key is unknown.
    pub fn get(&self, key: &ConversationKey) -> Vec<Turn> {
        self.read().get(key).cloned().unwrap_or_default()
    }

    /// Append a turn, creating the conversation if absent.
    pub fn append(&self, key: &ConversationKey, role: Role, text: impl Into<String>) {
        self.write()
            .entry(key.clone())
            .or_default()
            .push(Turn::new(role, text));
    }

    /// Remove the last turn if, and only if, it is a user turn.
    /// Returns whether a turn was removed.
    pub fn rollback_last(&self, key: &ConversationKey) -> bool {
        let mut map = self.write();
        let Some(turns) = map.get_mut(key) else {
            return false;
        };
        if turns.last().map(|t| t.role) == Some(Role::User) {
            turns.pop();
            true
        } else {
            false
        }
    }

    /// Empty a conversation's history.
    pub fn clear(&self, key: &ConversationKey) {
        if let Some(turns) = self.write().get_mut(key) {
            turns.clear();
        }
    }

    /// Drop a conversation entirely. Returns whether it existed.
    pub fn remove(&self, key: &ConversationKey) -> bool {
        self.write().remove(key).is_some()
    }

    /// Number of turns in a conversation.
    pub fn len(&self, key: &ConversationKey) -> usize {
        self.read().get(key).map_or(0, Vec::len)
    }

    /// Number of known conversations.
    pub fn conversation_count(&self) -> usize {
        self.read().len()
    }

    pub fn keys(&self) -> Vec<ConversationKey> {
        self.read().keys().cloned().collect()
    }
}
