//! Append-only conversation log
//!
//! Turns are immutable once recorded. The only writer is the request
//! dispatcher; everything else reads snapshots or listens for appends.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

const APPEND_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One recorded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            method: None,
        }
    }

    pub fn assistant(content: impl Into<String>, method: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            method,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }
}

/// Shared handle to the ordered turn log. Clones share the same log.
#[derive(Clone)]
pub struct ConversationStore {
    turns: Arc<RwLock<Vec<Turn>>>,
    appended_tx: broadcast::Sender<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (appended_tx, _) = broadcast::channel(APPEND_CHANNEL_CAPACITY);
        Self {
            turns: Arc::new(RwLock::new(Vec::new())),
            appended_tx,
        }
    }

    /// Add `turn` at the tail.
    pub async fn append(&self, turn: Turn) {
        let mut turns = self.turns.write().await;
        turns.push(turn.clone());
        // Nobody listening is fine.
        let _ = self.appended_tx.send(turn);
    }

    /// Ordered copy of the whole log at this instant.
    pub async fn snapshot(&self) -> Vec<Turn> {
        self.turns.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.turns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.turns.read().await.is_empty()
    }

    /// Receive every turn appended after this call, in append order.
    pub fn subscribe(&self) -> broadcast::Receiver<Turn> {
        self.appended_tx.subscribe()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = ConversationStore::new();
        store.append(Turn::user("one")).await;
        store.append(Turn::assistant("two", Some("Direct Evaluation".to_string()))).await;
        store.append(Turn::user("three")).await;

        let snapshot = store.snapshot().await;
        let contents: Vec<&str> = snapshot.iter().map(Turn::content).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(snapshot[1].method(), Some("Direct Evaluation"));
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_from_later_appends() {
        let store = ConversationStore::new();
        store.append(Turn::user("first")).await;
        let before = store.snapshot().await;

        store.append(Turn::user("second")).await;
        assert_eq!(before.len(), 1);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_clones_share_the_log() {
        let store = ConversationStore::new();
        let other = store.clone();
        other.append(Turn::user("shared")).await;
        assert!(!store.is_empty().await);
    }

    #[tokio::test]
    async fn test_subscribers_see_appends_in_order() {
        let store = ConversationStore::new();
        let mut rx = store.subscribe();

        store.append(Turn::user("q")).await;
        store.append(Turn::assistant("a", None)).await;

        assert_eq!(rx.recv().await.unwrap(), Turn::user("q"));
        assert_eq!(rx.recv().await.unwrap(), Turn::assistant("a", None));
    }

    #[test]
    fn test_turn_serialization_skips_missing_method() {
        let json = serde_json::to_string(&Turn::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
