//! Notification store - transient user-facing messages
//!
//! Insertion order is display order. Every entry gets its own id and its
//! own expiry timer; duplicates are not merged. Changes are broadcast so a
//! renderer can follow the queue without polling.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum NotificationEvent {
    Added(Notification),
    Removed { id: String },
    Cleared,
}

#[derive(Clone)]
pub struct NotificationStore {
    queue: Arc<RwLock<Vec<Notification>>>,
    events: broadcast::Sender<NotificationEvent>,
    display_window: Option<Duration>,
}

impl NotificationStore {
    /// Entries remove themselves after `display_window`
    pub fn new(display_window: Duration) -> Self {
        Self::build(Some(display_window))
    }

    /// Entries stay until removed explicitly
    pub fn without_expiry() -> Self {
        Self::build(None)
    }

    fn build(display_window: Option<Duration>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            queue: Arc::new(RwLock::new(Vec::new())),
            events,
            display_window,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// Append a message and return its fresh id
    pub async fn add(&self, kind: NotificationKind, message: impl Into<String>) -> String {
        let notification = {
            let mut queue = self.queue.write().await;
            let id = loop {
                let candidate = random_id();
                if !queue.iter().any(|n| n.id == candidate) {
                    break candidate;
                }
            };
            let notification = Notification {
                id,
                kind,
                message: message.into(),
            };
            queue.push(notification.clone());
            notification
        };

        let id = notification.id.clone();
        tracing::debug!("Notification {} [{}]: {}", id, kind.as_str(), notification.message);
        // No subscribers is fine
        let _ = self.events.send(NotificationEvent::Added(notification));
        self.schedule_expiry(&id);
        id
    }

    pub async fn info(&self, message: impl Into<String>) -> String {
        self.add(NotificationKind::Info, message).await
    }

    pub async fn success(&self, message: impl Into<String>) -> String {
        self.add(NotificationKind::Success, message).await
    }

    pub async fn warning(&self, message: impl Into<String>) -> String {
        self.add(NotificationKind::Warning, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> String {
        self.add(NotificationKind::Error, message).await
    }

    /// Remove by id; absent ids are a no-op. Returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut queue = self.queue.write().await;
            let before = queue.len();
            queue.retain(|n| n.id != id);
            queue.len() != before
        };
        if removed {
            let _ = self.events.send(NotificationEvent::Removed { id: id.to_string() });
        }
        removed
    }

    pub async fn clear(&self) {
        self.queue.write().await.clear();
        let _ = self.events.send(NotificationEvent::Cleared);
    }

    pub async fn list(&self) -> Vec<Notification> {
        self.queue.read().await.clone()
    }

    fn schedule_expiry(&self, id: &str) {
        let Some(window) = self.display_window else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime; notification {} will not expire", id);
            return;
        };
        let store = self.clone();
        let id = id.to_string();
        runtime.spawn(async move {
            tokio::time::sleep(window).await;
            store.remove(&id).await;
        });
    }
}

fn random_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn ids_are_distinct_and_order_is_insertion() {
        let store = NotificationStore::without_expiry();
        let mut ids = Vec::new();
        for i in 0..50 {
            ids.push(store.info(format!("message {}", i)).await);
        }

        let listed = store.list().await;
        assert_eq!(listed.len(), 50);
        assert_eq!(listed.iter().map(|n| n.id.clone()).collect::<Vec<_>>(), ids);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 50);
        assert!(ids
            .iter()
            .all(|id| id.len() == 9 && id.bytes().all(|b| ID_ALPHABET.contains(&b))));
        assert_eq!(listed[0].message, "message 0");
    }

    #[tokio::test]
    async fn duplicates_are_kept() {
        let store = NotificationStore::without_expiry();
        let a = store.error("Failed to save").await;
        let b = store.error("Failed to save").await;
        assert_ne!(a, b);
        assert_eq!(store.list().await.len(), 2);
    }

    #[tokio::test]
    async fn removing_unknown_id_is_noop() {
        let store = NotificationStore::without_expiry();
        store.warning("careful").await;
        let before = store.list().await;

        assert!(!store.remove("not-an-id").await);
        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let store = NotificationStore::without_expiry();
        let first = store.success("one").await;
        store.info("two").await;

        assert!(store.remove(&first).await);
        let remaining = store.list().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "two");

        store.clear().await;
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn broadcasts_changes() {
        let store = NotificationStore::without_expiry();
        let mut rx = store.subscribe();

        let id = store.info("hello").await;
        store.remove(&id).await;
        store.clear().await;

        match rx.recv().await.unwrap() {
            NotificationEvent::Added(n) => assert_eq!(n.id, id),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            rx.recv().await.unwrap(),
            NotificationEvent::Removed { id: id.clone() }
        );
        assert_eq!(rx.recv().await.unwrap(), NotificationEvent::Cleared);
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_display_window() {
        let store = NotificationStore::new(Duration::from_secs(3));
        let mut rx = store.subscribe();

        let id = store.info("Signed in").await;
        assert!(matches!(rx.recv().await.unwrap(), NotificationEvent::Added(_)));

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert_eq!(store.list().await.len(), 1);

        // paused clock auto-advances to the expiry timer
        assert_eq!(rx.recv().await.unwrap(), NotificationEvent::Removed { id });
        assert!(store.list().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn each_entry_has_its_own_timer() {
        let store = NotificationStore::new(Duration::from_secs(3));
        let first = store.info("first").await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        let second = store.info("second").await;

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let ids: Vec<_> = store.list().await.into_iter().map(|n| n.id).collect();
        assert!(!ids.contains(&first));
        assert!(ids.contains(&second));
    }

    #[test]
    fn serializes_kind_as_type() {
        let n = Notification {
            id: "abc".into(),
            kind: NotificationKind::Warning,
            message: "m".into(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "warning");
    }
}
