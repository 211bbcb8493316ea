//! Per-user interaction history.

use std::collections::HashMap;

use tokio::sync::RwLock;

/// What the companion remembers about one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionRecord {
    pub last_message: String,
    pub last_response: String,
    pub message_count: u64,
}

/// In-memory store keyed by user id. Entries are never evicted.
pub struct ContextStore {
    records: RwLock<HashMap<String, InteractionRecord>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of the user's record, or the zero record. Never inserts.
    pub async fn get(&self, user_id: &str) -> InteractionRecord {
        self.records
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Record a completed turn. The write lock is held for the whole
    /// read-modify-write, so concurrent updates never lose a count.
    pub async fn update(&self, user_id: &str, message: &str, response: &str) {
        let mut records = self.records.write().await;
        let record = records.entry(user_id.to_string()).or_default();
        record.last_message = message.to_string();
        record.last_response = response.to_string();
        record.message_count += 1;
    }

    /// Number of users seen so far.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}
