//! Per-user dish history.
//!
//! Tracks which dishes were recently suggested to each user so the generator
//! can be told to avoid repeats. In-memory only: history is a convenience,
//! not persisted state, and expires on its own.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Most dishes remembered per user.
const MAX_DISHES: usize = 20;

/// History entries older than this are dropped.
const MAX_AGE_DAYS: i64 = 7;

struct HistoryEntry {
    dishes: Vec<String>,
    updated_at: DateTime<Utc>,
}

/// In-memory per-user dish history.
#[derive(Default)]
pub struct DishHistory {
    entries: RwLock<HashMap<String, HistoryEntry>>,
}

impl DishHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dishes recently suggested to this user, oldest first.
    ///
    /// Expired entries are pruned on access.
    pub async fn recent(&self, user_id: &str) -> Vec<String> {
        if user_id.is_empty() {
            return Vec::new();
        }

        let cutoff = Utc::now() - Duration::days(MAX_AGE_DAYS);
        let mut entries = self.entries.write().await;

        match entries.get(user_id) {
            Some(entry) if entry.updated_at >= cutoff => entry.dishes.clone(),
            Some(_) => {
                entries.remove(user_id);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Record newly suggested dishes for this user.
    pub async fn record(&self, user_id: &str, dishes: &[String]) {
        if user_id.is_empty() || dishes.is_empty() {
            return;
        }

        let mut entries = self.entries.write().await;
        let entry = entries.entry(user_id.to_string()).or_insert_with(|| HistoryEntry {
            dishes: Vec::new(),
            updated_at: Utc::now(),
        });

        entry.dishes.extend(dishes.iter().cloned());
        let len = entry.dishes.len();
        if len > MAX_DISHES {
            entry.dishes.drain(..len - MAX_DISHES);
        }
        entry.updated_at = Utc::now();
    }

    /// Number of tracked users.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    #[cfg(test)]
    async fn backdate(&self, user_id: &str, days: i64) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(user_id) {
            entry.updated_at = Utc::now() - Duration::days(days);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dishes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn record_and_recall() {
        let history = DishHistory::new();
        history.record("alice", &dishes(&["Bibimbap", "Kimchi stew"])).await;

        assert_eq!(history.recent("alice").await, dishes(&["Bibimbap", "Kimchi stew"]));
        assert!(history.recent("bob").await.is_empty());
    }

    #[tokio::test]
    async fn history_caps_at_twenty_dishes() {
        let history = DishHistory::new();
        for i in 0..25 {
            history.record("alice", &dishes(&[&format!("dish{i}")])).await;
        }

        let recent = history.recent("alice").await;
        assert_eq!(recent.len(), 20);
        // Oldest entries were dropped
        assert_eq!(recent[0], "dish5");
        assert_eq!(recent[19], "dish24");
    }

    #[tokio::test]
    async fn stale_history_expires() {
        let history = DishHistory::new();
        history.record("alice", &dishes(&["Bibimbap"])).await;
        history.backdate("alice", 8).await;

        assert!(history.recent("alice").await.is_empty());
        assert!(history.is_empty().await);
    }

    #[tokio::test]
    async fn empty_user_or_dishes_ignored() {
        let history = DishHistory::new();
        history.record("", &dishes(&["Bibimbap"])).await;
        history.record("alice", &[]).await;
        assert_eq!(history.len().await, 0);
    }
}
