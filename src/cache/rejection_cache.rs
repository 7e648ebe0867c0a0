use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::RejectionRecord;
use crate::store::{BackingStore, StoreError};

/// Records why a listing failed a task's filters so later ticks don't
/// re-fetch and re-classify it (spec §3, §4.5, §4.7). 48h TTL, unique on
/// `(task_id, ebay_listing_id)`.
pub struct RejectionCache {
    store: Arc<dyn BackingStore>,
    ttl: chrono::Duration,
}

impl RejectionCache {
    pub fn new(store: Arc<dyn BackingStore>, ttl: std::time::Duration) -> Self {
        Self {
            store,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::hours(48)),
        }
    }

    /// All listing ids currently rejected (non-expired) for this task.
    pub async fn live_ids(&self, task_id: &str) -> Result<HashSet<String>, StoreError> {
        self.store.live_rejection_ids(task_id, Utc::now()).await
    }

    pub async fn reject(
        &self,
        task_id: &str,
        ebay_listing_id: &str,
        reason: impl Into<String>,
    ) -> Result<(), StoreError> {
        let record = RejectionRecord::new(task_id, ebay_listing_id, reason, self.ttl);
        self.store.upsert_rejection(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::FakeStore;

    #[tokio::test]
    async fn rejected_ids_are_scoped_to_their_task() {
        let store: Arc<dyn BackingStore> = Arc::new(FakeStore::new());
        let cache = RejectionCache::new(store, std::time::Duration::from_secs(3600));
        cache.reject("task-a", "item-1", "plated").await.unwrap();
        cache.reject("task-b", "item-2", "costume").await.unwrap();

        let live_a = cache.live_ids("task-a").await.unwrap();
        assert!(live_a.contains("item-1"));
        assert!(!live_a.contains("item-2"));
    }

    #[tokio::test]
    async fn expired_rejections_are_not_returned() {
        let store: Arc<dyn BackingStore> = Arc::new(FakeStore::new());
        let cache = RejectionCache::new(store, std::time::Duration::from_secs(0));
        cache.reject("task-a", "item-1", "plated").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(cache.live_ids("task-a").await.unwrap().is_empty());
    }
}
