use std::sync::Arc;

use chrono::Utc;

use crate::domain::{ItemCacheEntry, ItemDetail, ItemSpecific};
use crate::store::{BackingStore, StoreError};

/// Read-through cache over per-item detail fetches (spec §4.4 "fetch
/// one"). A hit returns the synthetic record carrying only the cached
/// `item_specifics` and `title`, marked `from_cache: true` — callers must
/// not assume `description` survives a cache hit.
pub struct ItemCache {
    store: Arc<dyn BackingStore>,
    ttl: chrono::Duration,
}

impl ItemCache {
    pub fn new(store: Arc<dyn BackingStore>, ttl: std::time::Duration) -> Self {
        Self {
            store,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::hours(24)),
        }
    }

    pub async fn get(&self, ebay_item_id: &str) -> Result<Option<ItemDetail>, StoreError> {
        let Some(entry) = self.store.get_cached_item(ebay_item_id).await? else {
            return Ok(None);
        };
        if !entry.is_live(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(from_entry(entry)))
    }

    pub async fn put(&self, detail: &ItemDetail) -> Result<(), StoreError> {
        let entry = ItemCacheEntry::new(
            detail.item_id.clone(),
            detail.item_specifics.clone(),
            detail.title.clone(),
            self.ttl,
        );
        self.store.put_cached_item(&entry).await
    }
}

fn from_entry(entry: ItemCacheEntry) -> ItemDetail {
    ItemDetail {
        item_id: entry.ebay_item_id,
        title: entry.title,
        description: None,
        item_specifics: entry.item_specifics.into_iter().collect::<Vec<ItemSpecific>>(),
        from_cache: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::FakeStore;

    #[tokio::test]
    async fn put_then_get_round_trips_through_the_store() {
        let store: Arc<dyn BackingStore> = Arc::new(FakeStore::new());
        let cache = ItemCache::new(store, std::time::Duration::from_secs(3600));
        let detail = ItemDetail {
            item_id: "item-1".to_string(),
            title: "14k gold ring".to_string(),
            description: Some("a description".to_string()),
            item_specifics: vec![ItemSpecific { name: "metal".to_string(), value: "gold".to_string() }],
            from_cache: false,
        };
        cache.put(&detail).await.unwrap();
        let cached = cache.get("item-1").await.unwrap().unwrap();
        assert_eq!(cached.title, "14k gold ring");
        assert!(cached.from_cache);
        assert!(cached.description.is_none(), "cache hits must not resurrect the description");
    }

    #[tokio::test]
    async fn expired_entries_are_treated_as_a_miss() {
        let store: Arc<dyn BackingStore> = Arc::new(FakeStore::new());
        let cache = ItemCache::new(Arc::clone(&store), std::time::Duration::from_secs(0));
        let detail = ItemDetail {
            item_id: "item-1".to_string(),
            title: "ring".to_string(),
            description: None,
            item_specifics: vec![],
            from_cache: false,
        };
        cache.put(&detail).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(cache.get("item-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_entry_is_a_clean_none() {
        let store: Arc<dyn BackingStore> = Arc::new(FakeStore::new());
        let cache = ItemCache::new(store, std::time::Duration::from_secs(3600));
        assert!(cache.get("nonexistent").await.unwrap().is_none());
    }
}
