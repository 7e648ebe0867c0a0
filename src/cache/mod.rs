//! C6: the content-addressed caches sitting in front of the upstream
//! detail fetch and in front of re-paying rejection cost (spec §3, §4.7).
//! Both are thin TTL-aware wrappers over `store::BackingStore`; neither
//! holds state of its own beyond the configured TTL.

mod item_cache;
mod metal_price_cache;
mod rejection_cache;

pub use item_cache::ItemCache;
pub use metal_price_cache::MetalPriceCache;
pub use rejection_cache::RejectionCache;

/// A minimal in-memory `BackingStore` used only by this crate's own
/// `#[cfg(test)]` modules, so the cache wrappers can be exercised without
/// a live Supabase instance.
#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use crate::domain::{
        Credential, CredentialStatus, GemstoneMatch, ItemCacheEntry, ItemType, JewelryMatch,
        MetalPriceTable, RejectionRecord, Task, WatchMatch,
    };
    use crate::store::{BackingStore, StoreError};

    #[derive(Default)]
    pub struct FakeStore {
        items: Mutex<HashMap<String, ItemCacheEntry>>,
        rejections: Mutex<HashMap<(String, String), RejectionRecord>>,
    }

    impl FakeStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl BackingStore for FakeStore {
        async fn load_credentials(&self) -> Result<Vec<Credential>, StoreError> {
            Ok(vec![])
        }

        async fn update_credential_status(&self, _app_id: &str, _status: CredentialStatus) -> Result<(), StoreError> {
            Ok(())
        }

        async fn record_credential_usage(&self, _app_id: &str, _calls_today: u32) -> Result<(), StoreError> {
            Ok(())
        }

        async fn load_active_tasks(&self) -> Result<Vec<Task>, StoreError> {
            Ok(vec![])
        }

        async fn update_task_last_run(&self, _task_id: &str, _at: DateTime<Utc>) -> Result<(), StoreError> {
            Ok(())
        }

        async fn existing_match_ids(&self, _item_type: ItemType, _task_id: &str) -> Result<HashSet<String>, StoreError> {
            Ok(HashSet::new())
        }

        async fn live_rejection_ids(&self, task_id: &str, now: DateTime<Utc>) -> Result<HashSet<String>, StoreError> {
            let rejections = self.rejections.lock().unwrap();
            Ok(rejections
                .iter()
                .filter(|((t, _), r)| t == task_id && r.is_live(now))
                .map(|((_, id), _)| id.clone())
                .collect())
        }

        async fn upsert_rejection(&self, record: &RejectionRecord) -> Result<(), StoreError> {
            self.rejections
                .lock()
                .unwrap()
                .insert((record.task_id.clone(), record.ebay_listing_id.clone()), record.clone());
            Ok(())
        }

        async fn insert_jewelry_match(&self, _record: &JewelryMatch) -> Result<bool, StoreError> {
            Ok(true)
        }

        async fn insert_watch_match(&self, _record: &WatchMatch) -> Result<bool, StoreError> {
            Ok(true)
        }

        async fn insert_gemstone_match(&self, _record: &GemstoneMatch) -> Result<bool, StoreError> {
            Ok(true)
        }

        async fn get_cached_item(&self, ebay_item_id: &str) -> Result<Option<ItemCacheEntry>, StoreError> {
            Ok(self.items.lock().unwrap().get(ebay_item_id).cloned())
        }

        async fn put_cached_item(&self, entry: &ItemCacheEntry) -> Result<(), StoreError> {
            self.items.lock().unwrap().insert(entry.ebay_item_id.clone(), entry.clone());
            Ok(())
        }

        async fn load_metal_prices(&self) -> Result<MetalPriceTable, StoreError> {
            Ok(MetalPriceTable::default())
        }

        async fn cleanup_expired(&self, _now: DateTime<Utc>) -> Result<(u64, u64), StoreError> {
            Ok((0, 0))
        }
    }
}
