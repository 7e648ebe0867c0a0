use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::MetalPriceTable;
use crate::store::{BackingStore, StoreError};

/// 1h in-process cache over `metal_prices` (spec §3 "Metal-price
/// snapshot", §4.7). Unlike the item-detail/rejection caches this one is
/// never persisted — it just avoids re-querying the backing store every
/// tick for a table that moves slowly.
pub struct MetalPriceCache {
    store: Arc<dyn BackingStore>,
    ttl: std::time::Duration,
    state: Mutex<Option<(MetalPriceTable, Instant)>>,
}

impl MetalPriceCache {
    pub fn new(store: Arc<dyn BackingStore>, ttl: std::time::Duration) -> Self {
        Self {
            store,
            ttl,
            state: Mutex::new(None),
        }
    }

    pub async fn get(&self) -> Result<MetalPriceTable, StoreError> {
        let mut state = self.state.lock().await;
        if let Some((table, fetched_at)) = state.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(table.clone());
            }
        }
        let fresh = self.store.load_metal_prices().await?;
        *state = Some((fresh.clone(), Instant::now()));
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::FakeStore;

    #[tokio::test]
    async fn caches_the_table_for_the_configured_ttl() {
        let store: Arc<dyn BackingStore> = Arc::new(FakeStore::new());
        let cache = MetalPriceCache::new(store, std::time::Duration::from_secs(3600));
        // Two calls in quick succession must both succeed and agree, since
        // the second is served from cache rather than re-fetched.
        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert_eq!(first.snapshots.len(), second.snapshots.len());
    }
}
