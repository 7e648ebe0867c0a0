use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::upstream_item::ItemSpecific;

/// Cached detail-fetch result. TTL 24h; unique on `ebay_item_id`
/// (spec §3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCacheEntry {
    pub ebay_item_id: String,
    pub item_specifics: Vec<ItemSpecific>,
    pub title: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ItemCacheEntry {
    pub fn new(
        ebay_item_id: impl Into<String>,
        item_specifics: Vec<ItemSpecific>,
        title: impl Into<String>,
        ttl: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            ebay_item_id: ebay_item_id.into(),
            item_specifics,
            title: title.into(),
            fetched_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
