//! C1: Backing-store gateway. Typed read/write operations over the
//! logical collections spec §6 describes, reached over a PostgREST-style
//! JSON HTTP interface (see SPEC_FULL.md §6.3) rather than a direct
//! database driver.

mod client;

pub use client::SupabaseStore;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Credential, CredentialStatus, GemstoneMatch, ItemCacheEntry, ItemType, JewelryMatch,
    MetalPriceTable, RejectionRecord, Task, WatchMatch,
};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("backing store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backing store returned malformed data: {0}")]
    Decode(String),
    #[error("unique-violation on insert (expected dedup path): {0}")]
    UniqueViolation(String),
}

/// The contract the task processor, scheduler, and credential pool
/// consume. `insert_*_match` returns `Ok(false)` (not an error) when the
/// insert was dropped as a duplicate of an existing
/// `(task_id, ebay_listing_id)` row — spec §7 item 6.
#[async_trait]
pub trait BackingStore: Send + Sync {
    async fn load_credentials(&self) -> Result<Vec<Credential>, StoreError>;
    async fn update_credential_status(
        &self,
        app_id: &str,
        status: CredentialStatus,
    ) -> Result<(), StoreError>;
    async fn record_credential_usage(&self, app_id: &str, calls_today: u32) -> Result<(), StoreError>;

    async fn load_active_tasks(&self) -> Result<Vec<Task>, StoreError>;
    async fn update_task_last_run(&self, task_id: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn existing_match_ids(
        &self,
        item_type: ItemType,
        task_id: &str,
    ) -> Result<HashSet<String>, StoreError>;
    async fn live_rejection_ids(
        &self,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> Result<HashSet<String>, StoreError>;
    async fn upsert_rejection(&self, record: &RejectionRecord) -> Result<(), StoreError>;

    async fn insert_jewelry_match(&self, record: &JewelryMatch) -> Result<bool, StoreError>;
    async fn insert_watch_match(&self, record: &WatchMatch) -> Result<bool, StoreError>;
    async fn insert_gemstone_match(&self, record: &GemstoneMatch) -> Result<bool, StoreError>;

    async fn get_cached_item(&self, ebay_item_id: &str) -> Result<Option<ItemCacheEntry>, StoreError>;
    async fn put_cached_item(&self, entry: &ItemCacheEntry) -> Result<(), StoreError>;

    async fn load_metal_prices(&self) -> Result<MetalPriceTable, StoreError>;

    /// Deletes expired `ebay_item_cache` and `rejected_items` rows.
    /// Returns `(item_cache_deleted, rejections_deleted)`.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<(u64, u64), StoreError>;
}
