//! Data model: the records the worker reads from and writes to the
//! backing store (spec §3), plus the upstream wire-level summary/detail
//! shapes it consumes.

mod credential;
mod item_cache;
mod match_record;
mod metal_price;
mod rejection;
mod task;
mod upstream_item;

pub use credential::{Credential, CredentialStatus};
pub use item_cache::ItemCacheEntry;
pub use match_record::{
    GemstoneMatch, JewelryMatch, MatchCommon, MatchStatus, WatchMatch,
};
pub use metal_price::{MetalPriceSnapshot, MetalPriceTable};
pub use rejection::RejectionRecord;
pub use task::{
    GemstoneFilters, ItemType, JewelryFilters, Task, TaskFilters, TaskStatus, WatchFilters,
};
pub use upstream_item::{ItemDetail, ItemSummary, ItemSpecific};
