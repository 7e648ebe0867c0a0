use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted note that a listing failed a task's filters. TTL 48h;
/// unique on `(task_id, ebay_listing_id)` so a later upsert just refreshes
/// the expiry and reason (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub task_id: String,
    pub ebay_listing_id: String,
    pub rejection_reason: String,
    pub rejected_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RejectionRecord {
    pub fn new(task_id: impl Into<String>, ebay_listing_id: impl Into<String>, reason: impl Into<String>, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            ebay_listing_id: ebay_listing_id.into(),
            rejection_reason: reason.into(),
            rejected_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
