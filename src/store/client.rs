use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::Config;
use crate::domain::{
    Credential, CredentialStatus, GemstoneMatch, ItemCacheEntry, ItemType, JewelryMatch,
    MetalPriceSnapshot, MetalPriceTable, RejectionRecord, Task, WatchMatch,
};

use super::{BackingStore, StoreError};

const EBAY_KEYS_SETTING: &str = "ebay_keys";

/// PostgREST-style gateway over Supabase's `/rest/v1` surface. Every
/// logical collection in spec §6 maps to one table reached through this
/// single `reqwest::Client`.
#[derive(Clone)]
pub struct SupabaseStore {
    http: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseStore {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    fn rest_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &[(&str, &str)],
    ) -> Result<T, StoreError> {
        let resp = self
            .auth(self.http.get(self.rest_url(collection)).query(query))
            .send()
            .await?
            .error_for_status()?;
        resp.json::<T>().await.map_err(StoreError::from)
    }

    /// POST an insert; returns `Ok(true)` on success, `Ok(false)` when the
    /// backing store reports a unique-violation (23505-equivalent; spec
    /// §4.5/§7 item 6 — this is the expected dedup path, not an error).
    async fn insert_row(&self, collection: &str, body: &Value) -> Result<bool, StoreError> {
        let resp = self
            .auth(self.http.post(self.rest_url(collection)))
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;

        match resp.status() {
            StatusCode::CONFLICT => Ok(false),
            status if status.is_success() => Ok(true),
            status => {
                let text = resp.text().await.unwrap_or_default();
                if status == StatusCode::BAD_REQUEST && text.contains("23505") {
                    Ok(false)
                } else {
                    Err(StoreError::Decode(format!("insert into {collection} failed: {status} {text}")))
                }
            }
        }
    }

    async fn upsert_row(
        &self,
        collection: &str,
        on_conflict: &str,
        body: &Value,
    ) -> Result<(), StoreError> {
        self.auth(self.http.post(self.rest_url(collection)))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl BackingStore for SupabaseStore {
    async fn load_credentials(&self) -> Result<Vec<Credential>, StoreError> {
        #[derive(serde::Deserialize)]
        struct SettingRow {
            value_json: Value,
        }
        #[derive(serde::Deserialize)]
        struct KeysSetting {
            keys: Vec<Credential>,
        }

        let rows: Vec<SettingRow> = self
            .get_json(
                "settings",
                &[("key", &format!("eq.{EBAY_KEYS_SETTING}")), ("select", "value_json")],
            )
            .await?;

        match rows.into_iter().next() {
            Some(row) => {
                let parsed: KeysSetting = serde_json::from_value(row.value_json)
                    .map_err(|e| StoreError::Decode(format!("ebay_keys setting: {e}")))?;
                Ok(parsed.keys)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn update_credential_status(
        &self,
        app_id: &str,
        status: CredentialStatus,
    ) -> Result<(), StoreError> {
        let mut keys = self.load_credentials().await?;
        if let Some(cred) = keys.iter_mut().find(|c| c.app_id == app_id) {
            cred.status = status;
        }
        let body = json!({ "key": EBAY_KEYS_SETTING, "value_json": { "keys": keys } });
        self.upsert_row("settings", "key", &body).await
    }

    async fn record_credential_usage(&self, app_id: &str, calls_today: u32) -> Result<(), StoreError> {
        let mut keys = self.load_credentials().await?;
        if let Some(cred) = keys.iter_mut().find(|c| c.app_id == app_id) {
            cred.calls_today = calls_today;
            cred.calls_reset_date = Some(Utc::now().date_naive());
        }
        let body = json!({ "key": EBAY_KEYS_SETTING, "value_json": { "keys": keys } });
        self.upsert_row("settings", "key", &body).await?;

        // Append-only observability log (spec §6: api_usage).
        let usage = json!({ "app_id": app_id, "calls_today": calls_today, "logged_at": Utc::now() });
        let _ = self.insert_row("api_usage", &usage).await;
        Ok(())
    }

    async fn load_active_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.get_json("tasks", &[("status", "eq.active"), ("select", "*")])
            .await
    }

    async fn update_task_last_run(&self, task_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.auth(self.http.patch(self.rest_url("tasks")))
            .query(&[("id", &format!("eq.{task_id}"))])
            .header("Prefer", "return=minimal")
            .json(&json!({ "last_run": at }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn existing_match_ids(
        &self,
        item_type: ItemType,
        task_id: &str,
    ) -> Result<HashSet<String>, StoreError> {
        #[derive(serde::Deserialize)]
        struct IdRow {
            ebay_listing_id: String,
        }
        let rows: Vec<IdRow> = self
            .get_json(
                matches_collection(item_type),
                &[("task_id", &format!("eq.{task_id}")), ("select", "ebay_listing_id")],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.ebay_listing_id).collect())
    }

    async fn live_rejection_ids(
        &self,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> Result<HashSet<String>, StoreError> {
        #[derive(serde::Deserialize)]
        struct IdRow {
            ebay_listing_id: String,
        }
        let rows: Vec<IdRow> = self
            .get_json(
                "rejected_items",
                &[
                    ("task_id", &format!("eq.{task_id}")),
                    ("expires_at", &format!("gt.{}", now.to_rfc3339())),
                    ("select", "ebay_listing_id"),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.ebay_listing_id).collect())
    }

    async fn upsert_rejection(&self, record: &RejectionRecord) -> Result<(), StoreError> {
        self.upsert_row(
            "rejected_items",
            "task_id,ebay_listing_id",
            &serde_json::to_value(record).map_err(|e| StoreError::Decode(e.to_string()))?,
        )
        .await
    }

    async fn insert_jewelry_match(&self, record: &JewelryMatch) -> Result<bool, StoreError> {
        self.insert_row(
            "matches_jewelry",
            &serde_json::to_value(record).map_err(|e| StoreError::Decode(e.to_string()))?,
        )
        .await
    }

    async fn insert_watch_match(&self, record: &WatchMatch) -> Result<bool, StoreError> {
        self.insert_row(
            "matches_watch",
            &serde_json::to_value(record).map_err(|e| StoreError::Decode(e.to_string()))?,
        )
        .await
    }

    async fn insert_gemstone_match(&self, record: &GemstoneMatch) -> Result<bool, StoreError> {
        self.insert_row(
            "matches_gemstone",
            &serde_json::to_value(record).map_err(|e| StoreError::Decode(e.to_string()))?,
        )
        .await
    }

    async fn get_cached_item(&self, ebay_item_id: &str) -> Result<Option<ItemCacheEntry>, StoreError> {
        let rows: Vec<ItemCacheEntry> = self
            .get_json(
                "ebay_item_cache",
                &[("ebay_item_id", &format!("eq.{ebay_item_id}")), ("select", "*")],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn put_cached_item(&self, entry: &ItemCacheEntry) -> Result<(), StoreError> {
        self.upsert_row(
            "ebay_item_cache",
            "ebay_item_id",
            &serde_json::to_value(entry).map_err(|e| StoreError::Decode(e.to_string()))?,
        )
        .await
    }

    async fn load_metal_prices(&self) -> Result<MetalPriceTable, StoreError> {
        let rows: Vec<MetalPriceSnapshot> = self.get_json("metal_prices", &[("select", "*")]).await?;
        let snapshots = rows
            .into_iter()
            .map(|s| (s.metal.to_ascii_lowercase(), s))
            .collect();
        Ok(MetalPriceTable { snapshots })
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<(u64, u64), StoreError> {
        let cutoff = now.to_rfc3339();

        let cache_resp = self
            .auth(self.http.delete(self.rest_url("ebay_item_cache")))
            .query(&[("expires_at", &format!("lt.{cutoff}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?
            .error_for_status()?;
        let cache_deleted = count_json_array(cache_resp).await;

        let rej_resp = self
            .auth(self.http.delete(self.rest_url("rejected_items")))
            .query(&[("expires_at", &format!("lt.{cutoff}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?
            .error_for_status()?;
        let rejections_deleted = count_json_array(rej_resp).await;

        Ok((cache_deleted, rejections_deleted))
    }
}

fn matches_collection(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Jewelry => "matches_jewelry",
        ItemType::Watch => "matches_watch",
        ItemType::Gemstone => "matches_gemstone",
    }
}

async fn count_json_array(resp: reqwest::Response) -> u64 {
    match resp.json::<Vec<Value>>().await {
        Ok(rows) => rows.len() as u64,
        Err(_) => 0,
    }
}
