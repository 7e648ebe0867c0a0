use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::constants::{
    BULK_FETCH_BATCH_SIZE, MARKETPLACE_ID, SEARCH_PAGE_LIMIT, TOKEN_REFRESH_SKEW,
    UPSTREAM_ITEM_URL, UPSTREAM_OAUTH_SCOPE, UPSTREAM_OAUTH_URL, UPSTREAM_SEARCH_URL,
};
use crate::config::Config;
use crate::credentials::{CachedToken, CredentialPool, RateGovernor};
use crate::domain::{Credential, ItemDetail, ItemSpecific, ItemSummary};
use crate::store::BackingStore;

use super::errors::UpstreamError;
use super::query::SearchQuery;

/// C5: the upstream marketplace client. Owns no credential selection
/// logic itself — callers hand it the `Credential` the pool picked — but
/// owns everything downstream of that choice: token acquisition/caching,
/// request construction, and classifying the response into the error
/// taxonomy the task processor and scheduler branch on.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    pub credentials: CredentialPool,
    pub governor: RateGovernor,
    store: Arc<dyn BackingStore>,
    search_timeout: std::time::Duration,
    bulk_timeout: std::time::Duration,
    token_timeout: std::time::Duration,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default, rename = "itemSummaries")]
    item_summaries: Vec<RawItemSummary>,
}

#[derive(Deserialize)]
struct RawItemSummary {
    #[serde(rename = "itemId")]
    item_id: String,
    title: String,
    #[serde(rename = "itemWebUrl")]
    item_web_url: String,
    price: RawMoney,
    #[serde(default, rename = "shippingOptions")]
    shipping_options: Vec<RawShippingOption>,
    #[serde(default, rename = "buyingOptions")]
    buying_options: Vec<String>,
    #[serde(default, rename = "categoryId")]
    category_id: Option<String>,
    condition: Option<String>,
    #[serde(default, rename = "seller")]
    seller: Option<RawSeller>,
    #[serde(default, rename = "itemCreationDate")]
    item_creation_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Deserialize)]
struct RawMoney {
    value: String,
    currency: String,
}

#[derive(Deserialize)]
struct RawShippingOption {
    #[serde(rename = "shippingCost")]
    shipping_cost: Option<RawMoney>,
}

#[derive(Deserialize)]
struct RawSeller {
    #[serde(rename = "feedbackScore")]
    feedback_score: Option<u32>,
}

#[derive(Deserialize)]
struct RawItemDetail {
    #[serde(rename = "itemId")]
    item_id: String,
    title: String,
    #[serde(default, rename = "shortDescription")]
    description: Option<String>,
    #[serde(default, rename = "localizedAspects")]
    localized_aspects: Vec<RawAspect>,
}

#[derive(Deserialize)]
struct RawAspect {
    name: String,
    value: String,
}

#[derive(Deserialize)]
struct RawBulkResponse {
    #[serde(default, rename = "items")]
    items: Vec<RawItemDetail>,
}

impl UpstreamClient {
    pub fn new(config: &Config, credentials: CredentialPool, store: Arc<dyn BackingStore>) -> Self {
        Self {
            http: Client::new(),
            governor: RateGovernor::new(config.ebay_daily_limit),
            credentials,
            store,
            search_timeout: config.upstream_search_timeout,
            bulk_timeout: config.upstream_bulk_timeout,
            token_timeout: config.upstream_token_timeout,
        }
    }

    /// Observability-only per-credential call counter (spec §4.2: "does
    /// not gate anything at runtime"). Failures are logged and swallowed.
    async fn record_credential_usage(&self, app_id: &str) {
        let Some(calls_today) = self.credentials.record_usage(app_id).await else {
            return;
        };
        if let Err(e) = self.store.record_credential_usage(app_id, calls_today).await {
            log::warn!("failed to record credential usage for {app_id}: {e}");
        }
    }

    /// Returns a bearer token for `credential`, refreshing via the
    /// client-credentials grant on cache miss or within
    /// `TOKEN_REFRESH_SKEW` of expiry (spec §4.3).
    pub async fn token_for(&self, credential: &Credential) -> Result<String, UpstreamError> {
        if let Some(cached) = self.credentials.token_cache.get(&credential.app_id).await {
            return Ok(cached.token);
        }

        let resp = self
            .http
            .post(UPSTREAM_OAUTH_URL)
            .timeout(self.token_timeout)
            .basic_auth(&credential.app_id, Some(&credential.cert_id))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", UPSTREAM_OAUTH_SCOPE),
            ])
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(UpstreamError::AuthError {
                credential: credential.app_id.clone(),
            }),
            status if status.is_success() => {
                let parsed: TokenResponse = resp.json().await.map_err(|e| {
                    UpstreamError::Decode(format!("token response: {e}"))
                })?;
                let ttl = chrono::Duration::seconds(parsed.expires_in)
                    - chrono::Duration::from_std(TOKEN_REFRESH_SKEW).unwrap_or_default();
                let expires_at = chrono::Utc::now() + ttl.max(chrono::Duration::zero());
                self.credentials
                    .token_cache
                    .put(
                        &credential.app_id,
                        CachedToken {
                            token: parsed.access_token.clone(),
                            expires_at,
                        },
                    )
                    .await;
                Ok(parsed.access_token)
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(UpstreamError::TransientError {
                    status: status.as_u16(),
                    body_excerpt: excerpt(&body),
                })
            }
        }
    }

    /// Search, respecting the daily call cap (spec §4.2: skipped calls
    /// are treated as an empty result, not an error).
    pub async fn search(
        &self,
        query: &SearchQuery,
        credential: &Credential,
    ) -> Result<Vec<ItemSummary>, UpstreamError> {
        if !self.governor.can_make_call().await {
            return Ok(Vec::new());
        }
        let token = self.token_for(credential).await?;

        let filter = format!(
            "price:[{}..{}],priceCurrency:USD",
            query.min_price, query.max_price
        );
        let mut req = self
            .http
            .get(UPSTREAM_SEARCH_URL)
            .timeout(self.search_timeout)
            .bearer_auth(&token)
            .header("X-EBAY-C-MARKETPLACE-ID", MARKETPLACE_ID)
            .query(&[
                ("q", query.keywords.as_str()),
                ("limit", &SEARCH_PAGE_LIMIT.to_string()),
                ("sort", "newlyListed"),
                ("filter", &filter),
            ]);
        if let Some(categories) = &query.category_ids {
            req = req.query(&[("category_ids", categories.as_str())]);
        }

        let resp = req.send().await?;
        self.governor.record_call().await;
        self.record_credential_usage(&credential.app_id).await;
        let resp = self.classify_or_extract(resp, credential).await?;
        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(format!("search response: {e}")))?;
        Ok(parsed.item_summaries.into_iter().map(Into::into).collect())
    }

    /// Single-item detail fetch (no cache read-through here; the cache
    /// layer in `cache::ItemCache` wraps this).
    pub async fn fetch_one(
        &self,
        item_id: &str,
        credential: &Credential,
    ) -> Result<ItemDetail, UpstreamError> {
        if !self.governor.can_make_call().await {
            return Err(UpstreamError::TransientError {
                status: 0,
                body_excerpt: "daily call cap reached".to_string(),
            });
        }
        let token = self.token_for(credential).await?;
        let url = format!("{UPSTREAM_ITEM_URL}/{item_id}");
        let resp = self
            .http
            .get(&url)
            .timeout(self.bulk_timeout)
            .bearer_auth(&token)
            .header("X-EBAY-C-MARKETPLACE-ID", MARKETPLACE_ID)
            .send()
            .await?;
        self.governor.record_call().await;
        self.record_credential_usage(&credential.app_id).await;
        let resp = self.classify_or_extract(resp, credential).await?;
        let parsed: RawItemDetail = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(format!("item detail: {e}")))?;
        Ok(parsed.into())
    }

    /// Bulk fetch (max `BULK_FETCH_BATCH_SIZE` ids per call). Returns
    /// `Err(BulkNotAuthorizedError)` on 403 so the caller can fall back to
    /// `fetch_one` per item (spec §4.4).
    pub async fn fetch_many(
        &self,
        item_ids: &[String],
        credential: &Credential,
    ) -> Result<Vec<ItemDetail>, UpstreamError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        if !self.governor.can_make_call().await {
            return Ok(Vec::new());
        }
        let token = self.token_for(credential).await?;
        let ids = item_ids
            .iter()
            .take(BULK_FETCH_BATCH_SIZE)
            .cloned()
            .collect::<Vec<_>>()
            .join(",");

        let resp = self
            .http
            .get(UPSTREAM_ITEM_URL)
            .timeout(self.bulk_timeout)
            .bearer_auth(&token)
            .header("X-EBAY-C-MARKETPLACE-ID", MARKETPLACE_ID)
            .query(&[("item_ids", ids.as_str())])
            .send()
            .await?;
        self.governor.record_call().await;
        self.record_credential_usage(&credential.app_id).await;

        if resp.status() == StatusCode::FORBIDDEN {
            return Err(UpstreamError::BulkNotAuthorizedError);
        }
        let resp = self.classify_or_extract(resp, credential).await?;
        let parsed: RawBulkResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(format!("bulk item response: {e}")))?;
        Ok(parsed.items.into_iter().map(Into::into).collect())
    }

    /// Maps a response into the error taxonomy (spec §4.3/§4.4/§7), or
    /// passes the (still-unread-body) response through on success so the
    /// caller can deserialize it.
    async fn classify_or_extract(
        &self,
        resp: reqwest::Response,
        credential: &Credential,
    ) -> Result<reqwest::Response, UpstreamError> {
        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::TOO_MANY_REQUESTS => Err(UpstreamError::RateLimitError {
                credential: credential.app_id.clone(),
            }),
            StatusCode::UNAUTHORIZED => Err(UpstreamError::AuthError {
                credential: credential.app_id.clone(),
            }),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(UpstreamError::TransientError {
                    status: status.as_u16(),
                    body_excerpt: excerpt(&body),
                })
            }
        }
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}

impl From<RawItemSummary> for ItemSummary {
    fn from(raw: RawItemSummary) -> Self {
        let shipping_cost = raw
            .shipping_options
            .first()
            .and_then(|o| o.shipping_cost.as_ref())
            .and_then(|m| m.value.parse::<f64>().ok())
            .unwrap_or(0.0);
        Self {
            item_id: raw.item_id,
            title: raw.title,
            item_web_url: raw.item_web_url,
            price_value: raw.price.value.parse().unwrap_or(0.0),
            currency: raw.price.currency,
            shipping_cost,
            buying_options: raw.buying_options,
            category_id: raw.category_id,
            condition: raw.condition,
            seller_feedback_score: raw.seller.and_then(|s| s.feedback_score),
            item_creation_date: raw.item_creation_date,
        }
    }
}

impl From<RawItemDetail> for ItemDetail {
    fn from(raw: RawItemDetail) -> Self {
        Self {
            item_id: raw.item_id,
            title: raw.title,
            description: raw.description,
            item_specifics: raw
                .localized_aspects
                .into_iter()
                .map(|a| ItemSpecific {
                    name: a.name,
                    value: a.value,
                })
                .collect(),
            from_cache: false,
        }
    }
}
