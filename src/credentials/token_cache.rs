use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

#[derive(Clone, Debug)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// C3: maps `app_id -> bearer token` with expiry. Refreshes on miss or
/// within `TOKEN_REFRESH_SKEW` of expiry (spec §4.3). Process-local, no
/// persistence.
pub struct TokenCache {
    tokens: Mutex<HashMap<String, CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a token still fresh enough to use, if cached. `expires_at`
    /// is stored with `TOKEN_REFRESH_SKEW` already subtracted (see
    /// `UpstreamClient::token_for`), so a plain comparison against now is
    /// enough here.
    pub async fn get(&self, app_id: &str) -> Option<CachedToken> {
        let tokens = self.tokens.lock().await;
        tokens
            .get(app_id)
            .and_then(|t| (t.expires_at > Utc::now()).then(|| t.clone()))
    }

    pub async fn put(&self, app_id: &str, token: CachedToken) {
        self.tokens.lock().await.insert(app_id.to_string(), token);
    }

    pub async fn evict(&self, app_id: &str) {
        self.tokens.lock().await.remove(app_id);
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_token_is_returned_stale_token_is_not() {
        let cache = TokenCache::new();
        cache
            .put(
                "app-1",
                CachedToken { token: "tok".to_string(), expires_at: Utc::now() + chrono::Duration::minutes(5) },
            )
            .await;
        assert!(cache.get("app-1").await.is_some());

        cache
            .put(
                "app-2",
                CachedToken { token: "expired".to_string(), expires_at: Utc::now() - chrono::Duration::seconds(1) },
            )
            .await;
        assert!(cache.get("app-2").await.is_none());
    }

    #[tokio::test]
    async fn evict_removes_a_cached_token() {
        let cache = TokenCache::new();
        cache
            .put("app-1", CachedToken { token: "tok".to_string(), expires_at: Utc::now() + chrono::Duration::minutes(5) })
            .await;
        cache.evict("app-1").await;
        assert!(cache.get("app-1").await.is_none());
    }
}
