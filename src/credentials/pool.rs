use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::constants::CREDENTIAL_COOLDOWN;
use crate::domain::{Credential, CredentialStatus};
use crate::store::BackingStore;

use super::errors::CredentialError;
use super::token_cache::TokenCache;

struct PoolState {
    credentials: Vec<Credential>,
    /// Lazily-expired cooldown deadlines, keyed by `app_id`. Entries are
    /// removed on read once expired (spec §4.2 "remove-on-read").
    cooldowns: HashMap<String, Instant>,
    /// Advances by one per `next()` call; wraps modulo the usable subset
    /// size *at call time*, which is what gives the fairness-over-time
    /// (not strict-FIFO) guarantee spec §4.2/§8 describes.
    rotation_index: usize,
}

/// C2 + C4: the credential pool and the process-wide rate governor it
/// embeds. Round-robins over the non-cooled, non-errored subset; applies
/// 5-minute cooldowns on 429; marks credentials `error` (sticky, only a
/// human can clear it) on 401.
#[derive(Clone)]
pub struct CredentialPool {
    state: Arc<Mutex<PoolState>>,
    pub token_cache: Arc<TokenCache>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PoolState {
                credentials,
                cooldowns: HashMap::new(),
                rotation_index: 0,
            })),
            token_cache: Arc::new(TokenCache::new()),
        }
    }

    /// Returns a usable credential via round-robin, optionally excluding
    /// one app_id (spec §4.2 "retry on a different key").
    pub async fn next(&self, exclude: Option<&str>) -> Result<Credential, CredentialError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        // Remove-on-read: drop any cooldown entries that have expired.
        state.cooldowns.retain(|_, expiry| *expiry > now);

        let any_enabled = state.credentials.iter().any(|c| c.is_enabled());
        if !any_enabled {
            return Err(CredentialError::NoneUsable);
        }

        let usable: Vec<Credential> = state
            .credentials
            .iter()
            .filter(|c| c.is_enabled() && !state.cooldowns.contains_key(&c.app_id))
            .filter(|c| exclude.map(|ex| ex != c.app_id).unwrap_or(true))
            .cloned()
            .collect();

        if usable.is_empty() {
            let earliest = state
                .cooldowns
                .values()
                .map(|expiry| expiry.saturating_duration_since(now))
                .min()
                .unwrap_or(CREDENTIAL_COOLDOWN);
            return Err(CredentialError::AllCooled(earliest.as_secs()));
        }

        let idx = state.rotation_index % usable.len();
        state.rotation_index = state.rotation_index.wrapping_add(1);
        Ok(usable[idx].clone())
    }

    /// Puts a credential into cooldown for `CREDENTIAL_COOLDOWN` following
    /// a 429 response (spec §4.2).
    pub async fn mark_cooldown(&self, app_id: &str) {
        let mut state = self.state.lock().await;
        state
            .cooldowns
            .insert(app_id.to_string(), Instant::now() + CREDENTIAL_COOLDOWN);
    }

    pub async fn mark_cooldown_for(&self, app_id: &str, duration: Duration) {
        let mut state = self.state.lock().await;
        state
            .cooldowns
            .insert(app_id.to_string(), Instant::now() + duration);
    }

    /// Persistently disables a credential following a 401 on token
    /// acquisition and evicts any cached token (spec §4.2, §4.3).
    pub async fn mark_error(&self, store: &dyn BackingStore, app_id: &str) {
        {
            let mut state = self.state.lock().await;
            if let Some(cred) = state.credentials.iter_mut().find(|c| c.app_id == app_id) {
                cred.status = CredentialStatus::Error;
            }
        }
        self.token_cache.evict(app_id).await;
        if let Err(err) = store.update_credential_status(app_id, CredentialStatus::Error).await {
            log::warn!("failed to persist credential error status for {app_id}: {err}");
        }
    }

    /// Bumps the in-memory `calls_today` counter for `app_id` and returns
    /// the new value, for the caller to persist via
    /// `BackingStore::record_credential_usage` (spec §4.2: observability
    /// only, does not gate anything at runtime).
    pub async fn record_usage(&self, app_id: &str) -> Option<u32> {
        let mut state = self.state.lock().await;
        let cred = state.credentials.iter_mut().find(|c| c.app_id == app_id)?;
        cred.calls_today = cred.calls_today.saturating_add(1);
        Some(cred.calls_today)
    }

    pub async fn usable_count(&self) -> usize {
        let state = self.state.lock().await;
        let now = Instant::now();
        state
            .credentials
            .iter()
            .filter(|c| c.is_enabled())
            .filter(|c| state.cooldowns.get(&c.app_id).map(|e| *e <= now).unwrap_or(true))
            .count()
    }

    pub async fn snapshot(&self) -> Vec<Credential> {
        self.state.lock().await.credentials.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(app_id: &str) -> Credential {
        Credential {
            app_id: app_id.to_string(),
            dev_id: "dev".into(),
            cert_id: "cert".into(),
            label: app_id.to_string(),
            status: CredentialStatus::Ok,
            calls_today: 0,
            calls_reset_date: None,
        }
    }

    #[tokio::test]
    async fn round_robin_covers_all_keys_fairly() {
        let pool = CredentialPool::new(vec![cred("A"), cred("B")]);
        let mut counts = HashMap::new();
        for _ in 0..9 {
            let c = pool.next(None).await.unwrap();
            *counts.entry(c.app_id).or_insert(0) += 1;
        }
        // k=9, n=2 => each key served between floor(9/2)=4 and ceil(9/2)=5 times.
        for count in counts.values() {
            assert!(*count >= 4 && *count <= 5);
        }
        assert_eq!(counts.values().sum::<i32>(), 9);
    }

    #[tokio::test]
    async fn cooldown_removes_key_until_expiry() {
        let pool = CredentialPool::new(vec![cred("A")]);
        pool.mark_cooldown_for("A", Duration::from_millis(20)).await;
        let err = pool.next(None).await.unwrap_err();
        assert!(matches!(err, CredentialError::AllCooled(_)));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(pool.next(None).await.is_ok());
    }

    #[tokio::test]
    async fn all_disabled_is_a_distinct_error() {
        let mut c = cred("A");
        c.status = CredentialStatus::Error;
        let pool = CredentialPool::new(vec![c]);
        assert!(matches!(pool.next(None).await, Err(CredentialError::NoneUsable)));
    }

    #[tokio::test]
    async fn record_usage_increments_the_named_credential_only() {
        let pool = CredentialPool::new(vec![cred("A"), cred("B")]);
        assert_eq!(pool.record_usage("A").await, Some(1));
        assert_eq!(pool.record_usage("A").await, Some(2));
        let snapshot = pool.snapshot().await;
        let a = snapshot.iter().find(|c| c.app_id == "A").unwrap();
        let b = snapshot.iter().find(|c| c.app_id == "B").unwrap();
        assert_eq!(a.calls_today, 2);
        assert_eq!(b.calls_today, 0);
    }

    #[tokio::test]
    async fn record_usage_on_unknown_app_id_returns_none() {
        let pool = CredentialPool::new(vec![cred("A")]);
        assert_eq!(pool.record_usage("ghost").await, None);
    }
}
