use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

/// C4: process-wide daily call counter, capped at `DAILY_LIMIT` (default
/// 4500, leaving buffer under the upstream's 5000/day). This cap is
/// advisory and applies regardless of credential rotation — it bounds
/// total process-level fetching, not any one credential (spec §4.2).
#[derive(Clone)]
pub struct RateGovernor {
    inner: Arc<Mutex<Inner>>,
    limit: u32,
}

struct Inner {
    calls_today: u32,
    reset_date: chrono::NaiveDate,
}

impl RateGovernor {
    pub fn new(limit: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                calls_today: 0,
                reset_date: Utc::now().date_naive(),
            })),
            limit,
        }
    }

    /// Checks whether another call may be attempted, resetting the
    /// counter first if wall-clock has crossed into a new day. Does not
    /// itself perform any call; callers must also invoke
    /// `record_call` once the call is actually made.
    pub async fn can_make_call(&self) -> bool {
        let mut inner = self.inner.lock().await;
        self.maybe_reset(&mut inner);
        inner.calls_today < self.limit
    }

    pub async fn record_call(&self) {
        let mut inner = self.inner.lock().await;
        self.maybe_reset(&mut inner);
        inner.calls_today = inner.calls_today.saturating_add(1);
    }

    pub async fn calls_today(&self) -> u32 {
        let mut inner = self.inner.lock().await;
        self.maybe_reset(&mut inner);
        inner.calls_today
    }

    pub async fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.calls_today().await)
    }

    fn maybe_reset(&self, inner: &mut Inner) {
        let today = Utc::now().date_naive();
        if today > inner.reset_date {
            inner.calls_today = 0;
            inner.reset_date = today;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_exceeds_daily_limit() {
        let gov = RateGovernor::new(3);
        for _ in 0..3 {
            assert!(gov.can_make_call().await);
            gov.record_call().await;
        }
        assert!(!gov.can_make_call().await);
        assert_eq!(gov.calls_today().await, 3);
    }
}
