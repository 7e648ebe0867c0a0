//! `GET /health` (spec §6 "Health endpoint"). Trivial by design — the
//! backing store is the real surface for results, this just tells an
//! external supervisor the process is alive and what its last tick did.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct HealthState {
    pub shutting_down: bool,
    pub started_at: DateTime<Utc>,
    pub last_poll: Option<DateTime<Utc>>,
    pub last_poll_status: String,
    pub api_calls_today: u32,
    pub api_calls_remaining: u32,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            shutting_down: false,
            started_at: Utc::now(),
            last_poll: None,
            last_poll_status: "starting".to_string(),
            api_calls_today: 0,
            api_calls_remaining: 0,
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime: i64,
    #[serde(rename = "lastPoll")]
    last_poll: Option<DateTime<Utc>>,
    #[serde(rename = "lastPollStatus")]
    last_poll_status: String,
    #[serde(rename = "apiCallsToday")]
    api_calls_today: u32,
    #[serde(rename = "apiCallsRemaining")]
    api_calls_remaining: u32,
    timestamp: DateTime<Utc>,
}

pub fn router(state: Arc<Mutex<HealthState>>) -> Router {
    Router::new().route("/health", get(move || handler(state.clone())))
}

async fn handler(state: Arc<Mutex<HealthState>>) -> Json<HealthResponse> {
    let state = state.lock().await;
    let now = Utc::now();
    Json(HealthResponse {
        status: if state.shutting_down { "shutting_down" } else { "healthy" },
        uptime: now.signed_duration_since(state.started_at).num_seconds(),
        last_poll: state.last_poll,
        last_poll_status: state.last_poll_status.clone(),
        api_calls_today: state.api_calls_today,
        api_calls_remaining: state.api_calls_remaining,
        timestamp: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_healthy_until_shutdown_is_flagged() {
        let state = Arc::new(Mutex::new(HealthState::new()));
        let body = handler(Arc::clone(&state)).await.0;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.api_calls_today, 0);

        state.lock().await.shutting_down = true;
        let body = handler(state).await.0;
        assert_eq!(body.status, "shutting_down");
    }

    #[tokio::test]
    async fn surfaces_the_latest_poll_status_and_api_usage() {
        let state = Arc::new(Mutex::new(HealthState::new()));
        {
            let mut guard = state.lock().await;
            guard.last_poll_status = "success".to_string();
            guard.api_calls_today = 42;
            guard.api_calls_remaining = 4458;
        }
        let body = handler(state).await.0;
        assert_eq!(body.last_poll_status, "success");
        assert_eq!(body.api_calls_today, 42);
        assert_eq!(body.api_calls_remaining, 4458);
    }
}
