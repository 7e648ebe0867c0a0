//! Process configuration: environment-derived runtime settings plus the
//! data tables (`constants`) and scalar newtypes (`types`) the rest of
//! the crate is built on.

pub mod constants;
pub mod types;

use std::time::Duration;

use clap::Parser;

pub use types::{Grams, Karat, Money, Score};

/// CLI surface. Everything else comes from the environment so the worker
/// can run unattended under a process supervisor; the flags here are for
/// local/manual invocation.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run a single scheduler tick and exit instead of looping forever.
    #[arg(long, default_value_t = false)]
    pub once: bool,
}

/// Fully resolved runtime configuration, loaded once at startup from the
/// process environment. Construction fails loudly (spec §7 "Configuration
/// fatal") when a required variable is absent.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_service_role_key: String,

    pub main_loop_interval: Duration,
    pub max_concurrent_tasks: usize,
    pub stagger_delay: Duration,
    pub ebay_daily_limit: u32,
    pub health_port: u16,
    pub slack_webhook_url: Option<String>,

    pub require_karat_markers: bool,
    pub item_cache_ttl: Duration,
    pub rejection_ttl: Duration,
    pub metal_price_cache_ttl: Duration,

    pub upstream_search_timeout: Duration,
    pub upstream_bulk_timeout: Duration,
    pub upstream_token_timeout: Duration,

    pub shutdown_grace: Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingRequired(&'static str),
    #[error("invalid value for environment variable {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Config {
    /// Load configuration from the process environment, applying the
    /// defaults documented in spec §6 for anything not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = required_env("SUPABASE_URL")?;
        let supabase_service_role_key = required_env("SUPABASE_SERVICE_ROLE_KEY")?;

        Ok(Self {
            supabase_url,
            supabase_service_role_key,
            main_loop_interval: Duration::from_secs(env_u64(
                "MAIN_LOOP_INTERVAL",
                constants::MAIN_LOOP_INTERVAL_DEFAULT_S,
            )?),
            max_concurrent_tasks: env_u64(
                "MAX_CONCURRENT_TASKS",
                constants::MAX_CONCURRENT_TASKS_DEFAULT as u64,
            )? as usize,
            stagger_delay: Duration::from_millis(env_u64(
                "STAGGER_DELAY",
                constants::STAGGER_DELAY_DEFAULT_MS,
            )?),
            ebay_daily_limit: env_u64(
                "EBAY_DAILY_LIMIT",
                constants::EBAY_DAILY_LIMIT_DEFAULT as u64,
            )? as u32,
            health_port: env_u64("HEALTH_PORT", constants::HEALTH_PORT_DEFAULT as u64)? as u16,
            slack_webhook_url: std::env::var("SLACK_WEBHOOK_URL").ok().filter(|s| !s.is_empty()),

            require_karat_markers: env_bool("REQUIRE_KARAT_MARKERS", false)?,
            item_cache_ttl: Duration::from_secs(env_u64(
                "ITEM_CACHE_TTL_S",
                constants::ITEM_CACHE_TTL.as_secs(),
            )?),
            rejection_ttl: Duration::from_secs(env_u64(
                "REJECTION_TTL_S",
                constants::REJECTION_TTL.as_secs(),
            )?),
            metal_price_cache_ttl: Duration::from_secs(env_u64(
                "METAL_PRICE_CACHE_TTL_S",
                constants::METAL_PRICE_CACHE_TTL.as_secs(),
            )?),

            upstream_search_timeout: Duration::from_secs(env_u64("UPSTREAM_SEARCH_TIMEOUT_S", 30)?),
            upstream_bulk_timeout: Duration::from_secs(env_u64("UPSTREAM_BULK_TIMEOUT_S", 30)?),
            upstream_token_timeout: Duration::from_secs(env_u64("UPSTREAM_TOKEN_TIMEOUT_S", 10)?),

            shutdown_grace: Duration::from_millis(env_u64("SHUTDOWN_GRACE_MS", 2000)?),
        })
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingRequired(name))
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => v.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            name,
            value: v,
            reason: "expected an integer",
        }),
        _ => Ok(default),
    }
}

fn env_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name,
                value: v,
                reason: "expected a boolean (true/false/1/0)",
            }),
        },
        _ => Ok(default),
    }
}
