use std::sync::Arc;

use clap::Parser;
use listing_hunter::cache::{ItemCache, MetalPriceCache, RejectionCache};
use listing_hunter::credentials::CredentialPool;
use listing_hunter::health::{self, HealthState};
use listing_hunter::notify::Notifier;
use listing_hunter::processor::TaskProcessor;
use listing_hunter::scheduler::Scheduler;
use listing_hunter::store::{BackingStore, SupabaseStore};
use listing_hunter::upstream::UpstreamClient;
use listing_hunter::{Cli, Config};
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Info)
    };
    builder
        .filter(None, global_level)
        .filter(Some("listing_hunter"), my_code_level)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| {
        log::error!("configuration error: {e}");
        e
    })?;

    let store: Arc<dyn BackingStore> = Arc::new(SupabaseStore::new(&config));

    let credentials_seed = store.load_credentials().await?;
    if credentials_seed.is_empty() {
        anyhow::bail!("no upstream credentials configured in settings.ebay_keys");
    }
    let credentials = CredentialPool::new(credentials_seed);

    let upstream = UpstreamClient::new(&config, credentials.clone(), Arc::clone(&store));
    let item_cache = ItemCache::new(Arc::clone(&store), config.item_cache_ttl);
    let rejection_cache = RejectionCache::new(Arc::clone(&store), config.rejection_ttl);
    let metal_prices = MetalPriceCache::new(Arc::clone(&store), config.metal_price_cache_ttl);
    let notifier = Notifier::new(config.slack_webhook_url.clone());

    let processor = Arc::new(TaskProcessor::new(
        Arc::clone(&store),
        upstream,
        credentials,
        item_cache,
        rejection_cache,
        metal_prices,
        notifier,
        config.require_karat_markers,
    ));

    let health_state = Arc::new(Mutex::new(HealthState::new()));
    let health_router = health::router(Arc::clone(&health_state));
    let health_listener = tokio::net::TcpListener::bind(("0.0.0.0", config.health_port)).await?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(health_listener, health_router).await {
            log::error!("health server exited: {e}");
        }
    });

    let scheduler = Arc::new(Scheduler::new(&config, store, processor, health_state));
    scheduler.run(cli.once).await;

    Ok(())
}
