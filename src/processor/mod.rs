//! C8: the per-task pipeline — search, bulk-enrich, classify, persist
//! (spec §4.5). One `TaskProcessor::process` call is one task invocation;
//! the scheduler is responsible for concurrency and re-entry guarding
//! between tasks.

mod errors;

pub use errors::ProcessError;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::cache::{ItemCache, MetalPriceCache, RejectionCache};
use crate::classify::{self, GemstoneOutcome, JewelryOutcome, WatchOutcome};
use crate::config::constants::{
    BULK_FETCH_BATCH_SIZE, GEMSTONE_CATEGORY_EXPANSIONS, JEWELRY_FIXED_EXCLUSIONS, KARAT_MARKERS,
    METAL_KEYWORDS, PRIORITY_WINDOW_MINUTES,
};
use crate::credentials::CredentialPool;
use crate::domain::{ItemDetail, ItemSummary, ItemType, Task, TaskFilters};
use crate::notify::Notifier;
use crate::store::BackingStore;
use crate::upstream::{queries_for, UpstreamClient};

pub struct TaskProcessor {
    store: Arc<dyn BackingStore>,
    upstream: UpstreamClient,
    credentials: CredentialPool,
    item_cache: ItemCache,
    rejection_cache: RejectionCache,
    metal_prices: MetalPriceCache,
    notifier: Notifier,
    require_karat_markers: bool,
}

struct Candidate {
    summary: ItemSummary,
}

/// Per-reason skip counters for one task's candidate-collection pass
/// (spec §4.5 step 5: "increment per-reason counters"). Reset fresh on
/// every `collect_candidates` call — nothing here persists across tasks.
#[derive(Default)]
struct CollectionStats {
    already_matched: u32,
    already_rejected: u32,
    category_mismatch: u32,
    price_out_of_range: u32,
    title_excluded: u32,
    missing_karat_marker: u32,
}

/// Cache-hit/miss counters for one task's enrichment pass (spec §4.5
/// Phase 1 step 1: "Reset per-task cache-stat counters").
#[derive(Default)]
struct CacheStats {
    hits: u32,
    misses: u32,
}

impl TaskProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn BackingStore>,
        upstream: UpstreamClient,
        credentials: CredentialPool,
        item_cache: ItemCache,
        rejection_cache: RejectionCache,
        metal_prices: MetalPriceCache,
        notifier: Notifier,
        require_karat_markers: bool,
    ) -> Self {
        Self {
            store,
            upstream,
            credentials,
            item_cache,
            rejection_cache,
            metal_prices,
            notifier,
            require_karat_markers,
        }
    }

    /// `(calls_today, calls_remaining)` against the process-wide daily
    /// cap, surfaced by the health endpoint (spec §6).
    pub async fn api_usage(&self) -> (u32, u32) {
        (
            self.upstream.governor.calls_today().await,
            self.upstream.governor.remaining().await,
        )
    }

    pub async fn process(&self, task: &Task) -> Result<(), ProcessError> {
        let (candidates, collection_stats) = self.collect_candidates(task).await?;
        log::debug!("task {}: {} candidates after pre-filter", task.id, candidates.len());

        let cache_stats = match &task.filters {
            TaskFilters::Jewelry(filters) => {
                let (details, cache_stats) = self.enrich(task, &candidates).await?;
                let prices = self.metal_prices.get().await?;
                for candidate in &candidates {
                    let Some(detail) = details.get(&candidate.summary.item_id) else {
                        continue;
                    };
                    match classify::classify_jewelry(
                        task,
                        filters,
                        &candidate.summary,
                        detail,
                        &prices,
                        self.require_karat_markers,
                    ) {
                        JewelryOutcome::Matched(m) => {
                            if self.store.insert_jewelry_match(&m).await? {
                                self.notifier.notify_jewelry_match(&m).await;
                            }
                        }
                        JewelryOutcome::Rejected(reason) => {
                            self.rejection_cache
                                .reject(&task.id, &candidate.summary.item_id, reason)
                                .await?;
                        }
                    }
                }
                Some(cache_stats)
            }
            TaskFilters::Watch(filters) => {
                for candidate in &candidates {
                    match classify::classify_watch(task, filters, &candidate.summary) {
                        WatchOutcome::Matched(m) => {
                            let _ = self.store.insert_watch_match(&m).await?;
                        }
                        WatchOutcome::Rejected(reason) => {
                            self.rejection_cache
                                .reject(&task.id, &candidate.summary.item_id, reason)
                                .await?;
                        }
                    }
                }
                None
            }
            TaskFilters::Gemstone(filters) => {
                let (details, cache_stats) = self.enrich(task, &candidates).await?;
                for candidate in &candidates {
                    let Some(detail) = details.get(&candidate.summary.item_id) else {
                        continue;
                    };
                    match classify::classify_gemstone(task, filters, &candidate.summary, detail) {
                        GemstoneOutcome::Matched(m) => {
                            if self.store.insert_gemstone_match(&m).await? {
                                self.notifier.notify_gemstone_match(&m).await;
                            }
                        }
                        GemstoneOutcome::Rejected(reason) => {
                            self.rejection_cache
                                .reject(&task.id, &candidate.summary.item_id, reason)
                                .await?;
                        }
                    }
                }
                Some(cache_stats)
            }
        };

        self.store.update_task_last_run(&task.id, Utc::now()).await?;

        // Spec §4.5 Phase 3 closeout: "Log aggregate skip counts and
        // cache-hit stats." Watch tasks never call `enrich`, so there is
        // no cache stat line for them — logged as 0/0 rather than omitted,
        // so the line shape is uniform across item kinds.
        let (cache_hits, cache_misses) = cache_stats.map(|c| (c.hits, c.misses)).unwrap_or((0, 0));
        log::info!(
            "task {}: candidates={} skipped(matched={}, rejected={}, category={}, price={}, title={}, karat_marker={}) cache(hits={}, misses={})",
            task.id,
            candidates.len(),
            collection_stats.already_matched,
            collection_stats.already_rejected,
            collection_stats.category_mismatch,
            collection_stats.price_out_of_range,
            collection_stats.title_excluded,
            collection_stats.missing_karat_marker,
            cache_hits,
            cache_misses,
        );
        Ok(())
    }

    /// Phase 1: search, union, skip-set filter, priority re-sort. Tracks
    /// per-reason skip counts as it goes (spec §4.5 step 5).
    async fn collect_candidates(
        &self,
        task: &Task,
    ) -> Result<(Vec<Candidate>, CollectionStats), ProcessError> {
        let queries = queries_for(task);

        let mut by_id: HashMap<String, ItemSummary> = HashMap::new();
        for query in &queries {
            // Every API call obtains a fresh credential from the pool;
            // tasks do not own one across calls (spec §4.4).
            let credential = self.credentials.next(None).await?;
            let results = match self.upstream.search(query, &credential).await {
                Ok(results) => results,
                Err(e) => return Err(self.handle_upstream_error(e, &credential.app_id).await),
            };
            for item in results {
                by_id.entry(item.item_id.clone()).or_insert(item);
            }
        }

        let item_type = task.item_type();
        let matched_ids = self.store.existing_match_ids(item_type, &task.id).await?;
        let rejected_ids = self.rejection_cache.live_ids(&task.id).await?;
        let exclusions = exclusion_keywords(task, item_type);

        let mut stats = CollectionStats::default();
        let mut survivors = Vec::new();
        for summary in by_id.into_values() {
            if matched_ids.contains(&summary.item_id) {
                stats.already_matched += 1;
                continue;
            }
            if rejected_ids.contains(&summary.item_id) {
                stats.already_rejected += 1;
                continue;
            }
            if !category_allowed(&summary, task, item_type) {
                stats.category_mismatch += 1;
                continue;
            }
            if !price_in_range(&summary, task) {
                stats.price_out_of_range += 1;
                continue;
            }
            if title_excluded(&summary.title, &exclusions) {
                stats.title_excluded += 1;
                continue;
            }
            if requires_missing_karat_marker(&summary, task, item_type, self.require_karat_markers) {
                stats.missing_karat_marker += 1;
                continue;
            }
            survivors.push(summary);
        }

        survivors.sort_by(priority_key);

        log::debug!(
            "task {}: skip counts matched={} rejected={} category={} price={} title={} karat_marker={}",
            task.id,
            stats.already_matched,
            stats.already_rejected,
            stats.category_mismatch,
            stats.price_out_of_range,
            stats.title_excluded,
            stats.missing_karat_marker,
        );

        let candidates = survivors.into_iter().map(|summary| Candidate { summary }).collect();
        Ok((candidates, stats))
    }

    /// Phase 2: bulk-fetch with per-batch 403 fallback, cache read-through.
    /// Tracks item-cache hit/miss counts as it goes (spec §4.5 Phase 1
    /// step 1 / Phase 3 closeout).
    async fn enrich(
        &self,
        task: &Task,
        candidates: &[Candidate],
    ) -> Result<(HashMap<String, ItemDetail>, CacheStats), ProcessError> {
        let truncated: Vec<&Candidate> = match task.max_detail_fetches {
            0 => candidates.iter().collect(),
            n => candidates.iter().take(n as usize).collect(),
        };

        let mut details = HashMap::new();
        let mut uncached_ids = Vec::new();
        let mut cache_stats = CacheStats::default();
        for candidate in &truncated {
            if let Some(cached) = self.item_cache.get(&candidate.summary.item_id).await? {
                cache_stats.hits += 1;
                details.insert(candidate.summary.item_id.clone(), cached);
            } else {
                cache_stats.misses += 1;
                uncached_ids.push(candidate.summary.item_id.clone());
            }
        }

        for batch in uncached_ids.chunks(BULK_FETCH_BATCH_SIZE) {
            let credential = self.credentials.next(None).await?;
            match self.upstream.fetch_many(batch, &credential).await {
                Ok(fetched) => {
                    for detail in fetched {
                        let _ = self.item_cache.put(&detail).await;
                        details.insert(detail.item_id.clone(), detail);
                    }
                }
                Err(crate::upstream::UpstreamError::BulkNotAuthorizedError) => {
                    for id in batch {
                        match self.upstream.fetch_one(id, &credential).await {
                            Ok(detail) => {
                                let _ = self.item_cache.put(&detail).await;
                                details.insert(detail.item_id.clone(), detail);
                            }
                            Err(e) => {
                                self.apply_credential_side_effects(&e, &credential.app_id).await;
                                log::warn!("task {}: per-item fetch failed for {id}: {e}", task.id);
                            }
                        }
                    }
                }
                Err(e @ crate::upstream::UpstreamError::RateLimitError { .. }) => {
                    return Err(self.handle_upstream_error(e, &credential.app_id).await);
                }
                Err(e) => {
                    self.apply_credential_side_effects(&e, &credential.app_id).await;
                    log::warn!("task {}: bulk fetch failed for batch: {e}", task.id);
                }
            }
        }

        log::debug!(
            "task {}: item-cache hits={} misses={}",
            task.id,
            cache_stats.hits,
            cache_stats.misses,
        );

        Ok((details, cache_stats))
    }

    /// Applies the credential-pool transition the error taxonomy implies
    /// (spec §4.2/§4.3/§7): 429 cools the credential down, 401 disables
    /// it persistently. Other variants carry no credential-pool effect.
    async fn apply_credential_side_effects(&self, error: &crate::upstream::UpstreamError, app_id: &str) {
        match error {
            crate::upstream::UpstreamError::RateLimitError { .. } => {
                self.credentials.mark_cooldown(app_id).await;
            }
            crate::upstream::UpstreamError::AuthError { .. } => {
                self.credentials.mark_error(self.store.as_ref(), app_id).await;
            }
            _ => {}
        }
    }

    /// Applies the credential-pool side effect for a terminal error and
    /// converts it to the `ProcessError` variant that tells the scheduler
    /// whether this was a rate-limit abort (retried on the next due tick)
    /// or an ordinary failure.
    async fn handle_upstream_error(
        &self,
        error: crate::upstream::UpstreamError,
        app_id: &str,
    ) -> ProcessError {
        self.apply_credential_side_effects(&error, app_id).await;
        if matches!(error, crate::upstream::UpstreamError::RateLimitError { .. }) {
            ProcessError::RateLimited(error)
        } else {
            ProcessError::Upstream(error)
        }
    }
}

/// Category mismatch pre-filter (spec §4.5 step 5). An empty
/// `allowed_category_ids` means the task imposes no restriction.
/// Gemstone tasks additionally accept any child of a known parent
/// category via `GEMSTONE_CATEGORY_EXPANSIONS`.
fn category_allowed(summary: &ItemSummary, task: &Task, item_type: ItemType) -> bool {
    if task.allowed_category_ids.is_empty() {
        return true;
    }
    let Some(category_id) = &summary.category_id else {
        return false;
    };
    if task.allowed_category_ids.iter().any(|c| c == category_id) {
        return true;
    }
    if item_type == ItemType::Gemstone {
        return task.allowed_category_ids.iter().any(|allowed| {
            GEMSTONE_CATEGORY_EXPANSIONS
                .iter()
                .any(|(parent, children)| parent == allowed && children.contains(&category_id.as_str()))
        });
    }
    false
}

fn price_in_range(summary: &ItemSummary, task: &Task) -> bool {
    summary.price_value >= *task.min_price && summary.price_value <= *task.max_price
}

/// Builds the full exclusion-keyword set for one task (spec §4.5 step 2):
/// the task's own `exclude_keywords`, plus — for jewelry tasks only — the
/// fixed costume/fashion/tool blacklist and the dynamically-generated
/// unselected-metal keywords.
fn exclusion_keywords(task: &Task, item_type: ItemType) -> Vec<String> {
    let mut keywords: Vec<String> = task
        .exclude_keywords
        .iter()
        .map(|k| k.to_ascii_lowercase())
        .collect();

    if item_type == ItemType::Jewelry {
        keywords.extend(JEWELRY_FIXED_EXCLUSIONS.iter().map(|s| s.to_string()));
        if let Some(filters) = task.filters.as_jewelry() {
            keywords.extend(unselected_metal_exclusions(filters));
        }
    }

    keywords
}

/// `METAL_KEYWORDS` minus the metals a jewelry task actually selected,
/// with "silver" always skipped to avoid over-blocking mixed-metal
/// listings (spec §4.5 step 2).
fn unselected_metal_exclusions(filters: &crate::domain::JewelryFilters) -> Vec<String> {
    let selected: Vec<String> = filters.metals.iter().map(|m| m.to_ascii_lowercase()).collect();
    METAL_KEYWORDS
        .iter()
        .filter(|m| **m != "silver")
        .filter(|m| !selected.iter().any(|s| s == *m))
        .map(|m| m.to_string())
        .collect()
}

fn title_excluded(title: &str, exclusions: &[String]) -> bool {
    let lower = title.to_ascii_lowercase();
    exclusions.iter().any(|kw| lower.contains(kw.as_str()))
}

fn requires_missing_karat_marker(
    summary: &ItemSummary,
    task: &Task,
    item_type: ItemType,
    require_karat_markers: bool,
) -> bool {
    if item_type != ItemType::Jewelry || !require_karat_markers {
        return false;
    }
    let Some(filters) = task.filters.as_jewelry() else {
        return false;
    };
    let gold_selected = filters.metals.is_empty() || filters.metals.iter().any(|m| m.eq_ignore_ascii_case("gold"));
    if !gold_selected {
        return false;
    }
    let lower = summary.title.to_ascii_lowercase();
    !KARAT_MARKERS.iter().any(|m| lower.contains(m))
}


fn priority_key(a: &ItemSummary, b: &ItemSummary) -> std::cmp::Ordering {
    let now = Utc::now();
    let window = chrono::Duration::minutes(PRIORITY_WINDOW_MINUTES);
    let is_fresh = |s: &ItemSummary| {
        s.item_creation_date
            .map(|d| now.signed_duration_since(d) <= window)
            .unwrap_or(false)
    };
    match (is_fresh(a), is_fresh(b)) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => b.item_creation_date.cmp(&a.item_creation_date),
    }
}
