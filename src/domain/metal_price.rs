use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-metal, per-karat-or-purity price-per-gram row as read from the
/// `metal_prices` collection (read-only, spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetalPriceSnapshot {
    pub metal: String,
    /// Karat (gold, keyed "14", "18", ...) or purity (silver/platinum/
    /// palladium, keyed "925", "950", ...) to price-per-gram.
    pub price_per_gram: HashMap<String, f64>,
    pub updated_at: DateTime<Utc>,
}

/// The full set of current metal prices, as the in-process 1h cache
/// holds it (spec §3, §4.7).
#[derive(Debug, Clone, Default)]
pub struct MetalPriceTable {
    pub snapshots: HashMap<String, MetalPriceSnapshot>,
}

impl MetalPriceTable {
    pub fn price_per_gram(&self, metal: &str, purity_key: &str) -> Option<f64> {
        self.snapshots
            .get(&metal.to_ascii_lowercase())
            .and_then(|s| s.price_per_gram.get(purity_key))
            .copied()
    }
}
