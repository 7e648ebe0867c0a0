use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Grams, Karat, Money, Score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    New,
    Reviewed,
    Offered,
    Purchased,
    Passed,
}

/// Fields common to every match kind (spec §3). Each kind-specific
/// struct embeds this via `#[serde(flatten)]` so the three
/// `matches_{jewelry,watch,gemstone}` payloads all carry it identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCommon {
    pub task_id: String,
    pub user_id: String,
    pub ebay_listing_id: String,
    pub ebay_title: String,
    pub ebay_url: String,
    pub listed_price: Money,
    pub shipping_cost: Money,
    pub currency: String,
    pub buy_format: String,
    pub seller_feedback: Option<u32>,
    pub found_at: DateTime<Utc>,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JewelryMatch {
    #[serde(flatten)]
    pub common: MatchCommon,
    pub metal_type: String,
    pub karat: Option<u8>,
    pub weight_g: Grams,
    pub melt_value: Money,
    pub profit_scrap: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchMatch {
    #[serde(flatten)]
    pub common: MatchCommon,
    pub case_material: Option<String>,
    pub band_material: Option<String>,
    pub movement: Option<String>,
    pub dial_colour: Option<String>,
    pub year_manufactured: Option<u16>,
    pub brand: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemstoneMatch {
    #[serde(flatten)]
    pub common: MatchCommon,
    pub stone_type: Option<String>,
    pub shape: Option<String>,
    pub carat: Option<f64>,
    pub colour: Option<String>,
    pub clarity: Option<String>,
    pub cut_grade: Option<String>,
    pub cert_lab: Option<String>,
    pub treatment: Option<String>,
    pub is_natural: Option<bool>,
    pub classification: String,
    pub deal_score: Score,
    pub risk_score: Score,
    pub ai_score: f64,
    pub ai_reasoning: String,
}

impl JewelryMatch {
    pub fn karat_typed(&self) -> Option<Karat> {
        self.karat.and_then(Karat::from_raw)
    }
}
