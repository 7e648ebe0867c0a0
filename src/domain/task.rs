use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Jewelry,
    Watch,
    Gemstone,
}

/// Jewelry-specific filter sub-record (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JewelryFilters {
    #[serde(default)]
    pub metals: Vec<String>,
    #[serde(default)]
    pub purities: Vec<String>,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub eras: Vec<String>,
    #[serde(default)]
    pub setting_styles: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub weight_min_g: Option<f64>,
    pub weight_max_g: Option<f64>,
}

/// Watch-specific filter sub-record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchFilters {
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub case_materials: Vec<String>,
    pub year_min: Option<u16>,
    pub year_max: Option<u16>,
}

/// Gemstone-specific filter sub-record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GemstoneFilters {
    #[serde(default)]
    pub stone_types: Vec<String>,
    #[serde(default)]
    pub shapes: Vec<String>,
    pub carat_min: Option<f64>,
    pub carat_max: Option<f64>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub clarities: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub treatments_allowed: Vec<String>,
    #[serde(default)]
    pub natural_only: bool,
    #[serde(default)]
    pub include_jewelry: bool,
    #[serde(default)]
    pub min_deal_score: u8,
    #[serde(default = "default_max_risk_score")]
    pub max_risk_score: u8,
}

fn default_max_risk_score() -> u8 {
    100
}

/// Exactly one of these is populated, selected by `Task::item_type`
/// (spec §3 invariant). Modelled as a sum type rather than three
/// independently-nullable fields so the invariant is structural.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum TaskFilters {
    Jewelry(JewelryFilters),
    Watch(WatchFilters),
    Gemstone(GemstoneFilters),
}

impl TaskFilters {
    pub fn item_type(&self) -> ItemType {
        match self {
            TaskFilters::Jewelry(_) => ItemType::Jewelry,
            TaskFilters::Watch(_) => ItemType::Watch,
            TaskFilters::Gemstone(_) => ItemType::Gemstone,
        }
    }

    pub fn as_jewelry(&self) -> Option<&JewelryFilters> {
        match self {
            TaskFilters::Jewelry(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_watch(&self) -> Option<&WatchFilters> {
        match self {
            TaskFilters::Watch(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_gemstone(&self) -> Option<&GemstoneFilters> {
        match self {
            TaskFilters::Gemstone(f) => Some(f),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    pub min_price: Money,
    pub max_price: Money,
    /// Allowed upstream category ids for this task. Empty means
    /// unrestricted. Gemstone tasks expand known parent categories to
    /// their recognised children (spec §4.5 step 5, `GEMSTONE_CATEGORY_EXPANSIONS`).
    #[serde(default)]
    pub allowed_category_ids: Vec<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_s: u64,
    pub last_run: Option<DateTime<Utc>>,
    /// 0 means unlimited (spec §3).
    #[serde(default)]
    pub max_detail_fetches: u32,
    #[serde(flatten)]
    pub filters: TaskFilters,
}

fn default_poll_interval() -> u64 {
    60
}

impl Task {
    pub fn item_type(&self) -> ItemType {
        self.filters.item_type()
    }

    /// Whether `(now - last_run) >= poll_interval_s` (spec §4.1 step 4).
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_run {
            None => true,
            Some(last) => {
                let elapsed = now.signed_duration_since(last).num_seconds().max(0) as u64;
                elapsed >= self.poll_interval_s
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Money;

    fn task(poll_interval_s: u64, last_run: Option<DateTime<Utc>>) -> Task {
        Task {
            id: "t".to_string(),
            user_id: "u".to_string(),
            name: "n".to_string(),
            status: TaskStatus::Active,
            exclude_keywords: vec![],
            min_price: Money::new(0.0),
            max_price: Money::new(1.0),
            allowed_category_ids: vec![],
            poll_interval_s,
            last_run,
            max_detail_fetches: 0,
            filters: TaskFilters::Watch(WatchFilters::default()),
        }
    }

    #[test]
    fn never_run_task_is_always_due() {
        assert!(task(60, None).is_due(Utc::now()));
    }

    #[test]
    fn recently_run_task_is_not_due() {
        let now = Utc::now();
        let t = task(60, Some(now));
        assert!(!t.is_due(now + chrono::Duration::seconds(30)));
        assert!(t.is_due(now + chrono::Duration::seconds(60)));
    }

    #[test]
    fn filters_report_their_item_type() {
        assert_eq!(TaskFilters::Jewelry(JewelryFilters::default()).item_type(), ItemType::Jewelry);
        assert_eq!(TaskFilters::Watch(WatchFilters::default()).item_type(), ItemType::Watch);
        assert_eq!(TaskFilters::Gemstone(GemstoneFilters::default()).item_type(), ItemType::Gemstone);
    }
}
