use serde::{Deserialize, Serialize};

/// A single name/value item specific, as returned under
/// `localizedAspects` by the upstream item endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSpecific {
    pub name: String,
    pub value: String,
}

/// One row of an `itemSummaries` search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item_id: String,
    pub title: String,
    pub item_web_url: String,
    pub price_value: f64,
    pub currency: String,
    #[serde(default)]
    pub shipping_cost: f64,
    pub buying_options: Vec<String>,
    pub category_id: Option<String>,
    pub condition: Option<String>,
    pub seller_feedback_score: Option<u32>,
    pub item_creation_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// The decoded per-item detail document, whether freshly fetched or
/// reconstituted from the item-detail cache (spec §4.4: on cache hit the
/// synthetic record carries only `localized_aspects`, `title`, and the
/// `from_cache` marker).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDetail {
    pub item_id: String,
    pub title: String,
    pub description: Option<String>,
    pub item_specifics: Vec<ItemSpecific>,
    #[serde(default)]
    pub from_cache: bool,
}

impl ItemDetail {
    pub fn specific(&self, name: &str) -> Option<&str> {
        let needle = name.to_ascii_lowercase();
        self.item_specifics
            .iter()
            .find(|s| s.name.to_ascii_lowercase() == needle)
            .map(|s| s.value.as_str())
    }

    /// First specific whose (lowercased) name contains any of `needles`.
    pub fn specific_matching(&self, needles: &[&str]) -> Option<&str> {
        self.item_specifics.iter().find_map(|s| {
            let name = s.name.to_ascii_lowercase();
            needles
                .iter()
                .any(|n| name.contains(n))
                .then_some(s.value.as_str())
        })
    }

    /// All specifics' values space-joined, for extractors that scan
    /// across the whole specifics blob rather than one named field.
    pub fn specifics_joined(&self) -> String {
        self.item_specifics
            .iter()
            .map(|s| s.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
