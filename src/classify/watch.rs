use crate::config::Money;
use crate::domain::{ItemSummary, MatchCommon, MatchStatus, Task, WatchFilters, WatchMatch};

use super::extractors::{
    extract_watch_band_material, extract_watch_case_material, extract_watch_dial_color,
    extract_watch_model, extract_watch_movement, extract_year,
};

pub enum WatchOutcome {
    Matched(Box<WatchMatch>),
    Rejected(String),
}

/// Watches are enriched opportunistically from the summary title alone
/// (spec §4.5 "Watch": "no detail fetch unless needed").
pub fn classify(task: &Task, filters: &WatchFilters, summary: &ItemSummary) -> WatchOutcome {
    let title = &summary.title;
    let case_material = extract_watch_case_material(title).map(str::to_string);
    let band_material = extract_watch_band_material(title).map(str::to_string);
    let movement = extract_watch_movement(title).map(str::to_string);
    let dial_colour = extract_watch_dial_color(title).map(str::to_string);
    let year_manufactured = extract_year(title);
    let model = extract_watch_model(title);

    if !filters.case_materials.is_empty() {
        let matches_case = case_material
            .as_deref()
            .map(|cm| filters.case_materials.iter().any(|f| f.eq_ignore_ascii_case(cm)))
            .unwrap_or(false);
        if !matches_case {
            return WatchOutcome::Rejected("Case material not in selected set".to_string());
        }
    }

    if let (Some(year), Some(min)) = (year_manufactured, filters.year_min) {
        if year < min {
            return WatchOutcome::Rejected("Year below minimum".to_string());
        }
    }
    if let (Some(year), Some(max)) = (year_manufactured, filters.year_max) {
        if year > max {
            return WatchOutcome::Rejected("Year above maximum".to_string());
        }
    }

    if !filters.brands.is_empty()
        && !filters
            .brands
            .iter()
            .any(|b| title.to_ascii_lowercase().contains(&b.to_ascii_lowercase()))
    {
        return WatchOutcome::Rejected("Brand not in selected set".to_string());
    }

    let brand = filters
        .brands
        .iter()
        .find(|b| title.to_ascii_lowercase().contains(&b.to_ascii_lowercase()))
        .cloned();

    let common = MatchCommon {
        task_id: task.id.clone(),
        user_id: task.user_id.clone(),
        ebay_listing_id: summary.item_id.clone(),
        ebay_title: summary.title.clone(),
        ebay_url: summary.item_web_url.clone(),
        listed_price: Money::new(summary.price_value),
        shipping_cost: Money::new(summary.shipping_cost),
        currency: summary.currency.clone(),
        buy_format: summary.buying_options.first().cloned().unwrap_or_default(),
        seller_feedback: summary.seller_feedback_score,
        found_at: chrono::Utc::now(),
        status: MatchStatus::New,
    };

    WatchOutcome::Matched(Box::new(WatchMatch {
        common,
        case_material,
        band_material,
        movement,
        dial_colour,
        year_manufactured,
        brand,
        model,
    }))
}
