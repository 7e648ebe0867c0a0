use crate::config::constants::GEMSTONE_CATEGORY_EXPANSIONS;
use crate::config::{Money, Score};
use crate::domain::{GemstoneFilters, GemstoneMatch, ItemDetail, ItemSummary, MatchCommon, MatchStatus, Task};

use super::extractors::{
    extract_carat, extract_cert_lab, extract_clarity, extract_color, extract_cut_grade,
    extract_stone_shape, extract_stone_type, extract_treatment, is_natural, is_simulant, CertTier,
    TreatmentTier,
};
use crate::config::constants::VAGUE_LANGUAGE_MARKERS;

pub enum GemstoneOutcome {
    Matched(Box<GemstoneMatch>),
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    LooseStone,
    JewelryWithStone,
}

/// Gemstone candidate classification, filter, and scoring (spec §4.5
/// "Gemstone").
pub fn classify(
    task: &Task,
    filters: &GemstoneFilters,
    summary: &ItemSummary,
    detail: &ItemDetail,
) -> GemstoneOutcome {
    let text = format!(
        "{} {} {}",
        summary.title,
        detail.specifics_joined(),
        detail.description.clone().unwrap_or_default()
    );

    if is_simulant(&text) {
        return GemstoneOutcome::Rejected("Simulant/synthetic-cz blacklist hit".to_string());
    }

    let classification = classify_loose_vs_jewelry(summary, &text);
    if classification == Classification::JewelryWithStone && !filters.include_jewelry {
        return GemstoneOutcome::Rejected("Jewelry-with-stone excluded (include_jewelry=false)".to_string());
    }

    let stone_type = extract_stone_type(&text).map(str::to_string);
    let shape = extract_stone_shape(&text).map(str::to_string);
    let carat = extract_carat(&text);
    let colour = extract_color(&text).map(str::to_string);
    let clarity = extract_clarity(&text).map(str::to_string);
    let cut_grade = extract_cut_grade(&text).map(str::to_string);
    let (cert_lab, cert_tier) = extract_cert_lab(&text).map(|(l, t)| (Some(l.to_string()), t)).unwrap_or((None, CertTier::Unknown));
    let (treatment, treatment_tier) = extract_treatment(&text);
    let natural = is_natural(&text);

    if filters.natural_only && natural == Some(false) {
        return GemstoneOutcome::Rejected("Lab-grown/synthetic excluded (natural_only)".to_string());
    }

    if !filters.stone_types.is_empty() {
        let ok = stone_type
            .as_deref()
            .map(|s| filters.stone_types.iter().any(|f| f.eq_ignore_ascii_case(s)))
            .unwrap_or(false);
        if !ok {
            return GemstoneOutcome::Rejected("Stone type not in selected set".to_string());
        }
    }
    if !filters.shapes.is_empty() {
        let ok = shape
            .as_deref()
            .map(|s| filters.shapes.iter().any(|f| f.eq_ignore_ascii_case(s)))
            .unwrap_or(false);
        if !ok {
            return GemstoneOutcome::Rejected("Shape not in selected set".to_string());
        }
    }
    if !filters.colors.is_empty() {
        let ok = colour
            .as_deref()
            .map(|c| filters.colors.iter().any(|f| f.eq_ignore_ascii_case(c)))
            .unwrap_or(false);
        if !ok {
            return GemstoneOutcome::Rejected("Color not in selected set".to_string());
        }
    }
    if !filters.clarities.is_empty() {
        let ok = clarity
            .as_deref()
            .map(|c| filters.clarities.iter().any(|f| f.eq_ignore_ascii_case(c)))
            .unwrap_or(false);
        if !ok {
            return GemstoneOutcome::Rejected("Clarity not in selected set".to_string());
        }
    }
    if let (Some(c), Some(min)) = (carat, filters.carat_min) {
        if c < min {
            return GemstoneOutcome::Rejected("Carat below minimum".to_string());
        }
    }
    if let (Some(c), Some(max)) = (carat, filters.carat_max) {
        if c > max {
            return GemstoneOutcome::Rejected("Carat above maximum".to_string());
        }
    }
    if !filters.certifications.is_empty() {
        let ok = cert_lab
            .as_deref()
            .map(|lab| filters.certifications.iter().any(|f| f.eq_ignore_ascii_case(lab)))
            .unwrap_or(false);
        if !ok {
            return GemstoneOutcome::Rejected("Certification lab not in selected set".to_string());
        }
    }
    if !filters.treatments_allowed.is_empty() {
        if let Some(t) = &treatment {
            if !filters.treatments_allowed.iter().any(|f| f.eq_ignore_ascii_case(t)) {
                return GemstoneOutcome::Rejected("Treatment not in allowed set".to_string());
            }
        }
    }

    let deal_score = compute_deal_score(
        summary,
        detail,
        stone_type.as_deref(),
        shape.as_deref(),
        carat,
        colour.as_deref(),
        clarity.as_deref(),
        cert_tier,
        natural,
        treatment_tier,
    );
    let risk_score = compute_risk_score(summary, &text, natural, treatment_tier, carat);

    if deal_score.value() < filters.min_deal_score {
        return GemstoneOutcome::Rejected(format!("Deal score {} below minimum", deal_score.value()));
    }
    if risk_score.value() > filters.max_risk_score {
        return GemstoneOutcome::Rejected(format!("Risk score {} above maximum", risk_score.value()));
    }

    let ai_reasoning = format!(
        "deal={} risk={} stone={} carat={} cert={}",
        deal_score.value(),
        risk_score.value(),
        stone_type.as_deref().unwrap_or("unknown"),
        carat.map(|c| format!("{c:.2}")).unwrap_or_else(|| "?".to_string()),
        cert_lab.as_deref().unwrap_or("none"),
    );

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

    GemstoneOutcome::Matched(Box::new(GemstoneMatch {
        common,
        stone_type,
        shape,
        carat,
        colour,
        clarity,
        cut_grade,
        cert_lab,
        treatment,
        is_natural: natural,
        classification: match classification {
            Classification::LooseStone => "loose_stone".to_string(),
            Classification::JewelryWithStone => "jewelry_with_stone".to_string(),
        },
        deal_score,
        risk_score,
        ai_score: deal_score.as_ratio(),
        ai_reasoning,
    }))
}

const JEWELRY_WORD_MARKERS: &[&str] = &["ring", "necklace", "pendant", "earring", "bracelet", "brooch"];

fn classify_loose_vs_jewelry(summary: &ItemSummary, text: &str) -> Classification {
    if let Some(category_id) = &summary.category_id {
        let known_loose = GEMSTONE_CATEGORY_EXPANSIONS
            .iter()
            .any(|(_, children)| children.contains(&category_id.as_str()));
        if known_loose {
            return Classification::LooseStone;
        }
    }
    let lower = text.to_ascii_lowercase();
    if JEWELRY_WORD_MARKERS.iter().any(|m| lower.contains(m)) {
        Classification::JewelryWithStone
    } else {
        Classification::LooseStone
    }
}

#[allow(clippy::too_many_arguments)]
fn compute_deal_score(
    summary: &ItemSummary,
    detail: &ItemDetail,
    stone_type: Option<&str>,
    shape: Option<&str>,
    carat: Option<f64>,
    colour: Option<&str>,
    clarity: Option<&str>,
    cert_tier: CertTier,
    natural: Option<bool>,
    treatment_tier: TreatmentTier,
) -> Score {
    let mut points = 0i32;

    points += match_quality_points(stone_type, shape, carat, colour, clarity);

    points += match summary.seller_feedback_score {
        Some(f) if f >= 1000 => 15,
        Some(f) if f >= 100 => 10,
        Some(_) => 5,
        None => 0,
    };

    points += if summary.buying_options.iter().any(|o| o.eq_ignore_ascii_case("BEST_OFFER")) {
        10
    } else if summary.buying_options.iter().any(|o| o.eq_ignore_ascii_case("FIXED_PRICE")) {
        6
    } else {
        2
    };

    points += match cert_tier {
        CertTier::Premium => 15,
        CertTier::Standard => 8,
        CertTier::Budget => 3,
        CertTier::Unknown => 0,
    };

    points += (detail.item_specifics.len().min(5) * 2) as i32;

    if natural == Some(true) {
        points += 5;
    }
    if treatment_tier == TreatmentTier::None {
        points += 5;
    }

    // The weighted sum's ceiling is 25+15+10+15+10+5+5 = 85, not 100;
    // normalize so a maxed-out candidate actually reaches 100 (spec:
    // "normalized to 100").
    let normalized = (points as f64 / 85.0 * 100.0).round() as i32;
    Score::new(normalized)
}

/// Match-quality band (0-25): a flat base for having survived the filter
/// chain above, plus credit for each core attribute the extractors
/// actually recovered from the listing text — more recovered attributes
/// means more confidence this is a genuine match, not just a filter pass.
fn match_quality_points(
    stone_type: Option<&str>,
    shape: Option<&str>,
    carat: Option<f64>,
    colour: Option<&str>,
    clarity: Option<&str>,
) -> i32 {
    let present = [stone_type.is_some(), shape.is_some(), carat.is_some(), colour.is_some(), clarity.is_some()]
        .into_iter()
        .filter(|p| *p)
        .count();
    10 + present as i32 * 3
}

fn compute_risk_score(
    summary: &ItemSummary,
    text: &str,
    natural: Option<bool>,
    treatment_tier: TreatmentTier,
    carat: Option<f64>,
) -> Score {
    let lower = text.to_ascii_lowercase();
    let mut points = 0i32;

    if natural == Some(false) {
        points += 30;
    }
    if lower.contains("no returns") || lower.contains("as is") {
        points += 20;
    }

    let missing = [
        extract_stone_type(&lower).is_none(),
        extract_carat(&lower).is_none(),
        extract_cert_lab(&lower).is_none(),
    ]
    .into_iter()
    .filter(|m| *m)
    .count();
    points += (missing as i32 * 5).min(20);

    if treatment_tier == TreatmentTier::Heavy {
        points += 15;
    }

    points += match summary.seller_feedback_score {
        Some(f) if f < 10 => 15,
        Some(f) if f < 100 => 5,
        None => 15,
        _ => 0,
    };

    if VAGUE_LANGUAGE_MARKERS.iter().any(|m| lower.contains(m)) {
        points += 10;
    }

    if let Some(c) = carat {
        if c > 0.0 {
            let per_carat = summary.price_value / c;
            if per_carat < 20.0 {
                points += 10;
            }
        }
    }

    Score::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;

    fn task(filters: GemstoneFilters) -> Task {
        Task {
            id: "task-1".to_string(),
            user_id: "user-1".to_string(),
            name: "loose diamonds".to_string(),
            status: TaskStatus::Active,
            exclude_keywords: vec![],
            min_price: Money::new(0.0),
            max_price: Money::new(100_000.0),
            allowed_category_ids: vec![],
            poll_interval_s: 60,
            last_run: None,
            max_detail_fetches: 0,
            filters: crate::domain::TaskFilters::Gemstone(filters),
        }
    }

    fn summary(title: &str, price: f64, feedback: Option<u32>) -> ItemSummary {
        ItemSummary {
            item_id: "item-1".to_string(),
            title: title.to_string(),
            item_web_url: "https://example.invalid/item-1".to_string(),
            price_value: price,
            currency: "USD".to_string(),
            shipping_cost: 5.0,
            buying_options: vec!["FIXED_PRICE".to_string()],
            category_id: None,
            condition: None,
            seller_feedback_score: feedback,
            item_creation_date: None,
        }
    }

    fn detail() -> ItemDetail {
        ItemDetail {
            item_id: "item-1".to_string(),
            title: String::new(),
            description: None,
            item_specifics: vec![],
            from_cache: false,
        }
    }

    #[test]
    fn simulant_blacklist_rejects_regardless_of_filters() {
        let t = task(GemstoneFilters::default());
        let s = summary("1.25ct simulated diamond GIA", 500.0, Some(500));
        let d = detail();
        assert!(matches!(
            classify(&t, t.filters.as_gemstone().unwrap(), &s, &d),
            GemstoneOutcome::Rejected(_)
        ));
    }

    #[test]
    fn natural_only_rejects_known_lab_grown() {
        let mut filters = GemstoneFilters::default();
        filters.natural_only = true;
        let t = task(filters);
        let s = summary("1.25ct lab-grown diamond GIA certified", 500.0, Some(500));
        let d = detail();
        assert!(matches!(
            classify(&t, t.filters.as_gemstone().unwrap(), &s, &d),
            GemstoneOutcome::Rejected(_)
        ));
    }

    #[test]
    fn jewelry_with_stone_is_rejected_unless_included() {
        let t = task(GemstoneFilters::default());
        let s = summary("1.25ct diamond engagement ring, GIA certified", 1500.0, Some(2000));
        let d = detail();
        assert!(matches!(
            classify(&t, t.filters.as_gemstone().unwrap(), &s, &d),
            GemstoneOutcome::Rejected(_)
        ));

        let mut filters = GemstoneFilters::default();
        filters.include_jewelry = true;
        let t = task(filters);
        assert!(matches!(
            classify(&t, t.filters.as_gemstone().unwrap(), &s, &d),
            GemstoneOutcome::Matched(_)
        ));
    }

    #[test]
    fn color_and_clarity_extraction_feed_the_filter_and_the_record() {
        let mut filters = GemstoneFilters::default();
        filters.colors = vec!["g color".to_string()];
        let t = task(filters);
        let s = summary("1.52ct round brilliant diamond, G color, VS1, GIA certified", 5000.0, Some(5000));
        let d = detail();
        match classify(&t, t.filters.as_gemstone().unwrap(), &s, &d) {
            GemstoneOutcome::Matched(m) => {
                assert_eq!(m.colour.as_deref(), Some("g color"));
                assert_eq!(m.clarity.as_deref(), Some("vs1"));
            }
            GemstoneOutcome::Rejected(reason) => panic!("expected a match, got rejection: {reason}"),
        }

        let mut mismatched = GemstoneFilters::default();
        mismatched.colors = vec!["d color".to_string()];
        let t = task(mismatched);
        assert!(matches!(
            classify(&t, t.filters.as_gemstone().unwrap(), &s, &d),
            GemstoneOutcome::Rejected(_)
        ));
    }

    #[test]
    fn deal_and_risk_scores_stay_within_bounds_and_gate_correctly() {
        let t = task(GemstoneFilters::default());
        let s = summary("2.00ct natural diamond, GIA certified, round brilliant", 5000.0, Some(5000));
        let d = detail();
        match classify(&t, t.filters.as_gemstone().unwrap(), &s, &d) {
            GemstoneOutcome::Matched(m) => {
                assert!(m.deal_score.value() <= 100);
                assert!(m.risk_score.value() <= 100);
                assert!(m.deal_score.value() > 40, "expected a strong deal score, got {}", m.deal_score.value());
            }
            GemstoneOutcome::Rejected(reason) => panic!("expected a match, got rejection: {reason}"),
        }
    }

    #[test]
    fn min_deal_score_filter_rejects_weak_candidates() {
        let mut filters = GemstoneFilters::default();
        filters.min_deal_score = 99;
        let t = task(filters);
        let s = summary("small diamond, no returns, as is, unknown origin", 50.0, None);
        let d = detail();
        assert!(matches!(
            classify(&t, t.filters.as_gemstone().unwrap(), &s, &d),
            GemstoneOutcome::Rejected(_)
        ));
    }
}
