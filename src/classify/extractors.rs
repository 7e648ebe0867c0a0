//! C7: pure functions mapping title/spec/description text to structured
//! attributes. No I/O; every catalogue consulted here lives in
//! `config::constants` as plain data (spec §4.6).

use regex::Regex;
use std::sync::OnceLock;

use crate::config::constants::{
    CERT_LABS_BUDGET, CERT_LABS_PREMIUM, CERT_LABS_STANDARD, CLARITY_GRADES, COLORED_STONE_COLORS,
    CUT_GRADES, DIAMOND_COLOR_GRADES, EYE_CLEAN_CLARITY_TERMS, GRAMS_PER_CARAT, GRAMS_PER_GRAIN,
    GRAMS_PER_KILOGRAM, GRAMS_PER_OUNCE, GRAMS_PER_PENNYWEIGHT, GRAMS_PER_POUND, KARAT_MARKERS,
    MULTI_TONE_ALLOWED, PLATE_GUARD_KEYWORDS, SIMULANT_BLACKLIST, STONE_PRESENCE_KEYWORDS,
    STONE_SHAPES, STONE_TYPES, TREATMENTS_HEAVY, TREATMENTS_LIGHT, WATCH_BAND_MATERIALS,
    WATCH_CASE_MATERIALS, WATCH_DIAL_COLORS, WATCH_MOVEMENTS,
};
use crate::domain::ItemDetail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetalType {
    Gold,
    Silver,
    Platinum,
    Palladium,
}

impl MetalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetalType::Gold => "gold",
            MetalType::Silver => "silver",
            MetalType::Platinum => "platinum",
            MetalType::Palladium => "palladium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertTier {
    Premium,
    Standard,
    Budget,
    Unknown,
}

/// Strips HTML tags and decodes the handful of entities upstream
/// descriptions actually use. No markup-aware parser is warranted for
/// this; the descriptions are simple marketing copy, not documents.
pub fn clean_description(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    decode_entities(&out)
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Whether `text` contains a "gold-tone"-style fake marker that is NOT one
/// of the legitimate multi-tone exceptions (spec §4.5 jewelry filter).
pub fn has_plate_guard(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    let guarded = PLATE_GUARD_KEYWORDS.iter().any(|kw| lower.contains(kw));
    if !guarded {
        return false;
    }
    let is_tone_hit = lower.contains("tone") || lower.contains("-tone");
    if is_tone_hit && MULTI_TONE_ALLOWED.iter().any(|allowed| lower.contains(allowed)) {
        return false;
    }
    true
}

/// Karat from free text; returns one of {8,9,10,14,18,22,24}.
pub fn extract_karat(text: &str) -> Option<u8> {
    let lower = text.to_ascii_lowercase();
    for marker in KARAT_MARKERS {
        if lower.contains(marker) {
            let digits: String = marker.chars().take_while(|c| c.is_ascii_digit()).collect();
            if let Ok(k) = digits.parse::<u8>() {
                return Some(k);
            }
        }
    }
    None
}

pub fn silver_purity(text: &str) -> u16 {
    let lower = text.to_ascii_lowercase();
    for candidate in [999u16, 925, 900, 800] {
        if lower.contains(&candidate.to_string()) {
            return candidate;
        }
    }
    925
}

pub fn platinum_purity(text: &str) -> u16 {
    let lower = text.to_ascii_lowercase();
    for candidate in [950u16, 900, 850] {
        if lower.contains(&candidate.to_string()) {
            return candidate;
        }
    }
    950
}

/// Metal type from title + specs, honoring plate/fill/tone guards (spec
/// §4.6): a plated/filled/toned listing is not solid metal and returns
/// `None` for classification purposes upstream (the jewelry classifier
/// treats that as a hard reject, not as "unknown metal = skip check").
pub fn extract_metal_type(title: &str, detail: &ItemDetail) -> Option<MetalType> {
    let metal_spec = detail
        .specific_matching(&["metal", "base metal", "material"])
        .unwrap_or("");
    let haystack = format!("{title} {metal_spec}").to_ascii_lowercase();

    if haystack.contains("platinum") {
        Some(MetalType::Platinum)
    } else if haystack.contains("palladium") {
        Some(MetalType::Palladium)
    } else if haystack.contains("gold") {
        Some(MetalType::Gold)
    } else if haystack.contains("silver") {
        Some(MetalType::Silver)
    } else {
        None
    }
}

fn weight_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(grams?|grs?|g|oz|ounces?|dwt|pennyweight|ct|carats?|kg|kilograms?|lbs?|pounds?)\b")
            .expect("static weight pattern")
    })
}

fn unit_to_grams(value: f64, unit: &str) -> Option<f64> {
    let unit = unit.to_ascii_lowercase();
    let factor = match unit.as_str() {
        "g" | "gram" | "grams" => 1.0,
        "gr" | "grs" => GRAMS_PER_GRAIN,
        "oz" | "ounce" | "ounces" => GRAMS_PER_OUNCE,
        "dwt" | "pennyweight" => GRAMS_PER_PENNYWEIGHT,
        "ct" | "carat" | "carats" => GRAMS_PER_CARAT,
        "kg" | "kilogram" | "kilograms" => GRAMS_PER_KILOGRAM,
        "lb" | "lbs" | "pound" | "pounds" => GRAMS_PER_POUND,
        _ => return None,
    };
    Some(value * factor)
}

/// Weight in grams, searched specs → title → cleaned description, with
/// g/gr/oz/dwt/ct/kg/lb unit conversion, rounded to 2dp (spec §4.6, §8
/// idempotence property).
pub fn extract_weight_grams(detail: &ItemDetail, title: &str, description: Option<&str>) -> Option<f64> {
    let spec_weight = detail.specific_matching(&["weight", "total weight", "item weight"]);
    let description_cleaned = description.map(|d| clean_description(d));

    for candidate in [spec_weight, Some(title), description_cleaned.as_deref()]
        .into_iter()
        .flatten()
    {
        if let Some(caps) = weight_regex().captures(candidate) {
            let value: f64 = caps[1].parse().ok()?;
            if let Some(grams) = unit_to_grams(value, &caps[2]) {
                return Some((grams * 100.0).round() / 100.0);
            }
        }
    }
    None
}

/// Backup stone-presence check from the title alone, consulted only when
/// the structured spec fields are all empty (spec §4.6).
pub fn title_suggests_stone(title: &str) -> bool {
    let lower = title.to_ascii_lowercase();
    STONE_PRESENCE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

pub fn extract_stone_type(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    STONE_TYPES.iter().find(|s| lower.contains(*s)).copied()
}

pub fn extract_stone_shape(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    STONE_SHAPES.iter().find(|s| lower.contains(*s)).copied()
}

/// Stone weight in carats from decimal (`1.25ct`), point-shorthand
/// (`75pt` => 0.75ct), or tcw (`2.00 tcw`) notations.
pub fn extract_carat(text: &str) -> Option<f64> {
    static DECIMAL: OnceLock<Regex> = OnceLock::new();
    static POINT: OnceLock<Regex> = OnceLock::new();
    let decimal_re = DECIMAL.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:ct|carat|tcw)\b").expect("static carat pattern")
    });
    let point_re =
        POINT.get_or_init(|| Regex::new(r"(?i)(\d+)\s*pt\b").expect("static point pattern"));

    if let Some(caps) = decimal_re.captures(text) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = point_re.captures(text) {
        let points: f64 = caps[1].parse().ok()?;
        return Some(points / 100.0);
    }
    None
}

/// Stone color, checking diamond letter grades first (spec §4.6: "diamond
/// letter grades vs colored-stone names") and falling back to a
/// colored-stone hue name.
pub fn extract_color(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    if let Some(grade) = DIAMOND_COLOR_GRADES.iter().find(|g| lower.contains(*g)) {
        return Some(grade);
    }
    COLORED_STONE_COLORS.iter().find(|c| lower.contains(*c)).copied()
}

/// Clarity, checking the GIA scale first and falling back to
/// plain-language eye-clean descriptions (spec §4.6).
pub fn extract_clarity(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    if let Some(grade) = CLARITY_GRADES.iter().find(|g| lower.contains(*g)) {
        return Some(grade);
    }
    EYE_CLEAN_CLARITY_TERMS.iter().find(|t| lower.contains(*t)).copied()
}

pub fn extract_cut_grade(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    CUT_GRADES.iter().find(|g| lower.contains(*g)).copied()
}

pub fn extract_cert_lab(text: &str) -> Option<(&'static str, CertTier)> {
    let lower = text.to_ascii_lowercase();
    for lab in CERT_LABS_PREMIUM {
        if lower.contains(lab) {
            return Some((lab, CertTier::Premium));
        }
    }
    for lab in CERT_LABS_STANDARD {
        if lower.contains(lab) {
            return Some((lab, CertTier::Standard));
        }
    }
    for lab in CERT_LABS_BUDGET {
        if lower.contains(lab) {
            return Some((lab, CertTier::Budget));
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentTier {
    Heavy,
    Light,
    None,
}

pub fn extract_treatment(text: &str) -> (Option<&'static str>, TreatmentTier) {
    let lower = text.to_ascii_lowercase();
    for t in TREATMENTS_HEAVY {
        if lower.contains(t) {
            return (Some(t), TreatmentTier::Heavy);
        }
    }
    for t in TREATMENTS_LIGHT {
        if lower.contains(t) {
            return (Some(t), TreatmentTier::Light);
        }
    }
    (None, TreatmentTier::None)
}

pub fn is_simulant(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    SIMULANT_BLACKLIST.iter().any(|kw| lower.contains(kw))
}

pub fn is_natural(text: &str) -> Option<bool> {
    let lower = text.to_ascii_lowercase();
    if lower.contains("natural") && !lower.contains("unnatural") {
        Some(true)
    } else if lower.contains("lab grown")
        || lower.contains("lab-grown")
        || lower.contains("synthetic")
        || lower.contains("created")
    {
        Some(false)
    } else {
        None
    }
}

pub fn extract_watch_case_material(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    WATCH_CASE_MATERIALS.iter().find(|m| lower.contains(*m)).copied()
}

pub fn extract_watch_band_material(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    WATCH_BAND_MATERIALS.iter().find(|m| lower.contains(*m)).copied()
}

pub fn extract_watch_movement(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    WATCH_MOVEMENTS.iter().find(|m| lower.contains(*m)).copied()
}

pub fn extract_watch_dial_color(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    WATCH_DIAL_COLORS.iter().find(|c| lower.contains(*c)).copied()
}

/// A 4-digit year between 1900 and next year, the only range a
/// secondhand-watch listing could plausibly state.
pub fn extract_year(text: &str) -> Option<u16> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\b(19[0-9]{2}|20[0-9]{2})\b").expect("static year pattern"));
    re.captures(text)
        .and_then(|c| c[1].parse::<u16>().ok())
        .filter(|y| (1900..=2100).contains(y))
}

/// Reference/model number following a "ref"/"reference"/"model" marker,
/// e.g. "Submariner Ref. 16610" -> "16610". Sellers rarely label it any
/// other way, so this is the one reliable signal worth regexing for.
pub fn extract_watch_model(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:ref(?:erence)?|model)\.?\s*#?\s*([A-Z0-9][A-Z0-9.\-/]{2,14})\b")
            .expect("static model pattern")
    });
    re.captures(text).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(specifics: &[(&str, &str)]) -> ItemDetail {
        ItemDetail {
            item_id: "1".to_string(),
            title: String::new(),
            description: None,
            item_specifics: specifics
                .iter()
                .map(|(n, v)| crate::domain::ItemSpecific {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
            from_cache: false,
        }
    }

    #[test]
    fn decode_entities_handles_the_common_set() {
        assert_eq!(decode_entities("Tom &amp; Jerry&#39;s"), "Tom & Jerry's");
        assert_eq!(clean_description("<b>14k&nbsp;gold</b>"), "14k gold");
    }

    #[test]
    fn plate_guard_flags_plated_but_allows_two_tone() {
        assert!(has_plate_guard("14k gold plated ring"));
        assert!(has_plate_guard("silver-tone bracelet"));
        assert!(!has_plate_guard("14k two-tone gold ring"));
        assert!(!has_plate_guard("solid 14k gold ring"));
    }

    #[test]
    fn karat_extraction_recognises_known_notations() {
        assert_eq!(extract_karat("14k gold ring"), Some(14));
        assert_eq!(extract_karat("18 karat gold necklace"), Some(18));
        assert_eq!(extract_karat("sterling silver ring"), None);
    }

    #[test]
    fn silver_and_platinum_purity_default_to_most_common_grade() {
        assert_eq!(silver_purity("no purity mentioned"), 925);
        assert_eq!(silver_purity("800 silver"), 800);
        assert_eq!(platinum_purity("plain platinum band"), 950);
        assert_eq!(platinum_purity("900 platinum"), 900);
    }

    #[test]
    fn metal_type_prefers_specifics_over_title_and_respects_precedence() {
        let d = detail(&[("metal", "platinum")]);
        assert_eq!(extract_metal_type("gold tone ring", &d), Some(MetalType::Platinum));
        let d = detail(&[]);
        assert_eq!(extract_metal_type("14k gold ring", &d), Some(MetalType::Gold));
        assert_eq!(extract_metal_type("fashion ring", &d), None);
    }

    #[test]
    fn weight_extraction_is_idempotent_across_units() {
        let d = detail(&[]);
        let grams = extract_weight_grams(&d, "ring, 5 grams", None).unwrap();
        let oz = extract_weight_grams(&d, "ring, 0.176370 oz", None).unwrap();
        assert!((grams - oz).abs() < 0.05, "grams={grams} oz={oz}");
    }

    #[test]
    fn weight_extraction_prefers_spec_field_over_title() {
        let d = detail(&[("total weight", "10 grams")]);
        let weight = extract_weight_grams(&d, "ring, 5 grams", None).unwrap();
        assert_eq!(weight, 10.0);
    }

    #[test]
    fn weight_extraction_rounds_to_two_decimal_places() {
        let d = detail(&[]);
        let weight = extract_weight_grams(&d, "1 dwt chain", None).unwrap();
        assert_eq!(weight, 1.56);
    }

    #[test]
    fn stone_type_match_prefers_longest_candidate() {
        assert_eq!(extract_stone_type("cubic zirconia ring"), Some("cubic zirconia"));
        assert_eq!(extract_stone_type("diamond ring"), Some("diamond"));
        assert_eq!(extract_stone_type("plain gold band"), None);
    }

    #[test]
    fn carat_extraction_handles_decimal_and_point_notation() {
        assert_eq!(extract_carat("1.25ct diamond"), Some(1.25));
        assert_eq!(extract_carat("75pt diamond"), Some(0.75));
        assert_eq!(extract_carat("2.00 tcw ring"), Some(2.00));
        assert_eq!(extract_carat("no weight given"), None);
    }

    #[test]
    fn color_prefers_diamond_letter_grade_over_stone_hue() {
        assert_eq!(extract_color("1ct round diamond, G color, VS1"), Some("g color"));
        assert_eq!(extract_color("royal blue sapphire ring"), Some("royal blue"));
        assert_eq!(extract_color("plain gold band"), None);
    }

    #[test]
    fn clarity_prefers_gia_scale_over_eye_clean_language() {
        assert_eq!(extract_clarity("1ct diamond VVS1 clarity"), Some("vvs1"));
        assert_eq!(extract_clarity("eye clean emerald"), Some("eye clean"));
        assert_eq!(extract_clarity("no clarity stated"), None);
    }

    #[test]
    fn cut_grade_recognises_known_grades() {
        assert_eq!(extract_cut_grade("excellent cut round brilliant diamond"), Some("excellent"));
        assert_eq!(extract_cut_grade("no cut mentioned"), None);
    }

    #[test]
    fn cert_lab_tiers_are_ranked_premium_first() {
        assert_eq!(extract_cert_lab("GIA certified diamond").unwrap().1, CertTier::Premium);
        assert_eq!(extract_cert_lab("IGI certified").unwrap().1, CertTier::Standard);
        assert_eq!(extract_cert_lab("EGL report").unwrap().1, CertTier::Budget);
        assert!(extract_cert_lab("no lab mentioned").is_none());
    }

    #[test]
    fn treatment_tiers_heavy_before_light() {
        assert_eq!(extract_treatment("clarity enhanced and heated").1, TreatmentTier::Heavy);
        assert_eq!(extract_treatment("heated only").1, TreatmentTier::Light);
        assert_eq!(extract_treatment("untreated natural stone").1, TreatmentTier::None);
    }

    #[test]
    fn simulant_blacklist_and_natural_detection() {
        assert!(is_simulant("simulated diamond ring"));
        assert!(!is_simulant("natural diamond ring"));
        assert_eq!(is_natural("natural ruby"), Some(true));
        assert_eq!(is_natural("lab-grown ruby"), Some(false));
        assert_eq!(is_natural("ruby ring"), None);
    }

    #[test]
    fn watch_extractors_read_the_title() {
        let title = "Rolex Submariner Ref. 16610 stainless steel automatic black dial";
        assert_eq!(extract_watch_case_material(title), Some("stainless steel"));
        assert_eq!(extract_watch_movement(title), Some("automatic"));
        assert_eq!(extract_watch_dial_color(title), Some("black"));
        assert_eq!(extract_watch_model(title).as_deref(), Some("16610"));
    }

    #[test]
    fn year_extraction_rejects_out_of_range_numbers() {
        assert_eq!(extract_year("Vintage 1978 Seiko"), Some(1978));
        assert_eq!(extract_year("Lot of 12345 watches"), None);
    }
}
