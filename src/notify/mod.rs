//! C10: best-effort chat-webhook notifier (spec §6 "Notification
//! payload"). Fire-and-forget — failures are logged at warn level and
//! otherwise ignored (spec §7 item 7).

use reqwest::Client;
use serde_json::json;

use crate::domain::{GemstoneMatch, JewelryMatch};

const TITLE_MAX_LEN: usize = 100;

#[derive(Clone)]
pub struct Notifier {
    http: Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: Client::new(),
            webhook_url,
        }
    }

    pub async fn notify_jewelry_match(&self, m: &JewelryMatch) {
        let title = truncate_title(&m.common.ebay_title);
        let total_cost = *m.common.listed_price + *m.common.shipping_cost;
        let offer = total_cost * crate::config::constants::OFFER_SUGGESTION_RATIO;
        let blocks = json!([
            { "type": "header", "text": { "type": "plain_text", "text": format!("Jewelry match: {title}") } },
            { "type": "section", "text": { "type": "mrkdwn", "text": format!(
                "*Weight:* {}\n*Melt value:* {}\n*Total cost:* ${:.2}\n*Profit (scrap):* {}\n*Suggested offer:* ${:.2}",
                m.weight_g, m.melt_value, total_cost, m.profit_scrap, offer
            ) } },
            { "type": "actions", "elements": [
                { "type": "button", "text": { "type": "plain_text", "text": "View listing" }, "url": m.common.ebay_url }
            ] },
        ]);
        self.send(blocks).await;
    }

    pub async fn notify_gemstone_match(&self, m: &GemstoneMatch) {
        let title = truncate_title(&m.common.ebay_title);
        let blocks = json!([
            { "type": "header", "text": { "type": "plain_text", "text": format!("Gemstone match: {title}") } },
            { "type": "section", "text": { "type": "mrkdwn", "text": format!(
                "*Deal score:* {}\n*Risk score:* {}\n*Stone:* {}\n*Classification:* {}",
                m.deal_score.value(),
                m.risk_score.value(),
                m.stone_type.as_deref().unwrap_or("unknown"),
                m.classification,
            ) } },
            { "type": "actions", "elements": [
                { "type": "button", "text": { "type": "plain_text", "text": "View listing" }, "url": m.common.ebay_url }
            ] },
        ]);
        self.send(blocks).await;
    }

    async fn send(&self, blocks: serde_json::Value) {
        let Some(url) = &self.webhook_url else {
            return;
        };
        let payload = json!({ "blocks": blocks });
        match self.http.post(url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => log::warn!("notification webhook returned {}", resp.status()),
            Err(e) => log::warn!("notification webhook request failed: {e}"),
        }
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= TITLE_MAX_LEN {
        title.to_string()
    } else {
        title.chars().take(TITLE_MAX_LEN - 1).collect::<String>() + "\u{2026}"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_are_untouched() {
        assert_eq!(truncate_title("14k gold ring"), "14k gold ring");
    }

    #[test]
    fn long_titles_are_truncated_with_an_ellipsis() {
        let long = "x".repeat(150);
        let truncated = truncate_title(&long);
        assert_eq!(truncated.chars().count(), TITLE_MAX_LEN);
        assert!(truncated.ends_with('\u{2026}'));
    }

    #[tokio::test]
    async fn notifier_without_a_webhook_url_is_a_silent_noop() {
        let notifier = Notifier::new(None);
        let m = JewelryMatch {
            common: crate::domain::MatchCommon {
                task_id: "t".to_string(),
                user_id: "u".to_string(),
                ebay_listing_id: "i".to_string(),
                ebay_title: "14k gold ring".to_string(),
                ebay_url: "https://example.invalid/i".to_string(),
                listed_price: crate::config::Money::new(100.0),
                shipping_cost: crate::config::Money::new(5.0),
                currency: "USD".to_string(),
                buy_format: "FIXED_PRICE".to_string(),
                seller_feedback: Some(10),
                found_at: chrono::Utc::now(),
                status: crate::domain::MatchStatus::New,
            },
            metal_type: "gold".to_string(),
            karat: Some(14),
            weight_g: crate::config::Grams::new(10.0),
            melt_value: crate::config::Money::new(400.0),
            profit_scrap: crate::config::Money::new(240.0),
        };
        notifier.notify_jewelry_match(&m).await;
    }
}
