use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an upstream API credential (spec §3, §4.2).
///
/// `Error` is sticky: only a human editing settings can move a
/// credential back to `Ok`. `RateLimited` is not actually persisted to
/// the backing store — cooldowns live only in the in-memory
/// `credentials::CredentialPool` — but the variant exists so the settings
/// schema round-trips values a human operator may have set by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Ok,
    RateLimited,
    Error,
}

/// One upstream API credential, as stored in the `ebay_keys` setting.
/// Unique by `app_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub app_id: String,
    pub dev_id: String,
    pub cert_id: String,
    pub label: String,
    pub status: CredentialStatus,
    #[serde(default)]
    pub calls_today: u32,
    #[serde(default)]
    pub calls_reset_date: Option<NaiveDate>,
}

impl Credential {
    /// A credential is usable for settings purposes iff it has not been
    /// disabled. Cooldown state is tracked separately in `CredentialPool`
    /// because it is process-local, not persisted.
    pub fn is_enabled(&self) -> bool {
        matches!(self.status, CredentialStatus::Ok)
    }
}
