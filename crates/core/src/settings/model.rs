//! Settings record and the PIN hashing rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::categories::{default_categories, Category};
use crate::sync::SyncStatus;
use crate::time;

/// One settings record per user.
///
/// `security_pin`, when present, is always a one-way hash; the merge loader
/// migrates legacy plaintext values before they ever reach this struct's
/// persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub user_id: String,
    pub currency: String,
    pub locale: String,
    pub name: String,
    pub avatar: Option<String>,
    /// Monthly budget ceiling.
    pub budget: Option<Decimal>,
    /// Per-transaction amount ceiling.
    pub max_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::serde_util::tolerant_bool")]
    pub notifications_enabled: bool,
    pub reminder_time: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_util::tolerant_bool")]
    pub app_lock_enabled: bool,
    pub security_pin: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_util::tolerant_bool")]
    pub biometrics_enabled: bool,
    pub theme: String,
    pub accent_color: Option<String>,
    pub categories: Vec<Category>,
    #[serde(default, deserialize_with = "crate::serde_util::tolerant_bool")]
    pub is_premium: bool,
    #[serde(default, deserialize_with = "crate::serde_util::tolerant_bool")]
    pub automatic_cloud_sync: bool,
    pub updated_at: String,
    #[serde(default = "SyncStatus::default_pending")]
    pub sync_status: SyncStatus,
}

impl Settings {
    /// First-run defaults, seeded with the default category set.
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            currency: "USD".to_string(),
            locale: "en-US".to_string(),
            name: String::new(),
            avatar: None,
            budget: None,
            max_amount: None,
            notifications_enabled: false,
            reminder_time: None,
            app_lock_enabled: false,
            security_pin: None,
            biometrics_enabled: false,
            theme: "system".to_string(),
            accent_color: None,
            categories: default_categories(),
            is_premium: false,
            automatic_cloud_sync: true,
            updated_at: time::now_rfc3339(),
            sync_status: SyncStatus::Pending,
        }
    }
}

/// A legacy plaintext PIN: exactly four ASCII digits.
pub fn is_plaintext_pin(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}

/// An already-hashed PIN: a 64-character hex digest. Detection is by shape,
/// not a migration-version flag, because no such flag exists in the data.
pub fn is_hashed_pin(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// One-way hash applied to the app-lock PIN.
pub fn hash_pin(pin: &str) -> String {
    format!("{:x}", Sha256::digest(pin.as_bytes()))
}
