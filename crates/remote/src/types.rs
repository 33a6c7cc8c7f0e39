//! Wire rows for the cloud tables.
//!
//! Column names are snake_case on the wire while the domain records are
//! camelCase; the startup settings loader reads raw rows under both
//! spellings, so only the upload direction needs a typed settings row.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pocketledger_core::categories::{encode_categories_blob, TransactionKind};
use pocketledger_core::settings::Settings;
use pocketledger_core::sync::SyncStatus;
use pocketledger_core::transactions::Transaction;

/// Error body shape returned by the REST layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub date: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub kind: TransactionKind,
    pub user_id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(
        default,
        deserialize_with = "pocketledger_core::serde_util::tolerant_bool"
    )]
    pub deleted: bool,
}

impl From<Transaction> for TransactionRow {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            amount: tx.amount,
            description: tx.description,
            date: tx.date,
            category: tx.category,
            kind: tx.kind,
            user_id: tx.user_id,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
            deleted: tx.deleted,
        }
    }
}

impl TransactionRow {
    /// Rows coming back from the cloud are authoritative and land synced.
    pub fn into_domain(self) -> Transaction {
        Transaction {
            id: self.id,
            amount: self.amount,
            description: self.description,
            date: self.date,
            category: self.category,
            kind: self.kind,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            sync_status: SyncStatus::Synced,
            deleted: self.deleted,
        }
    }
}

/// Upload shape for the singleton settings row. Categories travel as a
/// JSON-encoded string column.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsRow {
    pub user_id: String,
    pub currency: String,
    pub locale: String,
    pub name: String,
    pub avatar: Option<String>,
    pub budget: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub notifications_enabled: bool,
    pub reminder_time: Option<String>,
    pub app_lock_enabled: bool,
    pub security_pin: Option<String>,
    pub biometrics_enabled: bool,
    pub theme: String,
    pub accent_color: Option<String>,
    pub categories: String,
    pub is_premium: bool,
    pub automatic_cloud_sync: bool,
    pub updated_at: String,
}

impl From<Settings> for SettingsRow {
    fn from(settings: Settings) -> Self {
        Self {
            user_id: settings.user_id,
            currency: settings.currency,
            locale: settings.locale,
            name: settings.name,
            avatar: settings.avatar,
            budget: settings.budget,
            max_amount: settings.max_amount,
            notifications_enabled: settings.notifications_enabled,
            reminder_time: settings.reminder_time,
            app_lock_enabled: settings.app_lock_enabled,
            security_pin: settings.security_pin,
            biometrics_enabled: settings.biometrics_enabled,
            theme: settings.theme,
            accent_color: settings.accent_color,
            categories: encode_categories_blob(&settings.categories),
            is_premium: settings.is_premium,
            automatic_cloud_sync: settings.automatic_cloud_sync,
            updated_at: settings.updated_at,
        }
    }
}
