//! Sync domain: per-row status flag, remote store contract, the push/pull
//! reconciler and the connectivity-triggered scheduler.

mod reconciler;
mod scheduler;

pub use reconciler::{SyncReconciler, SyncReport};
pub use scheduler::{
    ConnectivityScheduler, SyncHealth, DEGRADED_AFTER_CONSECUTIVE_FAILURES,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::settings::Settings;
use crate::transactions::Transaction;

/// Fixed key under which the pull cursor is persisted, outside the
/// relational schema.
pub const SYNC_CURSOR_KEY: &str = "sync.last_pull_at";

/// Fixed key holding the pre-migration flat settings blob, read at most once
/// per install by the settings merge loader.
pub const LEGACY_SETTINGS_KEY: &str = "legacy.settings";

/// Per-row flag marking local mutations awaiting upload.
///
/// Pending-ness is a derived property of existing rows; there is no separate
/// outbox. A failed push simply leaves rows pending until the next trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Synced,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pending" => Some(SyncStatus::Pending),
            "synced" => Some(SyncStatus::Synced),
            _ => None,
        }
    }

    /// Serde default for freshly decoded local rows.
    pub fn default_pending() -> Self {
        SyncStatus::Pending
    }
}

/// Network-reachable structured store, consumed through upsert-by-id and
/// greater-than timestamp filtering only.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Batched upsert keyed by row id.
    async fn upsert_transactions(&self, rows: Vec<Transaction>) -> Result<()>;

    /// All live rows for one owner, used by the remote-only read path.
    async fn select_transactions(&self, user_id: &str) -> Result<Vec<Transaction>>;

    /// Rows updated strictly after the cursor, soft-deleted ones included so
    /// deletions propagate.
    async fn select_transactions_updated_after(
        &self,
        user_id: &str,
        cursor_millis: i64,
    ) -> Result<Vec<Transaction>>;

    /// Hard delete, used by the remote-only write path.
    async fn delete_transaction(&self, user_id: &str, id: &str) -> Result<()>;

    /// Raw settings row for the merge loader's tolerant field reconciliation.
    async fn get_settings(&self, user_id: &str) -> Result<Option<serde_json::Value>>;

    async fn upsert_settings(&self, settings: Settings) -> Result<()>;
}

/// Process-local sync watermark and legacy key-value slots.
#[async_trait]
pub trait SyncStateRepositoryTrait: Send + Sync {
    /// Last successful pull completion, epoch millis. `None` before the
    /// first pull.
    async fn get_cursor(&self) -> Result<Option<i64>>;

    async fn set_cursor(&self, cursor_millis: i64) -> Result<()>;

    /// Pre-migration flat settings blob, if this install still carries one.
    async fn get_legacy_settings(&self) -> Result<Option<String>>;
}
