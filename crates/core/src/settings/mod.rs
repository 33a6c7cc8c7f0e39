//! Settings record, repository contract and the startup merge loader.

mod loader;
mod model;

pub use loader::{LocalSettingsStores, SettingsService};
pub use model::{hash_pin, is_hashed_pin, is_plaintext_pin, Settings};

use async_trait::async_trait;

use crate::errors::Result;

/// Local durable store contract for the singleton settings record
/// (keyed by user id).
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Settings>>;

    /// Local edit: persisted with `sync_status = pending` and a fresh
    /// `updated_at`.
    async fn upsert_pending(&self, settings: Settings) -> Result<()>;

    /// Cache refresh from authoritative remote state: persisted verbatim with
    /// `sync_status = synced`.
    async fn upsert_synced(&self, settings: Settings) -> Result<()>;
}
