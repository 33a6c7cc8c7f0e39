//! Transaction domain model, repository contract and data-access facade.

mod model;
mod service;
mod strategy;

pub use model::{generate_transaction_id, NewTransaction, Transaction, MAX_DESCRIPTION_LEN};
pub use service::TransactionService;
pub use strategy::{LocalFirstStrategy, RemoteOnlyStrategy, StorageStrategy};

use async_trait::async_trait;

use crate::errors::Result;

/// Local durable store contract for transaction rows.
///
/// Every mutating operation enforces the sync-status invariant: the row is
/// marked pending and its `updated_at` refreshed at the write site. Pull-side
/// writes go through [`upsert_synced`](Self::upsert_synced) instead, which
/// overwrites the row verbatim with remote state.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Live rows for one owner: non-deleted, ordered by occurrence date
    /// descending.
    async fn load(&self, user_id: &str) -> Result<Vec<Transaction>>;

    /// Upsert a locally created row (marked pending).
    async fn insert(&self, tx: Transaction) -> Result<()>;

    /// Overwrite a locally edited row (marked pending, `updated_at` bumped).
    async fn update(&self, tx: Transaction) -> Result<()>;

    /// Soft delete: sets the deleted flag, never removes the row.
    async fn soft_delete(&self, id: &str) -> Result<()>;

    /// Pull-phase overwrite: all fields taken from the remote row, status
    /// forced to synced.
    async fn upsert_synced(&self, tx: Transaction) -> Result<()>;

    /// All rows awaiting upload, soft-deleted ones included.
    async fn list_pending(&self) -> Result<Vec<Transaction>>;

    /// Flip every currently pending row to synced, returning how many rows
    /// were flipped.
    async fn mark_all_pending_synced(&self) -> Result<usize>;

    /// Fetch a row by id regardless of its deleted flag.
    async fn get_any(&self, id: &str) -> Result<Option<Transaction>>;
}
