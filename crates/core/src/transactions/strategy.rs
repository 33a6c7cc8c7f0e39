//! Storage strategies behind the data-access facade.
//!
//! Platform capability is decided once at startup: devices with an embedded
//! database get the local-first strategy, browser-style contexts without one
//! talk to the remote store directly.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::sync::{RemoteStore, SyncReconciler, SyncStatus};
use crate::time;
use crate::transactions::{Transaction, TransactionRepositoryTrait};

/// Write/read path for transactions, selected once at startup.
#[async_trait]
pub trait StorageStrategy: Send + Sync {
    async fn create(&self, tx: Transaction) -> Result<()>;

    async fn update(&self, tx: Transaction) -> Result<()>;

    /// Soft delete on the local-first path, hard delete on the remote-only
    /// path (there is no offline window to reconcile without a local store).
    async fn delete(&self, user_id: &str, id: &str) -> Result<()>;

    /// Live rows for one owner, ordered by occurrence date descending.
    async fn load(&self, user_id: &str) -> Result<Vec<Transaction>>;
}

/// Writes land in the local store marked pending, then a background push
/// uploads them without blocking the caller.
pub struct LocalFirstStrategy {
    repo: Arc<dyn TransactionRepositoryTrait>,
    reconciler: Arc<SyncReconciler>,
}

impl LocalFirstStrategy {
    pub fn new(
        repo: Arc<dyn TransactionRepositoryTrait>,
        reconciler: Arc<SyncReconciler>,
    ) -> Self {
        Self { repo, reconciler }
    }

    fn trigger_background_push(&self) {
        let reconciler = Arc::clone(&self.reconciler);
        tokio::spawn(async move {
            if let Err(err) = reconciler.push().await {
                log::warn!("[Sync] background push failed: {err}");
            }
        });
    }
}

#[async_trait]
impl StorageStrategy for LocalFirstStrategy {
    async fn create(&self, tx: Transaction) -> Result<()> {
        self.repo.insert(tx).await?;
        self.trigger_background_push();
        Ok(())
    }

    async fn update(&self, tx: Transaction) -> Result<()> {
        self.repo.update(tx).await?;
        self.trigger_background_push();
        Ok(())
    }

    async fn delete(&self, _user_id: &str, id: &str) -> Result<()> {
        self.repo.soft_delete(id).await?;
        self.trigger_background_push();
        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Vec<Transaction>> {
        self.repo.load(user_id).await
    }
}

/// No local cache: every operation is a direct remote call.
pub struct RemoteOnlyStrategy {
    remote: Arc<dyn RemoteStore>,
}

impl RemoteOnlyStrategy {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    fn as_synced(mut tx: Transaction) -> Transaction {
        tx.sync_status = SyncStatus::Synced;
        tx.updated_at = time::now_rfc3339();
        tx
    }
}

#[async_trait]
impl StorageStrategy for RemoteOnlyStrategy {
    async fn create(&self, tx: Transaction) -> Result<()> {
        self.remote
            .upsert_transactions(vec![Self::as_synced(tx)])
            .await
    }

    async fn update(&self, tx: Transaction) -> Result<()> {
        self.remote
            .upsert_transactions(vec![Self::as_synced(tx)])
            .await
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        self.remote.delete_transaction(user_id, id).await
    }

    async fn load(&self, user_id: &str) -> Result<Vec<Transaction>> {
        self.remote.select_transactions(user_id).await
    }
}
