//! Transaction data-access facade.
//!
//! The only interface the UI uses for transactions. The facade owns the
//! in-memory list and replaces it wholesale on every reload; there is no
//! incremental patching, which keeps the in-memory view and the store from
//! diverging.

use std::sync::{Arc, RwLock};

use crate::errors::Result;
use crate::identity::UserIdentity;
use crate::settings::SettingsService;
use crate::sync::SyncStatus;
use crate::time;
use crate::transactions::{
    generate_transaction_id, NewTransaction, StorageStrategy, Transaction,
};

pub struct TransactionService {
    strategy: Arc<dyn StorageStrategy>,
    settings: Arc<SettingsService>,
    identity: UserIdentity,
    transactions: RwLock<Vec<Transaction>>,
}

impl TransactionService {
    pub fn new(
        strategy: Arc<dyn StorageStrategy>,
        settings: Arc<SettingsService>,
        identity: UserIdentity,
    ) -> Self {
        Self {
            strategy,
            settings,
            identity,
            transactions: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of the in-memory list.
    pub fn list(&self) -> Vec<Transaction> {
        self.transactions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drop the in-memory list (sign-out).
    pub fn clear(&self) {
        self.transactions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Replace the in-memory list from the storage strategy.
    pub async fn load(&self) -> Result<Vec<Transaction>> {
        let rows = self.strategy.load(&self.identity.user_id).await?;
        *self
            .transactions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = rows.clone();
        Ok(rows)
    }

    /// Reload after a successful write; a reload failure keeps the previous
    /// in-memory state and is only logged.
    async fn reload_after_write(&self) {
        if let Err(err) = self.load().await {
            log::warn!("[Sync] reload after write failed: {err}");
        }
    }

    /// Category names may come from the prediction heuristic; they are never
    /// trusted until checked against the live category list.
    fn validate_category(&self, name: &str) -> Result<()> {
        let settings = self.settings.current();
        if settings
            .categories
            .iter()
            .any(|category| category.name == name)
        {
            Ok(())
        } else {
            Err(crate::errors::Error::validation(format!(
                "unknown category '{name}'"
            )))
        }
    }

    /// Create a transaction from user input.
    ///
    /// Validation failures are returned to the caller; a store write failure
    /// is logged and swallowed (`Ok(None)`), leaving the in-memory list at
    /// its last successful state.
    pub async fn add(&self, input: NewTransaction) -> Result<Option<Transaction>> {
        input.validate()?;
        self.validate_category(&input.category)?;

        let now = time::now_rfc3339();
        let tx = Transaction {
            id: generate_transaction_id(),
            amount: input.amount,
            description: input.description,
            date: input.date,
            category: input.category,
            kind: input.kind,
            user_id: self.identity.user_id.clone(),
            created_at: now.clone(),
            updated_at: now,
            sync_status: SyncStatus::Pending,
            deleted: false,
        };

        if let Err(err) = self.strategy.create(tx.clone()).await {
            log::error!("[Sync] transaction write failed, keeping previous state: {err}");
            return Ok(None);
        }
        self.reload_after_write().await;
        Ok(Some(tx))
    }

    /// Apply user edits to an existing transaction. The id is immutable;
    /// the row is re-marked pending by the write path.
    pub async fn update(&self, mut tx: Transaction) -> Result<Option<Transaction>> {
        let input = NewTransaction {
            amount: tx.amount,
            description: tx.description.clone(),
            date: tx.date.clone(),
            category: tx.category.clone(),
            kind: tx.kind,
        };
        input.validate()?;
        self.validate_category(&tx.category)?;

        tx.updated_at = time::now_rfc3339();
        tx.sync_status = SyncStatus::Pending;
        if let Err(err) = self.strategy.update(tx.clone()).await {
            log::error!("[Sync] transaction update failed, keeping previous state: {err}");
            return Ok(None);
        }
        self.reload_after_write().await;
        Ok(Some(tx))
    }

    /// Delete by id: a soft delete on local-first platforms so the deletion
    /// itself can sync, a hard delete on remote-only platforms.
    pub async fn remove(&self, id: &str) -> Result<()> {
        if let Err(err) = self.strategy.delete(&self.identity.user_id, id).await {
            log::error!("[Sync] transaction delete failed, keeping previous state: {err}");
            return Ok(());
        }
        self.reload_after_write().await;
        Ok(())
    }
}
