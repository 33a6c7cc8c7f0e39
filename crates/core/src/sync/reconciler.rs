//! Push/pull reconciler: moves local changes to the remote store and remote
//! changes into the local store.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::identity::UserIdentity;
use crate::settings::SettingsRepositoryTrait;
use crate::sync::{RemoteStore, SyncStateRepositoryTrait, SyncStatus};
use crate::time;
use crate::transactions::TransactionRepositoryTrait;

/// Counts for one completed sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub pushed_count: usize,
    pub pulled_count: usize,
}

/// Orchestrates one push-then-pull cycle against the remote store.
///
/// Both phases are idempotent (upsert-based); failures leave rows pending
/// and are retried on the next trigger. A cycle guard serializes overlapping
/// invocations from rapid connectivity flaps.
pub struct SyncReconciler {
    transactions: Arc<dyn TransactionRepositoryTrait>,
    settings: Arc<dyn SettingsRepositoryTrait>,
    sync_state: Arc<dyn SyncStateRepositoryTrait>,
    remote: Arc<dyn RemoteStore>,
    identity: UserIdentity,
    cycle_guard: tokio::sync::Mutex<()>,
}

impl SyncReconciler {
    pub fn new(
        transactions: Arc<dyn TransactionRepositoryTrait>,
        settings: Arc<dyn SettingsRepositoryTrait>,
        sync_state: Arc<dyn SyncStateRepositoryTrait>,
        remote: Arc<dyn RemoteStore>,
        identity: UserIdentity,
    ) -> Self {
        Self {
            transactions,
            settings,
            sync_state,
            remote,
            identity,
            cycle_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Upload every pending local row as one batched upsert, then flip the
    /// pending rows to synced.
    ///
    /// The flip covers every row pending at flip time, not just the batch
    /// that was sent: a row created while the upload is in flight gets
    /// flipped without having been uploaded and is only repaired by a later
    /// local edit. An accepted race for this data model — creations during
    /// the sub-second push window are rare — but one to keep visible in the
    /// test suite.
    pub async fn push(&self) -> Result<usize> {
        let pending = self.transactions.list_pending().await?;
        let mut pushed = 0usize;

        if !pending.is_empty() {
            pushed = pending.len();
            self.remote.upsert_transactions(pending).await?;
            self.transactions.mark_all_pending_synced().await?;
        }

        if let Some(settings) = self.settings.get(&self.identity.user_id).await? {
            if settings.sync_status == SyncStatus::Pending {
                self.remote.upsert_settings(settings.clone()).await?;
                // re-read before flipping: an edit that landed while the
                // upload was in flight keeps its content and stays pending
                // for the next cycle
                if let Some(current) = self.settings.get(&self.identity.user_id).await? {
                    if current.updated_at == settings.updated_at {
                        self.settings.upsert_synced(current).await?;
                    }
                }
                pushed += 1;
            }
        }

        Ok(pushed)
    }

    /// Fetch remote rows updated after the cursor and upsert them locally,
    /// remote state winning at row granularity.
    ///
    /// The cursor is advanced to the current wall-clock time, not to the
    /// largest observed row timestamp, so a server whose clock runs behind
    /// this device can record updates the next pull will miss. Known
    /// limitation; requires monotonic server clocks or a safety margin.
    pub async fn pull(&self) -> Result<usize> {
        let cursor = self.sync_state.get_cursor().await?.unwrap_or(0);
        let rows = self
            .remote
            .select_transactions_updated_after(&self.identity.user_id, cursor)
            .await?;
        let pulled = rows.len();

        for mut row in rows {
            row.sync_status = SyncStatus::Synced;
            self.transactions.upsert_synced(row).await?;
        }

        self.sync_state.set_cursor(time::now_epoch_millis()).await?;
        Ok(pulled)
    }

    /// Push then pull, strictly sequential; a push failure skips the pull
    /// for this invocation.
    pub async fn sync(&self) -> Result<SyncReport> {
        let _guard = self.cycle_guard.lock().await;
        let pushed_count = self.push().await?;
        let pulled_count = self.pull().await?;
        debug!("[Sync] cycle complete pushed={pushed_count} pulled={pulled_count}");
        Ok(SyncReport {
            pushed_count,
            pulled_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Settings, SettingsRepositoryTrait};
    use crate::testing::{
        sample_transaction, MemorySettingsRepository, MemorySyncState,
        MemoryTransactionRepository, MockRemoteStore,
    };
    use crate::transactions::Transaction;

    use crate::identity::UserIdentity;

    fn reconciler_with(
        repo: Arc<MemoryTransactionRepository>,
        remote: Arc<MockRemoteStore>,
        sync_state: Arc<MemorySyncState>,
    ) -> SyncReconciler {
        SyncReconciler::new(
            repo,
            Arc::new(MemorySettingsRepository::default()),
            sync_state,
            remote,
            UserIdentity::authenticated("u1"),
        )
    }

    #[tokio::test]
    async fn push_flips_pending_rows_to_synced() {
        let repo = Arc::new(MemoryTransactionRepository::default());
        let remote = Arc::new(MockRemoteStore::default());
        let sync_state = Arc::new(MemorySyncState::default());
        repo.insert(sample_transaction("t1", "u1")).await.unwrap();

        let reconciler = reconciler_with(repo.clone(), remote.clone(), sync_state);
        let pushed = reconciler.push().await.unwrap();

        assert_eq!(pushed, 1);
        assert_eq!(remote.transaction_upsert_batches(), 1);
        let row = repo.get_any("t1").await.unwrap().unwrap();
        assert_eq!(row.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn push_with_nothing_pending_makes_no_network_call() {
        let repo = Arc::new(MemoryTransactionRepository::default());
        let remote = Arc::new(MockRemoteStore::default());
        let reconciler =
            reconciler_with(repo, remote.clone(), Arc::new(MemorySyncState::default()));

        let pushed = reconciler.push().await.unwrap();

        assert_eq!(pushed, 0);
        assert_eq!(remote.transaction_upsert_batches(), 0);
    }

    #[tokio::test]
    async fn failed_push_leaves_rows_pending() {
        let repo = Arc::new(MemoryTransactionRepository::default());
        let remote = Arc::new(MockRemoteStore::default());
        remote.fail_next_upsert();
        repo.insert(sample_transaction("t1", "u1")).await.unwrap();

        let reconciler =
            reconciler_with(repo.clone(), remote, Arc::new(MemorySyncState::default()));
        assert!(reconciler.push().await.is_err());

        let row = repo.get_any("t1").await.unwrap().unwrap();
        assert_eq!(row.sync_status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn pull_overwrites_local_rows_with_remote_state() {
        let repo = Arc::new(MemoryTransactionRepository::default());
        let remote = Arc::new(MockRemoteStore::default());
        let sync_state = Arc::new(MemorySyncState::default());

        let mut local = sample_transaction("t1", "u1");
        local.description = "local edit".to_string();
        repo.insert(local).await.unwrap();

        let mut remote_row = sample_transaction("t1", "u1");
        remote_row.description = "remote wins".to_string();
        remote_row.updated_at = "2024-03-02T00:00:00.000Z".to_string();
        remote.seed_transaction(remote_row.clone());

        let reconciler = reconciler_with(repo.clone(), remote, sync_state.clone());
        let pulled = reconciler.pull().await.unwrap();

        assert_eq!(pulled, 1);
        let stored = repo.get_any("t1").await.unwrap().unwrap();
        assert_eq!(stored.description, "remote wins");
        assert_eq!(stored.updated_at, remote_row.updated_at);
        assert_eq!(stored.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn pull_advances_the_cursor_to_now_even_with_no_rows() {
        let sync_state = Arc::new(MemorySyncState::default());
        let reconciler = reconciler_with(
            Arc::new(MemoryTransactionRepository::default()),
            Arc::new(MockRemoteStore::default()),
            sync_state.clone(),
        );

        let before = time::now_epoch_millis();
        reconciler.pull().await.unwrap();
        let cursor = sync_state.get_cursor().await.unwrap().unwrap();
        assert!(cursor >= before);
    }

    #[tokio::test]
    async fn pull_only_requests_rows_after_the_stored_cursor() {
        let sync_state = Arc::new(MemorySyncState::default());
        sync_state.set_cursor(1_700_000_000_000).await.unwrap();
        let remote = Arc::new(MockRemoteStore::default());
        let reconciler = reconciler_with(
            Arc::new(MemoryTransactionRepository::default()),
            remote.clone(),
            sync_state,
        );

        reconciler.pull().await.unwrap();
        assert_eq!(remote.last_pull_cursor(), Some(1_700_000_000_000));
    }

    #[tokio::test]
    async fn failed_pull_does_not_advance_the_cursor() {
        let sync_state = Arc::new(MemorySyncState::default());
        sync_state.set_cursor(42).await.unwrap();
        let remote = Arc::new(MockRemoteStore::default());
        remote.fail_next_select();

        let reconciler = reconciler_with(
            Arc::new(MemoryTransactionRepository::default()),
            remote,
            sync_state.clone(),
        );
        assert!(reconciler.pull().await.is_err());
        assert_eq!(sync_state.get_cursor().await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn sync_skips_pull_when_push_fails() {
        let repo = Arc::new(MemoryTransactionRepository::default());
        repo.insert(sample_transaction("t1", "u1")).await.unwrap();
        let remote = Arc::new(MockRemoteStore::default());
        remote.fail_next_upsert();
        let sync_state = Arc::new(MemorySyncState::default());

        let reconciler = reconciler_with(repo, remote.clone(), sync_state.clone());
        assert!(reconciler.sync().await.is_err());

        assert_eq!(remote.pull_calls(), 0);
        assert_eq!(sync_state.get_cursor().await.unwrap(), None);
    }

    fn reconciler_with_settings(
        settings_repo: Arc<MemorySettingsRepository>,
        remote: Arc<MockRemoteStore>,
    ) -> SyncReconciler {
        SyncReconciler::new(
            Arc::new(MemoryTransactionRepository::default()),
            settings_repo,
            Arc::new(MemorySyncState::default()),
            remote,
            UserIdentity::authenticated("u1"),
        )
    }

    #[tokio::test]
    async fn settings_push_uploads_and_flips_the_pending_row() {
        let settings_repo = Arc::new(MemorySettingsRepository::default());
        settings_repo
            .upsert_pending(Settings::defaults_for("u1"))
            .await
            .unwrap();
        let remote = Arc::new(MockRemoteStore::default());

        let reconciler = reconciler_with_settings(settings_repo.clone(), remote.clone());
        let pushed = reconciler.push().await.unwrap();

        assert_eq!(pushed, 1);
        assert_eq!(remote.settings_upserts().len(), 1);
        let stored = settings_repo.get("u1").await.unwrap().unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn settings_edit_during_the_push_keeps_its_content_and_stays_pending() {
        let settings_repo = Arc::new(MemorySettingsRepository::default());
        let mut seeded = Settings::defaults_for("u1");
        seeded.currency = "USD".to_string();
        settings_repo.upsert_pending(seeded).await.unwrap();

        let remote = Arc::new(MockRemoteStore::default());
        let repo_for_hook = Arc::clone(&settings_repo);
        remote.set_on_settings_upsert(move || {
            let mut edit = Settings::defaults_for("u1");
            edit.currency = "EUR".to_string();
            edit.updated_at = "2030-01-01T00:00:00.000Z".to_string();
            repo_for_hook.upsert_pending_sync(edit);
        });

        let reconciler = reconciler_with_settings(settings_repo.clone(), remote.clone());
        reconciler.push().await.unwrap();

        // the snapshot that was in flight went up
        assert_eq!(remote.settings_upserts()[0].currency, "USD");
        // the mid-push edit is neither reverted nor marked synced
        let stored = settings_repo.get("u1").await.unwrap().unwrap();
        assert_eq!(stored.currency, "EUR");
        assert_eq!(stored.sync_status, SyncStatus::Pending);
        assert_eq!(stored.updated_at, "2030-01-01T00:00:00.000Z");
    }

    // Documents the accepted broad-flip race: a row created while the upload
    // is in flight is flipped to synced without ever being uploaded.
    #[tokio::test]
    async fn broad_status_flip_marks_rows_created_during_the_push() {
        let repo = Arc::new(MemoryTransactionRepository::default());
        repo.insert(sample_transaction("t1", "u1")).await.unwrap();

        let remote = Arc::new(MockRemoteStore::default());
        let repo_for_hook = Arc::clone(&repo);
        remote.set_on_upsert(move || {
            repo_for_hook.insert_sync(sample_transaction("t2-mid-push", "u1"));
        });

        let reconciler = reconciler_with(repo.clone(), remote.clone(), Arc::new(MemorySyncState::default()));
        reconciler.push().await.unwrap();

        let mid_push = repo.get_any("t2-mid-push").await.unwrap().unwrap();
        assert_eq!(mid_push.sync_status, SyncStatus::Synced);
        let uploaded: Vec<Transaction> = remote.uploaded_transactions();
        assert!(!uploaded.iter().any(|tx| tx.id == "t2-mid-push"));
    }
}
