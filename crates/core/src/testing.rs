//! In-memory collaborators shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::categories::TransactionKind;
use crate::errors::{DatabaseError, Error, Result};
use crate::settings::{Settings, SettingsRepositoryTrait};
use crate::sync::{RemoteStore, SyncStateRepositoryTrait, SyncStatus};
use crate::time;
use crate::transactions::{Transaction, TransactionRepositoryTrait};

pub fn sample_transaction(id: &str, user_id: &str) -> Transaction {
    Transaction {
        id: id.to_string(),
        amount: Decimal::new(4999, 2),
        description: "Coffee".to_string(),
        date: "2024-03-01T08:00:00.000Z".to_string(),
        category: "Food".to_string(),
        kind: TransactionKind::Expense,
        user_id: user_id.to_string(),
        created_at: "2024-03-01T08:00:00.000Z".to_string(),
        updated_at: "2024-03-01T08:00:00.000Z".to_string(),
        sync_status: SyncStatus::Pending,
        deleted: false,
    }
}

fn date_millis(tx: &Transaction) -> i64 {
    time::rfc3339_to_epoch_millis(&tx.date).unwrap_or(0)
}

#[derive(Default)]
pub struct MemoryTransactionRepository {
    rows: Mutex<HashMap<String, Transaction>>,
    fail_writes: AtomicBool,
}

impl MemoryTransactionRepository {
    /// Simulate a disk failure on every subsequent mutation.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Synchronous insert used to interleave writes inside mock callbacks.
    pub fn insert_sync(&self, mut tx: Transaction) {
        tx.sync_status = SyncStatus::Pending;
        self.rows.lock().unwrap().insert(tx.id.clone(), tx);
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Database(DatabaseError::Internal(
                "simulated disk failure".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionRepositoryTrait for MemoryTransactionRepository {
    async fn load(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let rows = self.rows.lock().unwrap();
        let mut live: Vec<Transaction> = rows
            .values()
            .filter(|tx| tx.user_id == user_id && !tx.deleted)
            .cloned()
            .collect();
        live.sort_by_key(|tx| std::cmp::Reverse(date_millis(tx)));
        Ok(live)
    }

    async fn insert(&self, mut tx: Transaction) -> Result<()> {
        self.check_write()?;
        tx.sync_status = SyncStatus::Pending;
        tx.updated_at = time::now_rfc3339();
        self.rows.lock().unwrap().insert(tx.id.clone(), tx);
        Ok(())
    }

    async fn update(&self, mut tx: Transaction) -> Result<()> {
        self.check_write()?;
        tx.sync_status = SyncStatus::Pending;
        tx.updated_at = time::now_rfc3339();
        self.rows.lock().unwrap().insert(tx.id.clone(), tx);
        Ok(())
    }

    async fn soft_delete(&self, id: &str) -> Result<()> {
        self.check_write()?;
        let mut rows = self.rows.lock().unwrap();
        if let Some(tx) = rows.get_mut(id) {
            tx.deleted = true;
            tx.sync_status = SyncStatus::Pending;
            tx.updated_at = time::now_rfc3339();
        }
        Ok(())
    }

    async fn upsert_synced(&self, mut tx: Transaction) -> Result<()> {
        tx.sync_status = SyncStatus::Synced;
        self.rows.lock().unwrap().insert(tx.id.clone(), tx);
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<Transaction>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|tx| tx.sync_status == SyncStatus::Pending)
            .cloned()
            .collect())
    }

    async fn mark_all_pending_synced(&self) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        let mut flipped = 0;
        for tx in rows.values_mut() {
            if tx.sync_status == SyncStatus::Pending {
                tx.sync_status = SyncStatus::Synced;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn get_any(&self, id: &str) -> Result<Option<Transaction>> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }
}

#[derive(Default)]
pub struct MemorySettingsRepository {
    row: Mutex<Option<Settings>>,
}

impl MemorySettingsRepository {
    /// Synchronous pending write used to interleave edits inside mock
    /// callbacks. Keeps `updated_at` as given so tests control it.
    pub fn upsert_pending_sync(&self, mut settings: Settings) {
        settings.sync_status = SyncStatus::Pending;
        *self.row.lock().unwrap() = Some(settings);
    }
}

#[async_trait]
impl SettingsRepositoryTrait for MemorySettingsRepository {
    async fn get(&self, user_id: &str) -> Result<Option<Settings>> {
        Ok(self
            .row
            .lock()
            .unwrap()
            .clone()
            .filter(|settings| settings.user_id == user_id))
    }

    async fn upsert_pending(&self, mut settings: Settings) -> Result<()> {
        settings.sync_status = SyncStatus::Pending;
        settings.updated_at = time::now_rfc3339();
        *self.row.lock().unwrap() = Some(settings);
        Ok(())
    }

    async fn upsert_synced(&self, mut settings: Settings) -> Result<()> {
        settings.sync_status = SyncStatus::Synced;
        *self.row.lock().unwrap() = Some(settings);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySyncState {
    cursor: Mutex<Option<i64>>,
    legacy: Mutex<Option<String>>,
}

impl MemorySyncState {
    pub fn set_legacy_settings(&self, blob: String) {
        *self.legacy.lock().unwrap() = Some(blob);
    }
}

#[async_trait]
impl SyncStateRepositoryTrait for MemorySyncState {
    async fn get_cursor(&self) -> Result<Option<i64>> {
        Ok(*self.cursor.lock().unwrap())
    }

    async fn set_cursor(&self, cursor_millis: i64) -> Result<()> {
        *self.cursor.lock().unwrap() = Some(cursor_millis);
        Ok(())
    }

    async fn get_legacy_settings(&self) -> Result<Option<String>> {
        Ok(self.legacy.lock().unwrap().clone())
    }
}

type UpsertHook = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct MockRemoteStore {
    transactions: Mutex<HashMap<String, Transaction>>,
    uploaded: Mutex<Vec<Transaction>>,
    settings_row: Mutex<Option<Value>>,
    settings_upserts: Mutex<Vec<Settings>>,
    upsert_batches: AtomicUsize,
    pull_calls: AtomicUsize,
    last_pull_cursor: Mutex<Option<i64>>,
    fail_next_upsert: AtomicBool,
    fail_all_upserts: AtomicBool,
    fail_next_select: AtomicBool,
    on_upsert: Mutex<Option<UpsertHook>>,
    on_settings_upsert: Mutex<Option<UpsertHook>>,
    deleted_ids: Mutex<Vec<String>>,
}

impl MockRemoteStore {
    pub fn seed_transaction(&self, tx: Transaction) {
        self.transactions.lock().unwrap().insert(tx.id.clone(), tx);
    }

    pub fn set_settings_row(&self, raw: Value) {
        *self.settings_row.lock().unwrap() = Some(raw);
    }

    pub fn fail_next_upsert(&self) {
        self.fail_next_upsert.store(true, Ordering::SeqCst);
    }

    /// Refuse every upsert, keeping local rows pending. Used where a test
    /// must observe pre-push state without racing a background push.
    pub fn fail_all_upserts(&self) {
        self.fail_all_upserts.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_select(&self) {
        self.fail_next_select.store(true, Ordering::SeqCst);
    }

    /// Callback invoked while an upsert batch is "in flight", before it is
    /// acknowledged. Used to interleave local writes with a push.
    pub fn set_on_upsert(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_upsert.lock().unwrap() = Some(Box::new(hook));
    }

    /// Same, for the settings upload.
    pub fn set_on_settings_upsert(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_settings_upsert.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn transaction_upsert_batches(&self) -> usize {
        self.upsert_batches.load(Ordering::SeqCst)
    }

    pub fn pull_calls(&self) -> usize {
        self.pull_calls.load(Ordering::SeqCst)
    }

    pub fn last_pull_cursor(&self) -> Option<i64> {
        *self.last_pull_cursor.lock().unwrap()
    }

    pub fn uploaded_transactions(&self) -> Vec<Transaction> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn settings_upserts(&self) -> Vec<Settings> {
        self.settings_upserts.lock().unwrap().clone()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted_ids.lock().unwrap().clone()
    }

    pub fn stored_transaction(&self, id: &str) -> Option<Transaction> {
        self.transactions.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn upsert_transactions(&self, rows: Vec<Transaction>) -> Result<()> {
        if self.fail_all_upserts.load(Ordering::SeqCst)
            || self.fail_next_upsert.swap(false, Ordering::SeqCst)
        {
            return Err(Error::remote("simulated upsert failure"));
        }
        if let Some(hook) = self.on_upsert.lock().unwrap().as_ref() {
            hook();
        }
        self.upsert_batches.fetch_add(1, Ordering::SeqCst);
        let mut uploaded = self.uploaded.lock().unwrap();
        let mut stored = self.transactions.lock().unwrap();
        for tx in rows {
            uploaded.push(tx.clone());
            stored.insert(tx.id.clone(), tx);
        }
        Ok(())
    }

    async fn select_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        if self.fail_next_select.swap(false, Ordering::SeqCst) {
            return Err(Error::remote("simulated select failure"));
        }
        let rows = self.transactions.lock().unwrap();
        let mut live: Vec<Transaction> = rows
            .values()
            .filter(|tx| tx.user_id == user_id && !tx.deleted)
            .cloned()
            .collect();
        live.sort_by_key(|tx| std::cmp::Reverse(date_millis(tx)));
        Ok(live)
    }

    async fn select_transactions_updated_after(
        &self,
        user_id: &str,
        cursor_millis: i64,
    ) -> Result<Vec<Transaction>> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_pull_cursor.lock().unwrap() = Some(cursor_millis);
        if self.fail_next_select.swap(false, Ordering::SeqCst) {
            return Err(Error::remote("simulated select failure"));
        }
        let rows = self.transactions.lock().unwrap();
        Ok(rows
            .values()
            .filter(|tx| {
                tx.user_id == user_id
                    && time::rfc3339_to_epoch_millis(&tx.updated_at).unwrap_or(0) > cursor_millis
            })
            .cloned()
            .collect())
    }

    async fn delete_transaction(&self, _user_id: &str, id: &str) -> Result<()> {
        self.transactions.lock().unwrap().remove(id);
        self.deleted_ids.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn get_settings(&self, _user_id: &str) -> Result<Option<Value>> {
        Ok(self.settings_row.lock().unwrap().clone())
    }

    async fn upsert_settings(&self, settings: Settings) -> Result<()> {
        if let Some(hook) = self.on_settings_upsert.lock().unwrap().as_ref() {
            hook();
        }
        self.settings_upserts.lock().unwrap().push(settings.clone());
        if let Ok(raw) = serde_json::to_value(&settings) {
            *self.settings_row.lock().unwrap() = Some(raw);
        }
        Ok(())
    }
}
