//! Process-wide service runtime.
//!
//! Built once at startup and torn down on sign-out. Platform capability is
//! decided here: when local store handles are supplied the runtime wires the
//! local-first strategy plus the reconciler and connectivity scheduler; when
//! they are absent every operation goes straight to the remote store and no
//! background sync machinery exists.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::errors::Result;
use crate::identity::UserIdentity;
use crate::settings::{LocalSettingsStores, SettingsRepositoryTrait, SettingsService};
use crate::sync::{
    ConnectivityScheduler, RemoteStore, SyncHealth, SyncReconciler, SyncStateRepositoryTrait,
};
use crate::transactions::{
    LocalFirstStrategy, RemoteOnlyStrategy, StorageStrategy, TransactionRepositoryTrait,
    TransactionService,
};

/// Store handles present on platforms with an embedded database.
#[derive(Clone)]
pub struct LocalStores {
    pub transactions: Arc<dyn TransactionRepositoryTrait>,
    pub settings: Arc<dyn SettingsRepositoryTrait>,
    pub sync_state: Arc<dyn SyncStateRepositoryTrait>,
}

pub struct SyncRuntimeConfig {
    pub identity: UserIdentity,
    pub remote: Arc<dyn RemoteStore>,
    pub local: Option<LocalStores>,
}

pub struct SyncRuntime {
    identity: UserIdentity,
    transactions: Arc<TransactionService>,
    settings: Arc<SettingsService>,
    reconciler: Option<Arc<SyncReconciler>>,
    scheduler: Option<Arc<ConnectivityScheduler>>,
    health: Option<watch::Receiver<SyncHealth>>,
    background_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncRuntime {
    pub fn init(config: SyncRuntimeConfig) -> Arc<Self> {
        let SyncRuntimeConfig {
            identity,
            remote,
            local,
        } = config;

        let mut reconciler = None;
        let mut scheduler = None;
        let mut health = None;

        let (strategy, settings): (Arc<dyn StorageStrategy>, Arc<SettingsService>) = match local {
            Some(local) => {
                let rec = Arc::new(SyncReconciler::new(
                    local.transactions.clone(),
                    local.settings.clone(),
                    local.sync_state.clone(),
                    remote.clone(),
                    identity.clone(),
                ));
                let (sched, health_rx) = ConnectivityScheduler::new(rec.clone());
                let settings = Arc::new(SettingsService::new(
                    Some(LocalSettingsStores {
                        repo: local.settings.clone(),
                        sync_state: local.sync_state.clone(),
                    }),
                    remote,
                    Some(rec.clone()),
                    identity.clone(),
                ));
                let strategy: Arc<dyn StorageStrategy> =
                    Arc::new(LocalFirstStrategy::new(local.transactions, rec.clone()));
                reconciler = Some(rec);
                scheduler = Some(sched);
                health = Some(health_rx);
                (strategy, settings)
            }
            None => {
                let settings = Arc::new(SettingsService::new(
                    None,
                    remote.clone(),
                    None,
                    identity.clone(),
                ));
                (Arc::new(RemoteOnlyStrategy::new(remote)), settings)
            }
        };

        let transactions = Arc::new(TransactionService::new(
            strategy,
            settings.clone(),
            identity.clone(),
        ));

        Arc::new(Self {
            identity,
            transactions,
            settings,
            reconciler,
            scheduler,
            health,
            background_task: Mutex::new(None),
        })
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn transactions(&self) -> Arc<TransactionService> {
        self.transactions.clone()
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        self.settings.clone()
    }

    /// `None` on remote-only platforms.
    pub fn reconciler(&self) -> Option<Arc<SyncReconciler>> {
        self.reconciler.clone()
    }

    /// Health signal of the background sync loop, `None` on remote-only
    /// platforms.
    pub fn sync_health(&self) -> Option<watch::Receiver<SyncHealth>> {
        self.health.clone()
    }

    /// Run the startup loads: settings merge first, because transaction
    /// validation reads the live category list, then the transaction list.
    pub async fn bootstrap(&self) -> Result<()> {
        self.settings.load().await?;
        self.transactions.load().await?;
        Ok(())
    }

    /// Start the connectivity-driven sync loop. No-op on remote-only
    /// platforms; calling it twice replaces the previous watcher task.
    pub async fn start(&self, connectivity: watch::Receiver<bool>) {
        let Some(scheduler) = &self.scheduler else {
            return;
        };
        let mut slot = self.background_task.lock().await;
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(scheduler.spawn(connectivity));
    }

    /// Sign-out: stop the background loop and drop per-user in-memory state.
    /// Persistent stores are left untouched.
    pub async fn teardown(&self) {
        if let Some(task) = self.background_task.lock().await.take() {
            task.abort();
        }
        self.transactions.clear();
        self.settings.reset();
    }
}
