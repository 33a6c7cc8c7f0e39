//! Connectivity-triggered sync scheduler.
//!
//! Subscribes to network-reachability transitions and runs a reconciler
//! cycle whenever the device comes back online. Failures are logged and
//! retried on the next trigger; after enough consecutive failures the
//! exposed health flips to degraded so a UI can show a persistent-failure
//! indicator if it chooses to.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::sync::SyncReconciler;

/// Consecutive failed cycles before health degrades.
pub const DEGRADED_AFTER_CONSECUTIVE_FAILURES: u32 = 3;

/// Coarse sync-loop health for an optional UI indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncHealth {
    Ok,
    Degraded,
}

pub struct ConnectivityScheduler {
    reconciler: Arc<SyncReconciler>,
    health_tx: watch::Sender<SyncHealth>,
    consecutive_failures: AtomicU32,
}

impl ConnectivityScheduler {
    pub fn new(reconciler: Arc<SyncReconciler>) -> (Arc<Self>, watch::Receiver<SyncHealth>) {
        let (health_tx, health_rx) = watch::channel(SyncHealth::Ok);
        (
            Arc::new(Self {
                reconciler,
                health_tx,
                consecutive_failures: AtomicU32::new(0),
            }),
            health_rx,
        )
    }

    /// Run one cycle, updating the health signal.
    pub async fn run_cycle(&self) {
        match self.reconciler.sync().await {
            Ok(report) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
                let _ = self.health_tx.send(SyncHealth::Ok);
                debug!(
                    "[Sync] scheduled cycle pushed={} pulled={}",
                    report.pushed_count, report.pulled_count
                );
            }
            Err(err) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!("[Sync] cycle failed ({failures} consecutive): {err}");
                if failures >= DEGRADED_AFTER_CONSECUTIVE_FAILURES {
                    let _ = self.health_tx.send(SyncHealth::Degraded);
                }
            }
        }
    }

    /// Spawn the watcher task. An initial cycle runs when the device is
    /// already online at startup; afterwards a cycle runs on every
    /// offline-to-online transition.
    pub fn spawn(self: &Arc<Self>, mut connectivity: watch::Receiver<bool>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut was_online = *connectivity.borrow();
            if was_online {
                scheduler.run_cycle().await;
            }
            while connectivity.changed().await.is_ok() {
                let online = *connectivity.borrow();
                if online && !was_online {
                    scheduler.run_cycle().await;
                }
                was_online = online;
            }
        })
    }
}
