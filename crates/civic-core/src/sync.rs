// ── Background sync service ──
//
// Periodically refetches the configured entity types and writes them into
// the store. One fetch per kind per cycle, all run concurrently; a failed
// kind keeps its previous data and never holds up its siblings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use civic_api::Gateway;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::loader::{self, Payload};
use crate::model::EntityKind;
use crate::store::DataStore;

/// Periodic and on-demand refresh of store collections.
///
/// Cheaply cloneable via `Arc<SyncInner>`. Must be started from within a
/// tokio runtime.
#[derive(Clone)]
pub struct SyncService {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    store: Arc<DataStore>,
    gateway: Arc<dyn Gateway>,
    config: ArcSwap<SyncConfig>,
    running: Mutex<Option<RunningTask>>,
    generations: Mutex<HashMap<EntityKind, Generation>>,
    cycles: AtomicU64,
    last_cycle: Mutex<Option<DateTime<Utc>>>,
}

struct RunningTask {
    cancel: CancellationToken,
    // Detached on stop so an in-flight cycle can finish its writes.
    _handle: JoinHandle<()>,
}

/// Fetch ordering for one entity kind.
#[derive(Debug, Default, Clone, Copy)]
struct Generation {
    issued: u64,
    written: u64,
}

/// Point-in-time view of the service, for "last synced" displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub running: bool,
    pub enabled: bool,
    pub interval: Duration,
    pub entities: Vec<EntityKind>,
    /// Completed cycles (timer-driven and `sync_now`).
    pub cycles: u64,
    pub last_cycle: Option<DateTime<Utc>>,
}

/// Per-kind outcome of one sync cycle.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub succeeded: Vec<EntityKind>,
    pub failed: Vec<(EntityKind, CoreError)>,
    /// Fetched fine but superseded by a newer result before writing.
    pub discarded: Vec<EntityKind>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

enum KindOutcome {
    Written(usize),
    Discarded,
}

impl SyncService {
    pub fn new(
        store: Arc<DataStore>,
        gateway: Arc<dyn Gateway>,
        config: SyncConfig,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(SyncInner {
                store,
                gateway,
                config: ArcSwap::from_pointee(config),
                running: Mutex::new(None),
                generations: Mutex::new(HashMap::new()),
                cycles: AtomicU64::new(0),
                last_cycle: Mutex::new(None),
            }),
        })
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn config(&self) -> Arc<SyncConfig> {
        self.inner.config.load_full()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the periodic timer. Syncs immediately, then every `interval`.
    ///
    /// No-op if already running or if the configuration is disabled.
    pub fn start(&self) {
        let mut running = self.lock_running();
        if running.is_some() {
            debug!("sync already running");
            return;
        }
        let config = self.inner.config.load();
        if !config.enabled {
            debug!("sync disabled, not starting");
            return;
        }
        *running = Some(self.spawn_loop(config.interval));
        info!(
            interval_ms = config.interval.as_millis(),
            entities = ?config.entities,
            "sync started"
        );
    }

    /// Stop scheduling further cycles. A cycle already in flight is not
    /// aborted and may still write its results. No-op if stopped.
    pub fn stop(&self) {
        if let Some(task) = self.lock_running().take() {
            task.cancel.cancel();
            info!("sync stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }

    /// Swap in a new configuration. If running, the old timer is cancelled
    /// and the new one spawned under the same lock, so exactly one timer
    /// exists at every point. A disabled config leaves the service stopped.
    pub fn configure(&self, config: SyncConfig) -> Result<(), CoreError> {
        config.validate()?;
        let mut running = self.lock_running();
        let enabled = config.enabled;
        let interval = config.interval;
        self.inner.config.store(Arc::new(config));

        if let Some(task) = running.take() {
            task.cancel.cancel();
            if enabled {
                *running = Some(self.spawn_loop(interval));
                info!(interval_ms = interval.as_millis(), "sync restarted with new config");
            } else {
                info!("sync stopped by new config");
            }
        }
        Ok(())
    }

    pub fn status(&self) -> SyncStatus {
        let config = self.inner.config.load();
        SyncStatus {
            running: self.is_running(),
            enabled: config.enabled,
            interval: config.interval,
            entities: config.entities.clone(),
            cycles: self.inner.cycles.load(Ordering::Relaxed),
            last_cycle: *self
                .inner
                .last_cycle
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<RunningTask>> {
        self.inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_loop(&self, interval: Duration) -> RunningTask {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sync_task(self.clone(), interval, cancel.clone()));
        RunningTask {
            cancel,
            _handle: handle,
        }
    }

    // ── Manual sync ──────────────────────────────────────────────────

    /// Run one full cycle over the configured entities now.
    pub async fn sync_now(&self) -> SyncReport {
        let current = self.inner.config.load_full();
        let config: &SyncConfig = &current;
        let outcomes = join_all(
            config
                .entities
                .iter()
                .map(|&kind| async move { (kind, self.sync_kind(kind, config).await) }),
        )
        .await;

        let mut report = SyncReport::default();
        for (kind, outcome) in outcomes {
            match outcome {
                Ok(KindOutcome::Written(_)) => report.succeeded.push(kind),
                Ok(KindOutcome::Discarded) => report.discarded.push(kind),
                Err(e) => report.failed.push((kind, e)),
            }
        }

        self.inner.cycles.fetch_add(1, Ordering::Relaxed);
        *self
            .inner
            .last_cycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(self.inner.store.now());
        debug!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "sync cycle complete"
        );
        report
    }

    /// Refresh one kind now, whether or not it is in the configured list.
    /// Returns the number of records written.
    pub async fn sync_entity_now(&self, kind: EntityKind) -> Result<usize, CoreError> {
        if !kind.is_syncable() {
            return Err(CoreError::config(format!(
                "{kind} cannot be loaded as a collection"
            )));
        }
        let config = self.inner.config.load_full();
        match self.sync_kind(kind, &config).await? {
            KindOutcome::Written(count) => Ok(count),
            KindOutcome::Discarded => Ok(0),
        }
    }

    pub async fn sync_constituencies_now(&self) -> Result<usize, CoreError> {
        self.sync_entity_now(EntityKind::Constituencies).await
    }

    pub async fn sync_mlas_now(&self) -> Result<usize, CoreError> {
        self.sync_entity_now(EntityKind::Mlas).await
    }

    pub async fn sync_parties_now(&self) -> Result<usize, CoreError> {
        self.sync_entity_now(EntityKind::Parties).await
    }

    pub async fn sync_dashboard_stats_now(&self) -> Result<usize, CoreError> {
        self.sync_entity_now(EntityKind::DashboardStats).await
    }

    // ── Per-kind fetch and write ─────────────────────────────────────

    async fn sync_kind(
        &self,
        kind: EntityKind,
        config: &SyncConfig,
    ) -> Result<KindOutcome, CoreError> {
        let ticket = self.issue(kind);
        match loader::fetch(self.inner.gateway.as_ref(), kind).await {
            Ok(payload) => {
                let count = payload.len();
                if !self.write(kind, ticket, payload, config.reject_stale_results) {
                    debug!(entity = %kind, ticket, "discarding superseded sync result");
                    return Ok(KindOutcome::Discarded);
                }
                debug!(entity = %kind, count, "entity synced");
                if let Some(ref on_success) = config.on_success {
                    on_success(kind);
                }
                Ok(KindOutcome::Written(count))
            }
            Err(e) => {
                warn!(entity = %kind, error = %e, "entity sync failed");
                self.inner.store.set_error(kind, Some(e.to_string()));
                if let Some(ref on_error) = config.on_error {
                    on_error(kind, &e);
                }
                Err(e)
            }
        }
    }

    fn issue(&self, kind: EntityKind) -> u64 {
        let mut generations = self
            .inner
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let generation = generations.entry(kind).or_default();
        generation.issued += 1;
        generation.issued
    }

    /// Write `payload` unless stale results are rejected and a newer one
    /// already landed. The lock is held across the store write so two
    /// results for the same kind cannot land out of order.
    fn write(&self, kind: EntityKind, ticket: u64, payload: Payload, reject_stale: bool) -> bool {
        let mut generations = self
            .inner
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let generation = generations.entry(kind).or_default();
        if reject_stale && ticket < generation.written {
            return false;
        }
        generation.written = generation.written.max(ticket);
        payload.apply(&self.inner.store);
        true
    }
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

// ── Background task ──────────────────────────────────────────────────

/// Run a cycle on every tick until cancelled. The first tick fires
/// immediately.
async fn sync_task(service: SyncService, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let report = service.sync_now().await;
                if !report.is_success() {
                    debug!(failed = report.failed.len(), "periodic sync had failures");
                }
            }
        }
    }
    debug!("sync task exited");
}
