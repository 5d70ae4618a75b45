use std::sync::{Arc, Mutex, PoisonError};

use chrono::Duration;
use civic_api::Gateway;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::loader;
use crate::model::{ConstituencyStats, DashboardStats, EntityKind, MlaStats};
use crate::store::{DataStore, EntityMeta, EntityTable, StoreSnapshot, Subscription};

type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

const STATS_KINDS: [EntityKind; 3] = [
    EntityKind::DashboardStats,
    EntityKind::ConstituencyStats,
    EntityKind::MlaStats,
];

/// The statistics slice of a snapshot, for change detection.
struct StatsSlice {
    dashboard: Option<Arc<DashboardStats>>,
    constituency: EntityTable<ConstituencyStats>,
    mla: EntityTable<MlaStats>,
    metas: Vec<EntityMeta>,
}

impl StatsSlice {
    fn of(snapshot: &StoreSnapshot) -> Self {
        Self {
            dashboard: snapshot.dashboard_stats(),
            constituency: snapshot.constituency_stats().clone(),
            mla: snapshot.mla_stats().clone(),
            metas: STATS_KINDS
                .iter()
                .map(|&kind| snapshot.meta(kind).clone())
                .collect(),
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        let dashboard = match (&self.dashboard, &other.dashboard) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        dashboard
            && self.constituency.same_rows(&other.constituency)
            && self.mla.same_rows(&other.mla)
            && self.metas == other.metas
    }
}

#[derive(Debug, Default)]
struct LocalState {
    loading: bool,
    error: Option<String>,
}

/// A mounted view of dashboard and per-record statistics.
///
/// Fetch failures are recorded (locally and in the store's metadata for
/// the matching kind) rather than returned.
pub struct StatsBinding {
    store: Arc<DataStore>,
    gateway: Arc<dyn Gateway>,
    local: Mutex<LocalState>,
    on_change: ChangeCallback,
    _subscription: Subscription,
}

impl StatsBinding {
    pub fn mount<F>(store: Arc<DataStore>, gateway: Arc<dyn Gateway>, on_change: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let on_change: ChangeCallback = Arc::new(on_change);
        let last = Mutex::new(StatsSlice::of(&store.snapshot()));
        let notify = Arc::clone(&on_change);
        let subscription = store.subscribe(move |snapshot| {
            let next = StatsSlice::of(snapshot);
            let changed = {
                let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
                if last.same_as(&next) {
                    false
                } else {
                    *last = next;
                    true
                }
            };
            if changed {
                notify();
            }
        });
        Self {
            store,
            gateway,
            local: Mutex::new(LocalState::default()),
            on_change,
            _subscription: subscription,
        }
    }

    pub fn unmount(self) {
        debug!("stats binding unmounted");
    }

    pub fn dashboard(&self) -> Option<Arc<DashboardStats>> {
        self.store.dashboard_stats()
    }

    pub fn constituency(&self, constituency_id: &str) -> Option<Arc<ConstituencyStats>> {
        self.store.constituency_stats(constituency_id)
    }

    pub fn mla(&self, mla_id: &str) -> Option<Arc<MlaStats>> {
        self.store.mla_stats(mla_id)
    }

    pub fn is_loading(&self) -> bool {
        self.lock_local().loading || STATS_KINDS.iter().any(|&k| self.store.is_loading(k))
    }

    pub fn error(&self) -> Option<String> {
        let local = self.lock_local().error.clone();
        local.or_else(|| STATS_KINDS.iter().find_map(|&k| self.store.error(k)))
    }

    pub fn is_dashboard_stale(&self, max_age: Duration) -> bool {
        self.store.is_data_stale(EntityKind::DashboardStats, max_age)
    }

    pub async fn fetch_dashboard(&self) {
        let kind = EntityKind::DashboardStats;
        let result = self
            .tracked(kind, loader::load(&self.store, self.gateway.as_ref(), kind))
            .await;
        if let Err(e) = result {
            self.record_failure(kind, &e);
        }
    }

    /// Fetch and store one constituency's statistics.
    pub async fn fetch_constituency(&self, constituency_id: &str) {
        let kind = EntityKind::ConstituencyStats;
        let result = self
            .tracked(
                kind,
                loader::fetch_constituency_stats(self.gateway.as_ref(), constituency_id),
            )
            .await;
        match result {
            Ok(stats) => self.store.set_constituency_stats(constituency_id, stats),
            Err(e) => self.record_failure(kind, &e),
        }
    }

    /// Fetch and store one MLA's statistics.
    pub async fn fetch_mla(&self, mla_id: &str) {
        let kind = EntityKind::MlaStats;
        let result = self
            .tracked(kind, loader::fetch_mla_stats(self.gateway.as_ref(), mla_id))
            .await;
        match result {
            Ok(stats) => self.store.set_mla_stats(mla_id, stats),
            Err(e) => self.record_failure(kind, &e),
        }
    }

    async fn tracked<R>(
        &self,
        kind: EntityKind,
        call: impl Future<Output = Result<R, CoreError>>,
    ) -> Result<R, CoreError> {
        self.update_local(|s| {
            s.loading = true;
            s.error = None;
        });
        self.store.set_loading(kind, true);
        let result = call.await;
        self.store.set_loading(kind, false);
        self.update_local(|s| s.loading = false);
        result
    }

    fn record_failure(&self, kind: EntityKind, error: &CoreError) {
        warn!(entity = %kind, error = %error, "stats fetch failed");
        let message = error.to_string();
        self.store.set_error(kind, Some(message.clone()));
        self.update_local(|s| s.error = Some(message));
    }

    fn lock_local(&self) -> std::sync::MutexGuard<'_, LocalState> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_local(&self, f: impl FnOnce(&mut LocalState)) {
        f(&mut self.lock_local());
        (self.on_change)();
    }
}

impl std::fmt::Debug for StatsBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsBinding")
            .field("local", &*self.lock_local())
            .finish_non_exhaustive()
    }
}
