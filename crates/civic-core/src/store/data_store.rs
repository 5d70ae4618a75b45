// ── Central data store ──
//
// Single source of truth for fetched domain data. Writers are serialized
// and each produces a new immutable snapshot; readers load the current
// snapshot without blocking. Every mutation is broadcast to every
// listener exactly once.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tracing::debug;

use super::bus::{Subscription, SubscriptionBus};
use super::{EntityMeta, StoreEntity, StoreSnapshot};
use crate::clock::{Clock, SystemClock};
use crate::model::{
    Constituency, ConstituencyStats, ConstituencyWithMla, DashboardStats, EntityKind, Mla,
    MlaStats, MlaWithDetails, Party,
};
use crate::stream::StoreStream;

/// The normalized entity store.
///
/// Construct one per application (or per test) and share it behind an
/// `Arc` with the sync service, initializer, and bindings.
pub struct DataStore {
    current: ArcSwap<StoreSnapshot>,
    write_lock: Mutex<()>,
    bus: SubscriptionBus,
    changes: watch::Sender<Arc<StoreSnapshot>>,
    clock: Arc<dyn Clock>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let initial = Arc::new(StoreSnapshot::default());
        let (changes, _) = watch::channel(Arc::clone(&initial));
        Self {
            current: ArcSwap::new(initial),
            write_lock: Mutex::new(()),
            bus: SubscriptionBus::new(),
            changes,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Mutation core ────────────────────────────────────────────────

    /// Apply `f` to a copy of the current state, publish the result, and
    /// notify every listener once.
    ///
    /// Listeners run after the write lock is released. A mutation made from
    /// inside a listener, or concurrently on another thread, is delivered
    /// by whichever caller is already notifying, after the snapshot it is
    /// currently delivering.
    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut StoreSnapshot, DateTime<Utc>),
    {
        {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut next = StoreSnapshot::clone(&self.current.load());
            f(&mut next, self.clock.now());
            next.version += 1;
            let next = Arc::new(next);
            self.current.store(Arc::clone(&next));
            // `send_replace` updates even with zero receivers.
            self.changes.send_replace(Arc::clone(&next));
            self.bus.enqueue(next);
        }
        self.bus.flush();
    }

    // ── Generic entity operations ────────────────────────────────────

    /// Replace the whole collection for `T` and stamp `last_updated`.
    pub fn set_all<T: StoreEntity>(&self, items: Vec<T>) {
        let count = items.len();
        self.mutate(|state, now| {
            T::table_mut(state).replace_all(items);
            let meta = state.meta_mut(T::KIND);
            meta.last_updated = Some(now);
            meta.error = None;
        });
        debug!(entity = %T::KIND, count, "collection replaced");
    }

    /// Insert or replace one record by id.
    pub fn upsert<T: StoreEntity>(&self, item: T) {
        self.mutate(|state, _| {
            T::table_mut(state).upsert(item);
        });
    }

    /// Remove one record. Absent ids still count as a mutation.
    pub fn remove<T: StoreEntity>(&self, id: &str) {
        self.mutate(|state, _| {
            T::table_mut(state).remove(id);
        });
    }

    /// Remove several records in one mutation (one notification).
    pub fn remove_many<T: StoreEntity>(&self, ids: &[String]) {
        self.mutate(|state, _| {
            let table = T::table_mut(state);
            for id in ids {
                table.remove(id);
            }
        });
    }

    pub fn get<T: StoreEntity>(&self, id: &str) -> Option<Arc<T>> {
        self.current.load().table::<T>().get(id)
    }

    pub fn all<T: StoreEntity>(&self) -> Vec<Arc<T>> {
        self.current.load().table::<T>().to_vec()
    }

    // ── Constituencies ───────────────────────────────────────────────

    pub fn set_constituencies(&self, items: Vec<Constituency>) {
        self.set_all(items);
    }

    pub fn add_constituency(&self, item: Constituency) {
        self.upsert(item);
    }

    pub fn update_constituency(&self, item: Constituency) {
        self.upsert(item);
    }

    pub fn remove_constituency(&self, id: &str) {
        self.remove::<Constituency>(id);
    }

    pub fn constituency(&self, id: &str) -> Option<Arc<Constituency>> {
        self.get(id)
    }

    pub fn constituencies(&self) -> Vec<Arc<Constituency>> {
        self.all()
    }

    // ── MLAs ─────────────────────────────────────────────────────────

    pub fn set_mlas(&self, items: Vec<Mla>) {
        self.set_all(items);
    }

    pub fn add_mla(&self, item: Mla) {
        self.upsert(item);
    }

    pub fn update_mla(&self, item: Mla) {
        self.upsert(item);
    }

    pub fn remove_mla(&self, id: &str) {
        self.remove::<Mla>(id);
    }

    pub fn mla(&self, id: &str) -> Option<Arc<Mla>> {
        self.get(id)
    }

    pub fn mlas(&self) -> Vec<Arc<Mla>> {
        self.all()
    }

    // ── Parties ──────────────────────────────────────────────────────

    pub fn set_parties(&self, items: Vec<Party>) {
        self.set_all(items);
    }

    pub fn add_party(&self, item: Party) {
        self.upsert(item);
    }

    pub fn update_party(&self, item: Party) {
        self.upsert(item);
    }

    pub fn remove_party(&self, id: &str) {
        self.remove::<Party>(id);
    }

    pub fn party(&self, id: &str) -> Option<Arc<Party>> {
        self.get(id)
    }

    pub fn parties(&self) -> Vec<Arc<Party>> {
        self.all()
    }

    // ── Statistics ───────────────────────────────────────────────────

    pub fn set_dashboard_stats(&self, stats: DashboardStats) {
        self.mutate(|state, now| {
            state.dashboard_stats = Some(Arc::new(stats));
            let meta = state.meta_mut(EntityKind::DashboardStats);
            meta.last_updated = Some(now);
            meta.error = None;
        });
    }

    pub fn dashboard_stats(&self) -> Option<Arc<DashboardStats>> {
        self.current.load().dashboard_stats()
    }

    /// Store statistics under the constituency id they describe.
    pub fn set_constituency_stats(&self, constituency_id: &str, stats: ConstituencyStats) {
        self.mutate(|state, now| {
            state
                .constituency_stats
                .insert(constituency_id.to_owned(), stats);
            let meta = state.meta_mut(EntityKind::ConstituencyStats);
            meta.last_updated = Some(now);
            meta.error = None;
        });
    }

    pub fn constituency_stats(&self, constituency_id: &str) -> Option<Arc<ConstituencyStats>> {
        self.current.load().constituency_stats.get(constituency_id)
    }

    pub fn remove_constituency_stats(&self, constituency_id: &str) {
        self.remove::<ConstituencyStats>(constituency_id);
    }

    /// Store statistics under the MLA id they describe.
    pub fn set_mla_stats(&self, mla_id: &str, stats: MlaStats) {
        self.mutate(|state, now| {
            state.mla_stats.insert(mla_id.to_owned(), stats);
            let meta = state.meta_mut(EntityKind::MlaStats);
            meta.last_updated = Some(now);
            meta.error = None;
        });
    }

    pub fn mla_stats(&self, mla_id: &str) -> Option<Arc<MlaStats>> {
        self.current.load().mla_stats.get(mla_id)
    }

    pub fn remove_mla_stats(&self, mla_id: &str) {
        self.remove::<MlaStats>(mla_id);
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// Never fails, whatever the current state of `kind`.
    pub fn set_loading(&self, kind: EntityKind, loading: bool) {
        self.mutate(|state, _| state.meta_mut(kind).is_loading = loading);
    }

    pub fn set_error(&self, kind: EntityKind, error: Option<String>) {
        self.mutate(|state, _| state.meta_mut(kind).error = error);
    }

    pub fn meta(&self, kind: EntityKind) -> EntityMeta {
        self.current.load().meta(kind).clone()
    }

    pub fn is_loading(&self, kind: EntityKind) -> bool {
        self.current.load().meta(kind).is_loading
    }

    pub fn error(&self, kind: EntityKind) -> Option<String> {
        self.current.load().meta(kind).error.clone()
    }

    pub fn last_updated(&self, kind: EntityKind) -> Option<DateTime<Utc>> {
        self.current.load().meta(kind).last_updated
    }

    /// `true` if `kind` was never loaded or is older than `max_age`.
    ///
    /// The store never refetches on its own; callers decide what to do.
    pub fn is_data_stale(&self, kind: EntityKind, max_age: Duration) -> bool {
        self.current
            .load()
            .meta(kind)
            .is_stale(self.clock.now(), max_age)
    }

    /// Reset every collection and all metadata.
    pub fn clear_all(&self) {
        self.mutate(|state, _| {
            let version = state.version;
            *state = StoreSnapshot {
                version,
                ..StoreSnapshot::default()
            };
        });
        debug!("store cleared");
    }

    // ── Derived views (computed per call, never cached) ──────────────

    pub fn mla_with_details(&self, mla_id: &str) -> Option<MlaWithDetails> {
        self.current.load().mla_with_details(mla_id)
    }

    pub fn constituency_with_mla(&self, constituency_id: &str) -> Option<ConstituencyWithMla> {
        self.current.load().constituency_with_mla(constituency_id)
    }

    pub fn unassigned_constituencies(&self) -> Vec<Arc<Constituency>> {
        self.current.load().unassigned_constituencies()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// The current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.current.load_full()
    }

    /// Register a listener called once per mutation, in version order, with
    /// the snapshot that mutation produced.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<StoreSnapshot>) + Send + Sync + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.len()
    }

    /// Async view of the store. Unlike [`subscribe`](Self::subscribe),
    /// rapid mutations coalesce into the latest snapshot.
    pub fn watch(&self) -> StoreStream {
        StoreStream::new(self.changes.subscribe())
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
