// ── Subscription bus ──
//
// Callback fan-out for store mutations. Every mutation hands every
// listener the full snapshot it produced; there is no per-entity topic.
// Snapshots are queued in version order and delivered by one drainer at a
// time, so listeners never see an older snapshot after a newer one.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use dashmap::DashMap;
use tracing::trace;

use super::StoreSnapshot;

type Listener = dyn Fn(&Arc<StoreSnapshot>) + Send + Sync;

struct BusInner {
    next_id: AtomicU64,
    listeners: DashMap<u64, Arc<Listener>>,
}

#[derive(Default)]
struct Outbox {
    pending: VecDeque<Arc<StoreSnapshot>>,
    draining: bool,
}

/// Registry of snapshot listeners.
pub(crate) struct SubscriptionBus {
    inner: Arc<BusInner>,
    outbox: Mutex<Outbox>,
}

/// Clears the draining flag when a listener panics mid-drain. On normal
/// exit the flag is cleared under the same lock that saw the queue empty.
struct DrainGuard<'a>(&'a Mutex<Outbox>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .draining = false;
        }
    }
}

impl SubscriptionBus {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                listeners: DashMap::new(),
            }),
            outbox: Mutex::new(Outbox::default()),
        }
    }

    pub(crate) fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<StoreSnapshot>) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.insert(id, Arc::new(listener));
        trace!(subscription = id, "listener registered");
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Queue a snapshot for delivery. Call with the store's write lock held
    /// so the queue order matches version order.
    pub(crate) fn enqueue(&self, snapshot: Arc<StoreSnapshot>) {
        self.lock_outbox().pending.push_back(snapshot);
    }

    /// Deliver queued snapshots in order.
    ///
    /// If another caller (another thread, or a listener further up this
    /// thread's stack) is already draining, return at once: that caller
    /// delivers whatever was queued here.
    pub(crate) fn flush(&self) {
        {
            let mut outbox = self.lock_outbox();
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }
        let _guard = DrainGuard(&self.outbox);
        loop {
            let next = {
                let mut outbox = self.lock_outbox();
                match outbox.pending.pop_front() {
                    Some(snapshot) => snapshot,
                    None => {
                        outbox.draining = false;
                        return;
                    }
                }
            };
            self.publish(&next);
        }
    }

    fn lock_outbox(&self) -> std::sync::MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Call every listener once with `snapshot`, in registration order.
    ///
    /// Listeners are collected before any is called, so a listener may
    /// subscribe, unsubscribe, or mutate the store without deadlocking.
    fn publish(&self, snapshot: &Arc<StoreSnapshot>) {
        let mut listeners: Vec<(u64, Arc<Listener>)> = self
            .inner
            .listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        listeners.sort_unstable_by_key(|(id, _)| *id);

        trace!(
            version = snapshot.version(),
            listeners = listeners.len(),
            "publishing snapshot"
        );
        for (_, listener) in listeners {
            listener(snapshot);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.listeners.len()
    }
}

/// Handle for a registered listener.
///
/// Unsubscribes when dropped or when [`unsubscribe`](Self::unsubscribe) is
/// called, whichever comes first; ownership guarantees it happens once.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.listeners.remove(&self.id);
            trace!(subscription = self.id, "listener removed");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
