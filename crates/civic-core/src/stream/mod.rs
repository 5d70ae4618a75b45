// ── Async store streams ──
//
// Watch-channel subscription for async consumers (render loops, tasks).
// Unlike bus listeners, watchers only ever see the latest snapshot.

mod filter;

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::StoreSnapshot;

pub use filter::{ConstituencyFilter, MlaFilter};

/// Async handle on the store, returned by [`DataStore::watch`].
///
/// Several mutations between two awaits coalesce into one wake-up with
/// the newest snapshot.
///
/// [`DataStore::watch`]: crate::DataStore::watch
pub struct StoreStream {
    receiver: watch::Receiver<Arc<StoreSnapshot>>,
}

impl StoreStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<StoreSnapshot>>) -> Self {
        Self { receiver }
    }

    /// Newest published snapshot, whether or not it has been awaited.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.receiver.borrow())
    }

    /// Resolves once the store publishes something this handle has not
    /// yet returned. `None` after the store is dropped.
    pub async fn changed(&mut self) -> Option<Arc<StoreSnapshot>> {
        self.receiver.changed().await.ok()?;
        Some(Arc::clone(&self.receiver.borrow_and_update()))
    }

    /// Snapshot stream for `StreamExt` combinators: the snapshot at the
    /// time of the call, then one item per observed change.
    pub fn into_stream(self) -> impl Stream<Item = Arc<StoreSnapshot>> + Send + Unpin {
        WatchStream::new(self.receiver)
    }
}

impl std::fmt::Debug for StoreStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreStream")
            .field("version", &self.receiver.borrow().version())
            .finish()
    }
}
