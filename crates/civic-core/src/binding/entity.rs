use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Duration;
use civic_api::{Gateway, WriteVerb, fetch_list, send_data, send_delete};
use futures_util::future::join_all;
use tracing::{debug, warn};

use super::{BoundEntity, ListParams};
use crate::error::CoreError;
use crate::model::{Constituency, ConstituencyWithMla, Mla, MlaWithDetails, Party};
use crate::store::{DataStore, EntityMeta, EntityTable, StoreSnapshot, Subscription};
use crate::stream::{ConstituencyFilter, MlaFilter};

type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct LocalState {
    loading: bool,
    error: Option<String>,
}

/// A mounted view of one entity collection.
///
/// `on_change` runs whenever this collection or its metadata changes, or
/// the binding's own loading/error state does. Dropping the binding
/// unsubscribes it from the store.
pub struct EntityBinding<T: BoundEntity> {
    store: Arc<DataStore>,
    gateway: Arc<dyn Gateway>,
    local: Mutex<LocalState>,
    on_change: ChangeCallback,
    _subscription: Subscription,
    _entity: PhantomData<fn() -> T>,
}

impl<T: BoundEntity> EntityBinding<T> {
    pub fn mount<F>(store: Arc<DataStore>, gateway: Arc<dyn Gateway>, on_change: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let on_change: ChangeCallback = Arc::new(on_change);
        let subscription = subscribe_slice::<T>(&store, Arc::clone(&on_change));
        debug!(entity = %T::KIND, "binding mounted");
        Self {
            store,
            gateway,
            local: Mutex::new(LocalState::default()),
            on_change,
            _subscription: subscription,
            _entity: PhantomData,
        }
    }

    /// Unsubscribe now rather than at drop.
    pub fn unmount(self) {
        debug!(entity = %T::KIND, "binding unmounted");
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn items(&self) -> Vec<Arc<T>> {
        self.store.all::<T>()
    }

    pub fn get_by_id(&self, id: &str) -> Option<Arc<T>> {
        self.store.get::<T>(id)
    }

    /// Loading if this binding or anyone else is loading the collection.
    pub fn is_loading(&self) -> bool {
        self.lock_local().loading || self.store.is_loading(T::KIND)
    }

    /// This binding's last error, else the collection's load error.
    pub fn error(&self) -> Option<String> {
        let local = self.lock_local().error.clone();
        local.or_else(|| self.store.error(T::KIND))
    }

    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.store.is_data_stale(T::KIND, max_age)
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch the collection and replace it in the store.
    ///
    /// Failure is recorded in both local and store error state and is not
    /// returned; read it back through [`error`](Self::error).
    pub async fn fetch(&self, params: &ListParams) {
        let kind = T::KIND;
        self.update_local(|s| {
            s.loading = true;
            s.error = None;
        });
        self.store.set_loading(kind, true);

        let result = fetch_list::<T>(self.gateway.as_ref(), kind.path(), &params.to_query())
            .await
            .map_err(CoreError::from);

        match result {
            Ok(items) => {
                debug!(entity = %kind, count = items.len(), "binding fetched");
                self.store.set_all(items);
            }
            Err(e) => {
                warn!(entity = %kind, error = %e, "binding fetch failed");
                let message = e.to_string();
                self.store.set_error(kind, Some(message.clone()));
                self.update_local(|s| s.error = Some(message));
            }
        }

        self.store.set_loading(kind, false);
        self.update_local(|s| s.loading = false);
    }

    /// Fetch with default params if never loaded or older than `max_age`.
    /// Returns whether a fetch ran.
    pub async fn refresh_if_stale(&self, max_age: Duration) -> bool {
        if !self.is_stale(max_age) {
            return false;
        }
        self.fetch(&ListParams::default()).await;
        true
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create a record; the server's echo is upserted into the store.
    pub async fn create(&self, input: &T::Input) -> Result<Arc<T>, CoreError> {
        let created = self
            .track(async {
                send_data::<T, _>(self.gateway.as_ref(), WriteVerb::Post, T::KIND.path(), input)
                    .await
                    .map_err(CoreError::from)
            })
            .await?;
        Ok(self.write_back(created))
    }

    pub async fn update(&self, id: &str, input: &T::Input) -> Result<Arc<T>, CoreError> {
        let path = record_path::<T>(id);
        let updated = self
            .track(async {
                send_data::<T, _>(self.gateway.as_ref(), WriteVerb::Put, &path, input)
                    .await
                    .map_err(CoreError::from)
            })
            .await?;
        Ok(self.write_back(updated))
    }

    pub async fn delete(&self, id: &str) -> Result<(), CoreError> {
        let path = record_path::<T>(id);
        self.track(async {
            send_delete(self.gateway.as_ref(), &path)
                .await
                .map_err(CoreError::from)
        })
        .await?;
        self.store.remove::<T>(id);
        Ok(())
    }

    /// Delete each id concurrently. Ids that were deleted leave the store
    /// even when others fail; the error names the ones that did not.
    pub async fn bulk_delete(&self, ids: &[String]) -> Result<(), CoreError> {
        let gateway = self.gateway.as_ref();
        self.track(async {
            let results = join_all(ids.iter().map(|id| async move {
                let path = record_path::<T>(id);
                (id, send_delete(gateway, &path).await)
            }))
            .await;

            let mut deleted = Vec::new();
            let mut failed = Vec::new();
            for (id, result) in results {
                match result {
                    Ok(()) => deleted.push(id.clone()),
                    Err(e) => {
                        warn!(entity = %T::KIND, id = %id, error = %e, "delete failed");
                        failed.push(id.clone());
                    }
                }
            }
            if !deleted.is_empty() {
                self.store.remove_many::<T>(&deleted);
            }
            if failed.is_empty() {
                Ok(())
            } else {
                Err(CoreError::PartialDelete {
                    entity: T::KIND,
                    total: ids.len(),
                    failed,
                })
            }
        })
        .await
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Run a gateway call with local loading set, recording any error
    /// locally before handing it back.
    async fn track<R, Fut>(&self, call: Fut) -> Result<R, CoreError>
    where
        Fut: Future<Output = Result<R, CoreError>>,
    {
        self.update_local(|s| {
            s.loading = true;
            s.error = None;
        });
        let result = call.await;
        let error = result.as_ref().err().map(ToString::to_string);
        self.update_local(|s| {
            s.loading = false;
            s.error = error;
        });
        result
    }

    fn write_back(&self, record: T) -> Arc<T> {
        let record = Arc::new(record);
        self.store.upsert(T::clone(&record));
        record
    }

    fn lock_local(&self) -> std::sync::MutexGuard<'_, LocalState> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_local(&self, f: impl FnOnce(&mut LocalState)) {
        f(&mut self.lock_local());
        (self.on_change)();
    }
}

fn record_path<T: BoundEntity>(id: &str) -> String {
    format!("{}/{id}", T::KIND.path())
}

/// Subscribe `on_change` to changes in `T`'s table or metadata only.
fn subscribe_slice<T: BoundEntity>(store: &DataStore, on_change: ChangeCallback) -> Subscription {
    let initial = store.snapshot();
    let last: Mutex<(EntityTable<T>, EntityMeta)> = Mutex::new((
        T::table(&initial).clone(),
        initial.meta(T::KIND).clone(),
    ));
    store.subscribe(move |snapshot: &Arc<StoreSnapshot>| {
        let table = T::table(snapshot);
        let meta = snapshot.meta(T::KIND);
        let changed = {
            let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
            if last.0.same_rows(table) && last.1 == *meta {
                false
            } else {
                *last = (table.clone(), meta.clone());
                true
            }
        };
        if changed {
            on_change();
        }
    })
}

// ── Derived accessors ────────────────────────────────────────────────

impl EntityBinding<Mla> {
    pub fn with_details(&self, mla_id: &str) -> Option<MlaWithDetails> {
        self.store.mla_with_details(mla_id)
    }

    pub fn all_with_details(&self) -> Vec<MlaWithDetails> {
        self.store.snapshot().mlas_with_details()
    }

    pub fn by_party(&self, party_id: &str) -> Vec<Arc<Mla>> {
        self.store.snapshot().mlas_by_party(party_id)
    }

    pub fn filtered(&self, filter: &MlaFilter) -> Vec<Arc<Mla>> {
        filter.apply(&self.store.snapshot())
    }
}

impl EntityBinding<Constituency> {
    pub fn with_mla(&self, constituency_id: &str) -> Option<ConstituencyWithMla> {
        self.store.constituency_with_mla(constituency_id)
    }

    pub fn unassigned(&self) -> Vec<Arc<Constituency>> {
        self.store.unassigned_constituencies()
    }

    pub fn filtered(&self, filter: &ConstituencyFilter) -> Vec<Arc<Constituency>> {
        filter.apply(&self.store.snapshot())
    }
}

impl EntityBinding<Party> {
    /// Active MLAs in the party.
    pub fn member_count(&self, party_id: &str) -> usize {
        self.store.snapshot().party_member_count(party_id)
    }

    pub fn members(&self, party_id: &str) -> Vec<Arc<Mla>> {
        self.store.snapshot().mlas_by_party(party_id)
    }
}

impl<T: BoundEntity> std::fmt::Debug for EntityBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityBinding")
            .field("entity", &T::KIND)
            .field("local", &*self.lock_local())
            .finish_non_exhaustive()
    }
}
