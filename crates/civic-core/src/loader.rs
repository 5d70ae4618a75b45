// ── Gateway → store loading ──
//
// Fetching and writing are separate steps so the sync service can decide,
// after a fetch settles, whether its result may still be written.

use civic_api::{Gateway, Query, fetch_data, fetch_list};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{
    Constituency, ConstituencyStats, DashboardStats, EntityKind, Mla, MlaStats, Party,
};
use crate::store::DataStore;

/// The result of one full-collection fetch, not yet written.
#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Constituencies(Vec<Constituency>),
    Mlas(Vec<Mla>),
    Parties(Vec<Party>),
    DashboardStats(DashboardStats),
}

impl Payload {
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Constituencies(items) => items.len(),
            Self::Mlas(items) => items.len(),
            Self::Parties(items) => items.len(),
            Self::DashboardStats(_) => 1,
        }
    }

    /// Replace the matching collection in the store.
    pub(crate) fn apply(self, store: &DataStore) {
        match self {
            Self::Constituencies(items) => store.set_constituencies(items),
            Self::Mlas(items) => store.set_mlas(items),
            Self::Parties(items) => store.set_parties(items),
            Self::DashboardStats(stats) => store.set_dashboard_stats(stats),
        }
    }
}

/// Fetch the whole collection for `kind`.
///
/// Per-record statistics have no collection endpoint and are rejected.
pub(crate) async fn fetch(gateway: &dyn Gateway, kind: EntityKind) -> Result<Payload, CoreError> {
    let path = kind.path();
    let query = Query::new();
    debug!(entity = %kind, path, "fetching collection");
    let payload = match kind {
        EntityKind::Constituencies => {
            Payload::Constituencies(fetch_list(gateway, path, &query).await?)
        }
        EntityKind::Mlas => Payload::Mlas(fetch_list(gateway, path, &query).await?),
        EntityKind::Parties => Payload::Parties(fetch_list(gateway, path, &query).await?),
        EntityKind::DashboardStats => {
            Payload::DashboardStats(fetch_data(gateway, path, &query).await?)
        }
        EntityKind::ConstituencyStats | EntityKind::MlaStats => {
            return Err(CoreError::config(format!(
                "{kind} are fetched per record and cannot be loaded as a collection"
            )));
        }
    };
    Ok(payload)
}

/// Fetch `kind` and write it into the store, returning the record count.
pub(crate) async fn load(
    store: &DataStore,
    gateway: &dyn Gateway,
    kind: EntityKind,
) -> Result<usize, CoreError> {
    let payload = fetch(gateway, kind).await?;
    let count = payload.len();
    payload.apply(store);
    Ok(count)
}

/// Like [`load`], but records loading and error metadata around the fetch.
///
/// Failure is entity-scoped: it is written to `kind`'s error metadata and
/// returned, and existing data for `kind` is kept.
pub(crate) async fn load_tracked(
    store: &DataStore,
    gateway: &dyn Gateway,
    kind: EntityKind,
) -> Result<usize, CoreError> {
    store.set_loading(kind, true);
    let result = load(store, gateway, kind).await;
    if let Err(ref e) = result {
        store.set_error(kind, Some(e.to_string()));
    }
    store.set_loading(kind, false);
    result
}

// ── Per-record statistics ────────────────────────────────────────────

pub(crate) async fn fetch_constituency_stats(
    gateway: &dyn Gateway,
    constituency_id: &str,
) -> Result<ConstituencyStats, CoreError> {
    let path = EntityKind::ConstituencyStats.record_stats_path(constituency_id);
    Ok(fetch_data(gateway, &path, &Query::new()).await?)
}

pub(crate) async fn fetch_mla_stats(
    gateway: &dyn Gateway,
    mla_id: &str,
) -> Result<MlaStats, CoreError> {
    let path = EntityKind::MlaStats.record_stats_path(mla_id);
    Ok(fetch_data(gateway, &path, &Query::new()).await?)
}
