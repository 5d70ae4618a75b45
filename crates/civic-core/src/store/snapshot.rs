use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;

use super::EntityTable;
use crate::model::{
    Constituency, ConstituencyStats, DashboardStats, EntityKind, Mla, MlaStats, Party, Record,
};

/// Load metadata for one entity type, independent of its records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMeta {
    /// When the collection was last written by a successful load.
    pub last_updated: Option<DateTime<Utc>>,
    pub is_loading: bool,
    /// Human-readable message from the last failed load, if any.
    pub error: Option<String>,
}

static NO_META: EntityMeta = EntityMeta {
    last_updated: None,
    is_loading: false,
    error: None,
};

impl EntityMeta {
    /// `true` when never loaded, or when older than `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.last_updated {
            None => true,
            Some(at) => now - at > max_age,
        }
    }
}

/// An immutable view of the whole store at one version.
///
/// Listeners receive one of these per mutation and pick out the slice
/// they need. Tables are shared with neighbouring versions, so holding a
/// snapshot is cheap.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub(crate) version: u64,
    pub(crate) constituencies: EntityTable<Constituency>,
    pub(crate) mlas: EntityTable<Mla>,
    pub(crate) parties: EntityTable<Party>,
    pub(crate) dashboard_stats: Option<Arc<DashboardStats>>,
    pub(crate) constituency_stats: EntityTable<ConstituencyStats>,
    pub(crate) mla_stats: EntityTable<MlaStats>,
    pub(crate) meta: BTreeMap<EntityKind, EntityMeta>,
}

impl StoreSnapshot {
    /// Bumped once per mutation. Equal versions mean equal contents.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn constituencies(&self) -> &EntityTable<Constituency> {
        &self.constituencies
    }

    pub fn mlas(&self) -> &EntityTable<Mla> {
        &self.mlas
    }

    pub fn parties(&self) -> &EntityTable<Party> {
        &self.parties
    }

    pub fn dashboard_stats(&self) -> Option<Arc<DashboardStats>> {
        self.dashboard_stats.clone()
    }

    pub fn constituency_stats(&self) -> &EntityTable<ConstituencyStats> {
        &self.constituency_stats
    }

    pub fn mla_stats(&self) -> &EntityTable<MlaStats> {
        &self.mla_stats
    }

    pub fn meta(&self, kind: EntityKind) -> &EntityMeta {
        self.meta.get(&kind).unwrap_or(&NO_META)
    }

    pub(crate) fn meta_mut(&mut self, kind: EntityKind) -> &mut EntityMeta {
        self.meta.entry(kind).or_default()
    }

    /// Table for `T`, for code generic over entity types.
    pub fn table<T: StoreEntity>(&self) -> &EntityTable<T> {
        T::table(self)
    }
}

/// A record type with its own table in the store.
pub trait StoreEntity: Record + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn table(snapshot: &StoreSnapshot) -> &EntityTable<Self>;

    fn table_mut(snapshot: &mut StoreSnapshot) -> &mut EntityTable<Self>;
}

impl StoreEntity for Constituency {
    const KIND: EntityKind = EntityKind::Constituencies;

    fn table(snapshot: &StoreSnapshot) -> &EntityTable<Self> {
        &snapshot.constituencies
    }

    fn table_mut(snapshot: &mut StoreSnapshot) -> &mut EntityTable<Self> {
        &mut snapshot.constituencies
    }
}

impl StoreEntity for Mla {
    const KIND: EntityKind = EntityKind::Mlas;

    fn table(snapshot: &StoreSnapshot) -> &EntityTable<Self> {
        &snapshot.mlas
    }

    fn table_mut(snapshot: &mut StoreSnapshot) -> &mut EntityTable<Self> {
        &mut snapshot.mlas
    }
}

impl StoreEntity for Party {
    const KIND: EntityKind = EntityKind::Parties;

    fn table(snapshot: &StoreSnapshot) -> &EntityTable<Self> {
        &snapshot.parties
    }

    fn table_mut(snapshot: &mut StoreSnapshot) -> &mut EntityTable<Self> {
        &mut snapshot.parties
    }
}

impl StoreEntity for ConstituencyStats {
    const KIND: EntityKind = EntityKind::ConstituencyStats;

    fn table(snapshot: &StoreSnapshot) -> &EntityTable<Self> {
        &snapshot.constituency_stats
    }

    fn table_mut(snapshot: &mut StoreSnapshot) -> &mut EntityTable<Self> {
        &mut snapshot.constituency_stats
    }
}

impl StoreEntity for MlaStats {
    const KIND: EntityKind = EntityKind::MlaStats;

    fn table(snapshot: &StoreSnapshot) -> &EntityTable<Self> {
        &snapshot.mla_stats
    }

    fn table_mut(snapshot: &mut StoreSnapshot) -> &mut EntityTable<Self> {
        &mut snapshot.mla_stats
    }
}
