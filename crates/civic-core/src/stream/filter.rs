// ── Filter predicates over snapshots ──
//
// Used by list views to narrow a collection without another round trip.

use std::sync::Arc;

use crate::model::{Constituency, Mla, MlaStatus, ReservedCategory};
use crate::store::StoreSnapshot;

/// Filter predicate for MLA collections.
pub enum MlaFilter {
    All,
    ByParty(String),
    ByConstituency(String),
    ByStatus(MlaStatus),
    Active,
    Custom(Box<dyn Fn(&Mla) -> bool + Send + Sync>),
}

impl MlaFilter {
    pub fn matches(&self, mla: &Mla) -> bool {
        match self {
            Self::All => true,
            Self::ByParty(party_id) => mla.party_id == *party_id,
            Self::ByConstituency(constituency_id) => mla.constituency_id == *constituency_id,
            Self::ByStatus(status) => mla.status == *status,
            Self::Active => mla.is_active(),
            Self::Custom(f) => f(mla),
        }
    }

    pub fn apply(&self, snapshot: &StoreSnapshot) -> Vec<Arc<Mla>> {
        snapshot
            .mlas()
            .values()
            .filter(|m| self.matches(m))
            .map(Arc::clone)
            .collect()
    }
}

/// Filter predicate for constituency collections.
pub enum ConstituencyFilter {
    All,
    ByDistrict(String),
    ByCategory(ReservedCategory),
    /// No MLA record points at it.
    Unassigned,
    Custom(Box<dyn Fn(&Constituency) -> bool + Send + Sync>),
}

impl ConstituencyFilter {
    pub fn apply(&self, snapshot: &StoreSnapshot) -> Vec<Arc<Constituency>> {
        if matches!(self, Self::Unassigned) {
            return snapshot.unassigned_constituencies();
        }
        snapshot
            .constituencies()
            .values()
            .filter(|c| match self {
                Self::All | Self::Unassigned => true,
                Self::ByDistrict(district) => c.district.eq_ignore_ascii_case(district),
                Self::ByCategory(category) => c.reserved_category == *category,
                Self::Custom(f) => f(c),
            })
            .map(Arc::clone)
            .collect()
    }
}
