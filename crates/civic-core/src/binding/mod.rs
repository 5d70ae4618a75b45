// ── View bindings ──
//
// Component-scoped adapters over the store: a subscription that lives as
// long as the binding, merged loading/error state, and CRUD calls that
// write through to the store on success.

mod entity;
mod stats;

use civic_api::Query;
use serde::Serialize;

use crate::model::{
    Constituency, ConstituencyInput, Mla, MlaInput, MlaStatus, Party, PartyInput,
};
use crate::store::StoreEntity;

pub use entity::EntityBinding;
pub use stats::StatsBinding;

/// A store entity with a CRUD collection endpoint.
pub trait BoundEntity: StoreEntity + Clone {
    /// Body sent on create and update.
    type Input: Serialize + Send + Sync;
}

impl BoundEntity for Constituency {
    type Input = ConstituencyInput;
}

impl BoundEntity for Mla {
    type Input = MlaInput;
}

impl BoundEntity for Party {
    type Input = PartyInput;
}

pub type ConstituencyBinding = EntityBinding<Constituency>;
pub type MlaBinding = EntityBinding<Mla>;
pub type PartyBinding = EntityBinding<Party>;

/// List filters and paging for `fetch`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub district: Option<String>,
    pub party_id: Option<String>,
    pub constituency_id: Option<String>,
    pub status: Option<MlaStatus>,
}

impl ListParams {
    pub fn to_query(&self) -> Query {
        Query::new()
            .push_opt("page", self.page)
            .push_opt("limit", self.limit)
            .push_opt("search", self.search.as_deref())
            .push_opt("district", self.district.as_deref())
            .push_opt("party_id", self.party_id.as_deref())
            .push_opt("constituency_id", self.constituency_id.as_deref())
            .push_opt("status", self.status.map(MlaStatus::as_str))
    }
}
