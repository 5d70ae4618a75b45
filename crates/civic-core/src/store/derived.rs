// ── Derived views ──
//
// Joins and lookups computed from a snapshot at call time. Nothing here
// is cached, so results can never drift from the tables they read.

use std::collections::HashSet;
use std::sync::Arc;

use super::StoreSnapshot;
use crate::model::{Constituency, ConstituencyWithMla, Mla, MlaWithDetails};

impl StoreSnapshot {
    /// An MLA joined with its constituency and party. Dangling foreign
    /// keys yield `None` on that side rather than an error.
    pub fn mla_with_details(&self, mla_id: &str) -> Option<MlaWithDetails> {
        self.mlas.get(mla_id).map(|mla| self.join_mla(mla))
    }

    /// Every MLA joined with its constituency and party.
    pub fn mlas_with_details(&self) -> Vec<MlaWithDetails> {
        self.mlas
            .values()
            .map(|mla| self.join_mla(Arc::clone(mla)))
            .collect()
    }

    fn join_mla(&self, mla: Arc<Mla>) -> MlaWithDetails {
        MlaWithDetails {
            constituency: self.constituencies.get(&mla.constituency_id),
            party: self.parties.get(&mla.party_id),
            mla,
        }
    }

    /// A constituency with the MLA representing it, if any.
    pub fn constituency_with_mla(&self, constituency_id: &str) -> Option<ConstituencyWithMla> {
        let constituency = self.constituencies.get(constituency_id)?;
        let mla = self.mla_for_constituency(constituency_id);
        let party = mla.as_ref().and_then(|m| self.parties.get(&m.party_id));
        Some(ConstituencyWithMla {
            constituency,
            mla,
            party,
        })
    }

    /// The MLA representing a constituency.
    ///
    /// When several records point at the same seat (past terms), an active
    /// MLA wins, then the latest `term_end`, then the smallest id.
    pub fn mla_for_constituency(&self, constituency_id: &str) -> Option<Arc<Mla>> {
        self.mlas
            .values()
            .filter(|m| m.constituency_id == constituency_id)
            .max_by(|a, b| {
                a.is_active()
                    .cmp(&b.is_active())
                    .then(a.term_end.cmp(&b.term_end))
                    .then(b.id.cmp(&a.id))
            })
            .map(Arc::clone)
    }

    /// Constituencies no MLA record points at.
    ///
    /// O(|MLAs| + |constituencies|).
    pub fn unassigned_constituencies(&self) -> Vec<Arc<Constituency>> {
        let assigned = self.assigned_constituency_ids();
        self.constituencies
            .values()
            .filter(|c| !assigned.contains(c.id.as_str()))
            .map(Arc::clone)
            .collect()
    }

    pub(crate) fn assigned_constituency_ids(&self) -> HashSet<&str> {
        self.mlas
            .values()
            .map(|m| m.constituency_id.as_str())
            .collect()
    }

    pub fn mlas_by_party(&self, party_id: &str) -> Vec<Arc<Mla>> {
        self.mlas
            .values()
            .filter(|m| m.party_id == party_id)
            .map(Arc::clone)
            .collect()
    }

    /// Number of active MLAs belonging to a party.
    pub fn party_member_count(&self, party_id: &str) -> usize {
        self.mlas
            .values()
            .filter(|m| m.party_id == party_id && m.is_active())
            .count()
    }
}
