// ── Domain model ──
//
// Canonical record types held by the store. Foreign keys are opaque
// strings; nothing here enforces that they resolve.

mod constituency;
mod entity_kind;
mod input;
mod mla;
mod party;
mod stats;

pub use constituency::{Constituency, ReservedCategory};
pub use entity_kind::EntityKind;
pub use input::{ConstituencyInput, MlaInput, PartyInput};
pub use mla::{Mla, MlaStatus};
pub use party::Party;
pub use stats::{ConstituencyStats, DashboardStats, MlaStats};

use std::sync::Arc;

/// Anything stored in a keyed table.
pub trait Record {
    /// The key this record is stored under.
    fn id(&self) -> &str;
}

/// An MLA joined with the constituency and party it references.
///
/// Either side may be missing while collections load independently.
#[derive(Debug, Clone, PartialEq)]
pub struct MlaWithDetails {
    pub mla: Arc<Mla>,
    pub constituency: Option<Arc<Constituency>>,
    pub party: Option<Arc<Party>>,
}

/// A constituency joined with its sitting MLA (and that MLA's party).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstituencyWithMla {
    pub constituency: Arc<Constituency>,
    pub mla: Option<Arc<Mla>>,
    pub party: Option<Arc<Party>>,
}
