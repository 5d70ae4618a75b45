// civic-core: Normalized client-side cache and sync layer between civic-api and views.

pub mod binding;
pub mod clock;
pub mod config;
pub mod error;
mod initializer;
mod loader;
pub mod model;
pub mod store;
pub mod stream;
mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use binding::{
    BoundEntity, ConstituencyBinding, EntityBinding, ListParams, MlaBinding, PartyBinding,
    StatsBinding,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{InitializerConfig, SyncConfig};
pub use error::CoreError;
pub use initializer::{InitReport, Initializer};
pub use store::{DataStore, EntityMeta, StoreSnapshot, Subscription};
pub use stream::{ConstituencyFilter, MlaFilter, StoreStream};
pub use sync::{SyncReport, SyncService, SyncStatus};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Records
    Constituency, Mla, MlaStatus, Party, ReservedCategory,
    // Statistics
    ConstituencyStats, DashboardStats, MlaStats,
    // Joins
    ConstituencyWithMla, MlaWithDetails,
    // Mutation payloads
    ConstituencyInput, MlaInput, PartyInput,
    // Metadata keys
    EntityKind,
};
