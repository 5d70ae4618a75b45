// ── Normalized entity store ──
//
// Table-per-entity-type storage with per-type load metadata, published as
// immutable snapshots to callback listeners and async watchers.

mod bus;
mod data_store;
mod derived;
mod snapshot;
mod table;

pub use bus::Subscription;
pub use data_store::DataStore;
pub use snapshot::{EntityMeta, StoreEntity, StoreSnapshot};
pub use table::EntityTable;
