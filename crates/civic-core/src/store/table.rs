// ── Keyed entity table ──
//
// Copy-on-write map from id to record. Cloning a table is an `Arc` bump,
// so every published snapshot shares untouched tables with the previous
// one and a mutation only copies the table it touches.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::model::Record;

/// Normalized storage for one entity type: id -> record.
///
/// Re-inserting an id replaces the previous record wholesale; there is
/// no field-level merge.
pub struct EntityTable<T> {
    rows: Arc<HashMap<String, Arc<T>>>,
}

impl<T> EntityTable<T> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(HashMap::new()),
        }
    }

    /// Insert under an explicit key. Returns `true` if the key was new.
    pub(crate) fn insert(&mut self, key: String, entity: T) -> bool {
        Arc::make_mut(&mut self.rows)
            .insert(key, Arc::new(entity))
            .is_none()
    }

    /// Remove by id. Absent ids are a no-op.
    pub(crate) fn remove(&mut self, id: &str) -> Option<Arc<T>> {
        if !self.rows.contains_key(id) {
            return None;
        }
        Arc::make_mut(&mut self.rows).remove(id)
    }

    /// `true` if both tables share storage, i.e. neither was written
    /// since one was cloned from the other.
    pub fn same_rows(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }

    /// O(1) lookup.
    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.rows.get(id).map(Arc::clone)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate the records in no particular order.
    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> {
        self.rows.values()
    }

    /// Materialize the records into a fresh list.
    ///
    /// Allocates on every call; hot render paths should memoize on
    /// [`StoreSnapshot::version`](super::StoreSnapshot::version).
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.rows.values().map(Arc::clone).collect()
    }

    /// All current ids.
    pub fn ids(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }
}

impl<T: Record> EntityTable<T> {
    /// Insert or replace by the record's own id. Returns `true` if new.
    pub(crate) fn upsert(&mut self, entity: T) -> bool {
        let key = entity.id().to_owned();
        self.insert(key, entity)
    }

    /// Replace the whole table with `items`, normalizing by id.
    ///
    /// Duplicate ids in `items` resolve last-write-wins.
    pub(crate) fn replace_all(&mut self, items: Vec<T>) {
        let rows: HashMap<String, Arc<T>> = items
            .into_iter()
            .map(|item| (item.id().to_owned(), Arc::new(item)))
            .collect();
        self.rows = Arc::new(rows);
    }
}

impl<T> Clone for EntityTable<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<T> Default for EntityTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for EntityTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.rows.iter()).finish()
    }
}
