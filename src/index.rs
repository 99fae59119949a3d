use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::record_id::RecordId;

/// The process-local secondary index: table -> column -> value -> set of
/// record ids. Never persisted; see SPEC_FULL.md §9 on rebuild policy. The
/// per-column map is a `BTreeMap` (not a hash map) specifically so
/// `range_search` can walk a lexicographic range without a full scan.
#[derive(Default)]
pub struct IndexManager {
    indexes: HashMap<(String, String), BTreeMap<String, BTreeSet<RecordId>>>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty index for `(table, col)`. A no-op if it already
    /// exists. Existing data records are not back-filled; callers must
    /// re-insert to populate it (see `search` scenario in SPEC_FULL.md §8).
    pub fn create_index(&mut self, table: &str, col: &str) {
        self.indexes
            .entry((table.to_string(), col.to_string()))
            .or_default();
    }

    /// Removes the `(table, col)` index entirely, if present.
    pub fn drop_index(&mut self, table: &str, col: &str) {
        self.indexes.remove(&(table.to_string(), col.to_string()));
    }

    pub fn has_index(&self, table: &str, col: &str) -> bool {
        self.indexes
            .contains_key(&(table.to_string(), col.to_string()))
    }

    /// Adds `id` under `value`. A no-op if no index is registered for this
    /// `(table, col)` pair.
    pub fn insert_entry(&mut self, table: &str, col: &str, value: &str, id: RecordId) {
        if let Some(by_value) = self.indexes.get_mut(&(table.to_string(), col.to_string())) {
            by_value.entry(value.to_string()).or_default().insert(id);
        }
    }

    /// Removes `id` from `value`'s set, erasing the value key entirely once
    /// its set is empty. A no-op if no index is registered.
    pub fn delete_entry(&mut self, table: &str, col: &str, value: &str, id: RecordId) {
        let key = (table.to_string(), col.to_string());
        if let Some(by_value) = self.indexes.get_mut(&key) {
            if let Some(set) = by_value.get_mut(value) {
                set.remove(&id);
                if set.is_empty() {
                    by_value.remove(value);
                }
            }
        }
    }

    /// Exact-match lookup. Empty when the index or the value is absent.
    pub fn search(&self, table: &str, col: &str, value: &str) -> Vec<RecordId> {
        self.indexes
            .get(&(table.to_string(), col.to_string()))
            .and_then(|by_value| by_value.get(value))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Lexicographic range `[lo, hi]`, concatenated in ascending value
    /// order. Empty when the index is absent or when `lo > hi`
    /// (`BTreeMap::range` panics on an inverted bound, so that case is
    /// short-circuited here).
    pub fn range_search(&self, table: &str, col: &str, lo: &str, hi: &str) -> Vec<RecordId> {
        if lo > hi {
            return Vec::new();
        }
        let Some(by_value) = self.indexes.get(&(table.to_string(), col.to_string())) else {
            return Vec::new();
        };
        by_value
            .range(lo.to_string()..=hi.to_string())
            .flat_map(|(_, set)| set.iter().copied())
            .collect()
    }
}
