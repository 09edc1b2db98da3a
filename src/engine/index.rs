//! BITLOG - Offset Index
//! In-memory map from key to the offset of its latest frame.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::Key;

/// Key -> offset map behind a reader/writer lock.
///
/// Lookups share the lock; upserts take it exclusively, so no reader ever
/// observes a half-updated entry. Tombstoned keys stay in the map: they
/// point at their tombstone frame.
#[derive(Default)]
pub struct OffsetIndex {
    offsets: RwLock<HashMap<Key, u64>>,
}

impl OffsetIndex {
    /// Create a new, empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of the latest frame for `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<u64> {
        self.read().get(key).copied()
    }

    /// Point `key` at `offset`, replacing any previous offset.
    pub fn upsert(&self, key: Key, offset: u64) {
        self.write().insert(key, offset);
    }

    /// Drop every entry. Only used when rebuilding during recovery.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of indexed keys, tombstoned ones included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no key is indexed.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of `(key, offset)` pairs sorted by key.
    pub fn snapshot(&self) -> Vec<(Key, u64)> {
        let mut entries: Vec<(Key, u64)> = self
            .read()
            .iter()
            .map(|(k, &o)| (k.clone(), o))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    // The map holds plain values, a panicking writer cannot leave it torn.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Key, u64>> {
        self.offsets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Key, u64>> {
        self.offsets.write().unwrap_or_else(PoisonError::into_inner)
    }
}
