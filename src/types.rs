//! BITLOG - Core Type Definitions
//! Defines the logical record stored in the log.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Key type for the storage engine.
pub type Key = String;

/// Value type for the storage engine.
/// `Bytes` keeps clones of returned values cheap.
pub type Value = Bytes;

/// A single logical record.
///
/// Entities are immutable once written: writing the same key again appends
/// a new entity, it never mutates the old one. A `tombstone` entity marks
/// its key as deleted as of that record.
///
/// Field order is part of the on-disk encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub key: Key,
    pub value: Value,
    pub tombstone: bool,
}

impl Entity {
    /// Create a live entity (SET operation).
    pub fn live(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            tombstone: false,
        }
    }

    /// Create a tombstone entity with an empty value (DELETE operation).
    pub fn tombstone(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            value: Bytes::new(),
            tombstone: true,
        }
    }

    /// Returns true if this entity is a tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.tombstone
    }
}
