//! BITLOG - Record Codec
//! Stateless conversion between an `Entity` and its payload bytes.
//!
//! ## Binary Format (payload)
//! ```text
//! [key_len: 8 bytes (LE)][key: N bytes UTF-8][val_len: 8 bytes (LE)][value: M bytes][tombstone: 1 byte]
//! ```
//! The payload carries no framing of its own; the log store prefixes it
//! with its length.
//!
//! Fields are only ever appended. A reader ignores bytes after the fields
//! it knows, so records written by a newer schema still decode.

use bincode::Options;

use crate::error::{BitLogError, Result};
use crate::types::Entity;

/// Fixed-width little-endian integers; trailing bytes are newer fields.
fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

/// Serialize an entity into its payload bytes.
pub fn encode(entity: &Entity) -> Result<Vec<u8>> {
    options()
        .serialize(entity)
        .map_err(|e| BitLogError::Encode(e.to_string()))
}

/// Parse payload bytes back into an entity.
pub fn decode(bytes: &[u8]) -> Result<Entity> {
    let entity: Entity = options()
        .deserialize(bytes)
        .map_err(|e| BitLogError::CorruptRecord(e.to_string()))?;
    if entity.key.is_empty() {
        return Err(BitLogError::CorruptRecord("empty key".into()));
    }
    Ok(entity)
}

/// Size in bytes of `encode(entity)`, without allocating it.
pub fn encoded_len(entity: &Entity) -> Result<u64> {
    options()
        .serialized_size(entity)
        .map_err(|e| BitLogError::Encode(e.to_string()))
}
