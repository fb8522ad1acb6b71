//! Versioned postcard envelopes for typed cache values.
//!
//! The memory cache stores raw bytes. Typed values (`MemoryCache::set_value`)
//! are wrapped before they are stored:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (4 bytes)│POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "SVRC"              u32                postcard::to_allocvec(T)
//! ```
//!
//! A bad magic or a version bump makes the entry unreadable; the cache treats
//! that as a miss and drops the entry.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic header for SistemaV cache entries.
pub const CACHE_MAGIC: [u8; 4] = *b"SVRC";

/// Current schema version.
///
/// Increment when a cached type changes shape (fields added, removed,
/// reordered or retyped).
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode a value with its envelope.
///
/// # Errors
///
/// Returns `Error::SerializationError` if postcard cannot encode the value.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(&CacheEnvelope::new(value)).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode a value, validating magic and version first.
///
/// # Errors
///
/// - `Error::DeserializationError`: truncated or corrupted bytes
/// - `Error::InvalidCacheEntry`: bytes were not written by [`encode`]
/// - `Error::VersionMismatch`: written by a different schema version
pub fn decode<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes)
        .map_err(|e| Error::DeserializationError(e.to_string()))?;

    if envelope.magic != CACHE_MAGIC {
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}
