//! DAG-CBOR serialization for Weave core types
//!
//! DAG-CBOR is the canonical encoding for everything that feeds a hash:
//! deploy seeds, event hashes and state roots. Its deterministic map ordering
//! is what lets two nodes derive identical digests from identical values.

use crate::hash;
use serde::Serialize;

/// Error type for serialization operations
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// Invalid data format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Standard Result type for serialization operations
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Serialize any serde-compatible type to DAG-CBOR bytes
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_ipld_dagcbor::to_vec(value).map_err(|e| {
        SerializationError::InvalidFormat(format!("Failed to serialize to DAG-CBOR: {e}"))
    })
}

/// Serialize to DAG-CBOR and hash under a domain separation tag
pub fn hash_canonical_tagged<T: Serialize>(tag: &[u8], value: &T) -> Result<[u8; 32]> {
    let bytes = to_vec(value)?;
    Ok(hash::hash_tagged(tag, &bytes))
}
