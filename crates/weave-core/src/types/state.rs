//! State roots and checkpoints

use super::event::EventLog;
use crate::errors::{Result, WeaveError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-addressed digest identifying a tuple-space snapshot.
///
/// Equal hashes imply equal observable store contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateHash(pub [u8; 32]);

impl StateHash {
    /// Wrap raw digest bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| WeaveError::invalid(format!("bad hex: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| WeaveError::invalid("state hash must be 32 bytes"))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Abbreviated; full roots make batch logs unreadable
        write!(f, "StateHash({}..)", &self.to_hex()[..12])
    }
}

/// A committed snapshot root plus the event log that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Root of the committed snapshot
    pub root: StateHash,
    /// Events accumulated since the previous reset or checkpoint
    pub log: EventLog,
}
