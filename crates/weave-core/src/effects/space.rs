//! Tuple-space effect interfaces
//!
//! The engine drives two independent store instances: the primary space used
//! by block production and queries, and the replay space used to validate
//! recorded blocks. Both must share history so that any root one commits can
//! be reset to by the other.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: the node's storage layer; `weave-testkit` for tests

use crate::types::{Channel, Checkpoint, Datum, Event, StateHash, WaitingContinuation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Store collaborator faults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SpaceError {
    /// Reset to a root the history does not contain
    #[error("Unknown state root: {root}")]
    UnknownRoot {
        /// The requested root
        root: StateHash,
    },

    /// Rigged comm events were not all reproduced, or could not be rigged
    #[error("Unused COMM event: {message}")]
    UnusedCommEvent {
        /// Which events were left over or rejected
        message: String,
    },

    /// Backend failure
    #[error("Storage error: {message}")]
    Storage {
        /// Backend diagnostic
        message: String,
    },
}

impl SpaceError {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an unused-comm-event error
    pub fn unused_comm_event(message: impl Into<String>) -> Self {
        Self::UnusedCommEvent {
            message: message.into(),
        }
    }
}

/// One row of a space dump: a channel group with its data and waiters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRow {
    /// Channels keying this row (a single channel for data rows)
    pub channels: Vec<Channel>,
    /// Data published on the channel
    pub data: Vec<Datum>,
    /// Continuations waiting on the channel group
    pub continuations: Vec<WaitingContinuation>,
}

/// Operations the engine performs on a tuple space
#[async_trait]
pub trait TupleSpaceEffects: Send + Sync {
    /// Point the space at a historical root, discarding uncommitted effects
    async fn reset(&self, root: &StateHash) -> Result<(), SpaceError>;

    /// Empty the live state. History is kept.
    async fn clear(&self) -> Result<(), SpaceError>;

    /// Data currently published on `channel`
    async fn get_data(&self, channel: &Channel) -> Result<Vec<Datum>, SpaceError>;

    /// Continuations waiting on exactly the channel group `channels`
    async fn get_waiting_continuations(
        &self,
        channels: &[Channel],
    ) -> Result<Vec<WaitingContinuation>, SpaceError>;

    /// Insert a datum directly, without matching or event logging.
    ///
    /// Reserved for bootstrap, where the registry root is seeded before any
    /// program runs.
    async fn install(&self, channel: Channel, datum: Datum) -> Result<(), SpaceError>;

    /// Commit the live state and return its root with the events since the
    /// last reset or checkpoint
    async fn create_checkpoint(&self) -> Result<Checkpoint, SpaceError>;

    /// Dump the live state for diagnostics
    async fn rows(&self) -> Result<Vec<SpaceRow>, SpaceError>;
}

/// Additional operations of the replay space
#[async_trait]
pub trait ReplayTupleSpaceEffects: TupleSpaceEffects {
    /// Reset to `root` and pre-load the comm events of `log`, so that the
    /// next evaluation resolves its matches exactly as recorded
    async fn rig(&self, root: &StateHash, log: &[Event]) -> Result<(), SpaceError>;

    /// Fail with [`SpaceError::UnusedCommEvent`] if any rigged comm event was
    /// not reproduced
    async fn check_replay_data(&self) -> Result<(), SpaceError>;
}
