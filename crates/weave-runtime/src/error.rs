//! Engine errors and replay failure classification
//!
//! Two separate channels: [`RuntimeError`] is an engine-level fault that
//! aborts the operation (store failure, defensive assertion, bad config);
//! [`ReplayFailure`] is a classified divergence found while validating a
//! recorded block, which rejects the block but is not an engine fault.

use serde::{Deserialize, Serialize};
use weave_core::serialization::SerializationError;
use weave_core::{Deploy, InterpreterError, SpaceError, StateHash, WeaveError};

/// Engine-level fault
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// A tuple space operation failed
    #[error("Tuple space error: {0}")]
    Space(#[from] SpaceError),

    /// The interpreter reported an engine fault while running an internal query
    #[error("Interpreter fault: {errors:?}")]
    Interpreter {
        /// Reported causes
        errors: Vec<InterpreterError>,
    },

    /// A query produced a result of the wrong arity or kind
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was expected and what was found
        message: String,
    },

    /// A result failed a shape assertion
    #[error("Malformed result: {message}")]
    MalformedResult {
        /// Which assertion failed
        message: String,
    },

    /// Primary and replay spaces disagree on the empty state
    #[error("Bootstrap divergence: primary root {primary} != replay root {replay}")]
    BootstrapDivergence {
        /// Root committed by the primary space
        primary: StateHash,
        /// Root committed by the replay space
        replay: StateHash,
    },

    /// A deploy could not be canonically encoded
    #[error("Serialization error: {message}")]
    Serialization {
        /// Encoder diagnostic
        message: String,
    },

    /// Core error (configuration, hex parsing)
    #[error(transparent)]
    Core(#[from] WeaveError),
}

impl RuntimeError {
    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a malformed-result error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResult {
            message: message.into(),
        }
    }
}

impl From<SerializationError> for RuntimeError {
    fn from(err: SerializationError) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// Why replay diverged from the recorded execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ReplayFailureReason {
    /// Replay hit an engine fault; the block cannot be validated
    #[error("Internal errors during replay: {0:?}")]
    InternalErrors(Vec<InterpreterError>),

    /// Success/failure classification differs from the record
    #[error("Replay status mismatch: replay failed = {replay_failed}, initial failed = {initial_failed}")]
    ReplayStatusMismatch {
        /// Whether the replayed deploy failed
        replay_failed: bool,
        /// Whether the recorded deploy failed
        initial_failed: bool,
    },

    /// Recorded comm events could not be reproduced
    #[error("Unused COMM event: {message}")]
    UnusedCommEvent {
        /// Store diagnostic
        message: String,
    },
}

/// A classified replay divergence, naming the deploy when identifiable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFailure {
    /// Deploy at which replay diverged
    pub deploy: Option<Deploy>,
    /// Divergence reason
    pub reason: ReplayFailureReason,
}

impl ReplayFailure {
    /// Failure attributed to `deploy`
    pub fn at(deploy: &Deploy, reason: ReplayFailureReason) -> Self {
        Self {
            deploy: Some(deploy.clone()),
            reason,
        }
    }
}

impl std::fmt::Display for ReplayFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.deploy {
            Some(deploy) => write!(f, "Replay failed at deploy {}: {}", deploy.short_id(), self.reason),
            None => write!(f, "Replay failed: {}", self.reason),
        }
    }
}

impl std::error::Error for ReplayFailure {}

/// Outcome of validating a recorded batch: the post-state root, or the
/// first divergence
pub type ReplayResult = std::result::Result<StateHash, ReplayFailure>;

/// Standard Result type for engine operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
