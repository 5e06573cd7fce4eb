//! Deploys and their execution records

use super::event::EventLog;
use crate::hash;
use crate::serialization::{self, SerializationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain separation tag for deploy seeds
const DEPLOY_SEED_TAG: &[u8] = b"WEAVE_DEPLOY_SEED";

/// Program source handed to the interpreter
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term(String);

impl Term {
    /// Wrap program source
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Program source
    pub fn source(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Term({:?})", self.0)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-submitted program plus its execution-budget metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deploy {
    /// Deployer identity (public key bytes)
    pub deployer: Vec<u8>,
    /// Program to evaluate
    pub term: Term,
    /// Phlo budget
    pub phlo_limit: u64,
    /// Price per phlo
    pub phlo_price: u64,
    /// Client timestamp (milliseconds)
    pub timestamp: i64,
    /// Deployer signature; never part of the seed encoding
    pub sig: Vec<u8>,
    /// Signature algorithm name
    pub sig_algorithm: String,
}

/// Borrowed view of the fields that identify a deploy's execution
#[derive(Serialize)]
struct UnsignedDeploy<'a> {
    deployer: &'a [u8],
    term: &'a str,
    phlo_limit: u64,
    phlo_price: u64,
    timestamp: i64,
}

impl Deploy {
    /// Unsigned deploy constructed by the engine for internal queries
    pub fn system(term: Term, phlo_limit: u64) -> Self {
        Self {
            deployer: Vec::new(),
            term,
            phlo_limit,
            phlo_price: 0,
            timestamp: 0,
            sig: Vec::new(),
            sig_algorithm: String::new(),
        }
    }

    /// Canonical encoding of the deploy with all signature fields stripped
    pub fn canonical_unsigned_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        serialization::to_vec(&UnsignedDeploy {
            deployer: &self.deployer,
            term: self.term.source(),
            phlo_limit: self.phlo_limit,
            phlo_price: self.phlo_price,
            timestamp: self.timestamp,
        })
    }

    /// Seed for this deploy's unforgeable-name generator.
    ///
    /// Identical for the original execution and every replay, regardless of
    /// how (or whether) the deploy was signed.
    pub fn seed(&self) -> Result<[u8; 32], SerializationError> {
        let bytes = self.canonical_unsigned_bytes()?;
        Ok(hash::hash_tagged(DEPLOY_SEED_TAG, &bytes))
    }

    /// Short identifier for logs: signature prefix, or seed prefix when unsigned
    pub fn short_id(&self) -> String {
        if !self.sig.is_empty() {
            let end = self.sig.len().min(8);
            return hex::encode(&self.sig[..end]);
        }
        match self.seed() {
            Ok(seed) => hex::encode(&seed[..8]),
            Err(_) => "unencodable".to_string(),
        }
    }
}

/// Phlo consumed by an evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cost(pub u64);

/// Failure cause reported by the interpreter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum InterpreterError {
    /// The deploy exhausted its phlo budget
    #[error("Out of phlogistons")]
    OutOfPhlogistons,

    /// The program could not be parsed
    #[error("Syntax error: {message}")]
    Syntax {
        /// Parser diagnostic
        message: String,
    },

    /// The program faulted while evaluating
    #[error("Evaluation error: {message}")]
    Evaluation {
        /// Evaluation diagnostic
        message: String,
    },

    /// The program aborted itself
    #[error("User abort: {message}")]
    UserAbort {
        /// Abort reason supplied by the program
        message: String,
    },

    /// Interpreter or infrastructure fault, not attributable to the program
    #[error("Internal interpreter error: {message}")]
    Internal {
        /// Fault description
        message: String,
    },
}

impl InterpreterError {
    /// Whether this cause is an engine-level fault
    pub fn is_internal(&self) -> bool {
        matches!(self, InterpreterError::Internal { .. })
    }
}

/// Classification of a deploy's outcome
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeployStatus {
    /// No failure causes
    Succeeded,
    /// The deploy's own program faulted
    UserErrors(Vec<InterpreterError>),
    /// The engine faulted; the execution is untrusted
    InternalErrors(Vec<InterpreterError>),
}

impl DeployStatus {
    /// Classify a list of failure causes. A single internal cause makes the
    /// whole outcome internal.
    pub fn from_errors(errors: Vec<InterpreterError>) -> Self {
        if errors.is_empty() {
            DeployStatus::Succeeded
        } else if errors.iter().any(InterpreterError::is_internal) {
            DeployStatus::InternalErrors(errors)
        } else {
            DeployStatus::UserErrors(errors)
        }
    }

    /// Whether the deploy failed for any reason
    pub fn is_failed(&self) -> bool {
        !matches!(self, DeployStatus::Succeeded)
    }

    /// Whether the failure is engine-level
    pub fn is_internal_error(&self) -> bool {
        matches!(self, DeployStatus::InternalErrors(_))
    }

    /// Failure causes, empty on success
    pub fn errors(&self) -> &[InterpreterError] {
        match self {
            DeployStatus::Succeeded => &[],
            DeployStatus::UserErrors(errors) | DeployStatus::InternalErrors(errors) => errors,
        }
    }
}

/// A deploy together with the outcome of executing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDeploy {
    /// The executed deploy
    pub deploy: Deploy,
    /// Phlo consumed, never more than `deploy.phlo_limit`
    pub cost: Cost,
    /// Events the execution produced
    pub log: EventLog,
    /// Outcome classification
    pub status: DeployStatus,
}
