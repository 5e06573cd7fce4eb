//! # Weave Core
//!
//! Foundational types and effect interfaces for the Weave state-transition
//! engine. Contains no engine logic.
//!
//! ## Data model
//! - `StateHash`, `Checkpoint`: content-addressed snapshot roots
//! - `Deploy`, `ProcessedDeploy`, `DeployStatus`: deploys and their records
//! - `Value`, `Channel`, `WaitingContinuation`: what a tuple space holds
//! - `Event`, `EventLog`: produce/consume/comm events used to rig replay
//!
//! ## Effect interfaces
//! - `InterpreterEffects`: evaluate a term under a seed and a cost meter
//! - `TupleSpaceEffects`, `ReplayTupleSpaceEffects`: reset, read, checkpoint, rig
//!
//! ## Determinism support
//! - `hash`, `serialization`: the single hash algorithm and canonical encoding
//! - `SeededRand`: per-deploy unforgeable-name generator
//! - `CostMeter`: budget enforcement with exact clamping

#![forbid(unsafe_code)]

pub mod cost;
pub mod effects;
pub mod errors;
pub mod hash;
pub mod rand;
pub mod runtime;
pub mod serialization;
pub mod types;

pub use cost::CostMeter;
pub use effects::{
    InterpreterEffects, ReplayTupleSpaceEffects, SpaceError, SpaceRow, TupleSpaceEffects,
};
pub use errors::{Result, WeaveError};
pub use rand::SeededRand;
pub use runtime::Runtime;
pub use types::*;
