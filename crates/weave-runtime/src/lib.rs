//! # Weave Runtime
//!
//! Deterministic state-transition engine for a blockchain node. Given a
//! starting root and an ordered batch of deploys, it produces a post-state
//! root plus a per-deploy record (cost, event log, status). Given a recorded
//! batch, it re-executes it on the replay space and reports the first
//! divergence.
//!
//! ## Components
//! - [`RuntimeManager`]: the public entry point; bootstraps the empty state
//!   and serializes every operation on the single runtime
//! - [`transition`]: the executor
//! - [`replay`]: the replay validator
//! - [`query`]: read-only queries, bonds/balance extraction and payment
//! - [`guard`]: exclusive, FIFO access to the runtime
//! - [`config`]: result channel, system phlo budget and program templates
//!
//! The interpreter and the tuple spaces are collaborators supplied through
//! the effect traits in `weave-core`.

#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod guard;
pub mod injector;
pub mod manager;
pub mod query;
pub mod replay;
pub mod transition;

pub use bootstrap::{registry_root_channel, REGISTRY_ROOT_ID};
pub use config::{RuntimeConfig, SystemPrograms, DEFAULT_RESULT_CHANNEL};
pub use error::{ReplayFailure, ReplayFailureReason, ReplayResult, Result, RuntimeError};
pub use guard::{RuntimeGuard, RuntimeLease};
pub use injector::{inject, EvaluateResult};
pub use manager::{GenesisResult, RuntimeManager};
