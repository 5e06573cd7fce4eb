//! Weave Testing Infrastructure
//!
//! Deterministic in-memory collaborators for the engine: a content-addressed
//! tuple space with replay rigging, a small script interpreter, fixtures and
//! proptest strategies.
//!
//! # Usage
//!
//! ```rust,no_run
//! use weave_testkit::*;
//!
//! let TestRuntime { runtime, .. } = test_runtime();
//! let batch = vec![deploy("mint 0xaa 10; transfer 0xaa 0xbb 3", 1)];
//! // hand `runtime` to the engine and apply `batch`
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod interpreter;
pub mod programs;
pub mod script;
pub mod space;
pub mod strategies;

pub use fixtures::*;
pub use interpreter::{vault_channel, ScriptInterpreter, STEP_COST};
pub use space::{Fired, MemoryTupleSpace};
