//! The execution context
//!
//! A node owns exactly one [`Runtime`]: the primary interpreter and space, the
//! replay interpreter and space, and the cost meter they share. The engine
//! grants exclusive access to it for the duration of one operation.

use crate::cost::CostMeter;
use crate::effects::{InterpreterEffects, ReplayTupleSpaceEffects, TupleSpaceEffects};
use std::fmt;
use std::sync::Arc;

/// Single mutable execution context of a node
pub struct Runtime {
    /// Interpreter evaluating against `space`
    pub reducer: Arc<dyn InterpreterEffects>,
    /// Interpreter evaluating against `replay_space`
    pub replay_reducer: Arc<dyn InterpreterEffects>,
    /// Primary tuple space
    pub space: Arc<dyn TupleSpaceEffects>,
    /// Replay tuple space
    pub replay_space: Arc<dyn ReplayTupleSpaceEffects>,
    /// Phlo meter charged by both interpreters
    pub cost: CostMeter,
}

impl Runtime {
    /// Assemble a runtime from its collaborators
    pub fn new(
        reducer: Arc<dyn InterpreterEffects>,
        replay_reducer: Arc<dyn InterpreterEffects>,
        space: Arc<dyn TupleSpaceEffects>,
        replay_space: Arc<dyn ReplayTupleSpaceEffects>,
    ) -> Self {
        Self {
            reducer,
            replay_reducer,
            space,
            replay_space,
            cost: CostMeter::new(),
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}
