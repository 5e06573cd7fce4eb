//! Interpreter effect interface
//!
//! The interpreter evaluates a term against the space it was built over.
//! Term evaluation and pattern unification are its business; the engine only
//! sees the failure causes it reports and the phlo it charged.

use crate::cost::CostMeter;
use crate::rand::SeededRand;
use crate::types::{InterpreterError, Term};
use async_trait::async_trait;

/// Evaluation of process-calculus terms
#[async_trait]
pub trait InterpreterEffects: Send + Sync {
    /// Evaluate `term` to quiescence.
    ///
    /// Unforgeable names are drawn from `rand`. Every unit of work is charged
    /// to `meter`; evaluation stops at the first failed charge. Returns the
    /// failure causes in the order they occurred, empty on success. Engine
    /// faults are reported as [`InterpreterError::Internal`], never raised.
    async fn evaluate(
        &self,
        term: &Term,
        rand: SeededRand,
        meter: &CostMeter,
    ) -> Vec<InterpreterError>;
}
