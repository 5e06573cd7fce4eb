//! Deploy injection
//!
//! Seeds the deploy's name generator, arms the cost meter and hands the term
//! to an interpreter. Classification of the reported causes is left to the
//! caller.

use crate::error::Result;
use tracing::trace;
use weave_core::{Cost, CostMeter, Deploy, InterpreterEffects, InterpreterError, SeededRand};

/// What one evaluation consumed and reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateResult {
    /// Phlo consumed, at most the budget
    pub cost: Cost,
    /// Failure causes in occurrence order
    pub errors: Vec<InterpreterError>,
}

/// Evaluate `deploy` on `reducer` with `budget` phlo.
///
/// The name generator is keyed by the deploy's unsigned canonical encoding,
/// so the executor, the replay validator and the query paths all hand the
/// interpreter identical randomness for identical deploys.
pub async fn inject(
    reducer: &dyn InterpreterEffects,
    meter: &CostMeter,
    deploy: &Deploy,
    budget: u64,
) -> Result<EvaluateResult> {
    let rand = SeededRand::for_deploy(deploy)?;
    meter.set_limit(budget);
    let errors = reducer.evaluate(&deploy.term, rand, meter).await;
    let cost = meter.consumed();
    trace!(
        deploy = %deploy.short_id(),
        budget,
        cost = cost.0,
        errors = errors.len(),
        "deploy injected"
    );
    Ok(EvaluateResult { cost, errors })
}
