//! State transition executor
//!
//! Applies an ordered batch of new deploys to a starting root. The fold is an
//! explicit loop carrying `(root, records)`: deploy *i+1* always starts from
//! the root left by deploy *i*, which is unchanged when deploy *i* failed.
//! A failing deploy never aborts the batch; only store faults propagate.

use crate::error::Result;
use crate::injector::{inject, EvaluateResult};
use tracing::{debug, info};
use weave_core::{Deploy, DeployStatus, ProcessedDeploy, Runtime, StateHash};

/// Apply `deploys` in order starting from `start`.
///
/// Returns the post-state root and one record per deploy. Every record
/// carries the event log its execution produced, so the block can be replayed
/// even where the deploy failed.
pub async fn compute_state(
    runtime: &Runtime,
    start: StateHash,
    deploys: &[Deploy],
) -> Result<(StateHash, Vec<ProcessedDeploy>)> {
    let mut root = start;
    let mut processed = Vec::with_capacity(deploys.len());

    for (index, deploy) in deploys.iter().enumerate() {
        runtime.space.reset(&root).await?;

        let EvaluateResult { cost, errors } = inject(
            runtime.reducer.as_ref(),
            &runtime.cost,
            deploy,
            deploy.phlo_limit,
        )
        .await?;

        let checkpoint = runtime.space.create_checkpoint().await?;
        let status = DeployStatus::from_errors(errors);

        if !status.is_failed() {
            root = checkpoint.root;
        }

        debug!(
            index,
            deploy = %deploy.short_id(),
            cost = cost.0,
            failed = status.is_failed(),
            internal = status.is_internal_error(),
            root = %root,
            "deploy processed"
        );

        processed.push(ProcessedDeploy {
            deploy: deploy.clone(),
            cost,
            log: checkpoint.log,
            status,
        });
    }

    info!(
        deploys = processed.len(),
        failed = processed.iter().filter(|p| p.status.is_failed()).count(),
        start = %start,
        post_state = %root,
        "batch computed"
    );

    Ok((root, processed))
}
