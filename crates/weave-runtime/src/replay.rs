//! Replay validator
//!
//! Re-executes a recorded batch on the replay space and checks that every
//! deploy reproduces its recorded classification. The first divergence stops
//! processing and is reported as a [`ReplayFailure`]; store faults are engine
//! errors and propagate separately.

use crate::error::{ReplayFailure, ReplayFailureReason, ReplayResult, Result};
use crate::injector::inject;
use tracing::{debug, info, warn};
use weave_core::{DeployStatus, ProcessedDeploy, Runtime, SpaceError, StateHash};

/// Replay `records` starting from `start`.
///
/// Per record: rig the replay space with the recorded log, re-inject the
/// deploy, compare outcomes. Consistent failures leave the root unchanged;
/// successes must consume every rigged comm event before their checkpoint
/// advances the root.
pub async fn replay_compute_state(
    runtime: &Runtime,
    start: StateHash,
    records: &[ProcessedDeploy],
) -> Result<ReplayResult> {
    let mut root = start;

    for (index, record) in records.iter().enumerate() {
        let deploy = &record.deploy;

        match runtime.replay_space.rig(&root, &record.log).await {
            Ok(()) => {}
            Err(SpaceError::UnusedCommEvent { message }) => {
                warn!(index, deploy = %deploy.short_id(), %message, "replay rig rejected log");
                return Ok(Err(ReplayFailure::at(
                    deploy,
                    ReplayFailureReason::UnusedCommEvent { message },
                )));
            }
            Err(err) => return Err(err.into()),
        }

        let result = inject(
            runtime.replay_reducer.as_ref(),
            &runtime.cost,
            deploy,
            deploy.phlo_limit,
        )
        .await?;

        let replay_status = match DeployStatus::from_errors(result.errors) {
            DeployStatus::InternalErrors(errors) => {
                warn!(index, deploy = %deploy.short_id(), ?errors, "internal errors during replay");
                return Ok(Err(ReplayFailure::at(
                    deploy,
                    ReplayFailureReason::InternalErrors(errors),
                )));
            }
            status => status,
        };

        let replay_failed = replay_status.is_failed();
        let initial_failed = record.status.is_failed();
        if replay_failed != initial_failed {
            warn!(
                index,
                deploy = %deploy.short_id(),
                replay_failed,
                initial_failed,
                "replay status mismatch"
            );
            return Ok(Err(ReplayFailure::at(
                deploy,
                ReplayFailureReason::ReplayStatusMismatch {
                    replay_failed,
                    initial_failed,
                },
            )));
        }

        if replay_failed {
            debug!(index, deploy = %deploy.short_id(), "deploy failed consistently");
            continue;
        }

        match runtime.replay_space.check_replay_data().await {
            Ok(()) => {}
            Err(SpaceError::UnusedCommEvent { message }) => {
                warn!(index, deploy = %deploy.short_id(), %message, "unused comm event");
                return Ok(Err(ReplayFailure::at(
                    deploy,
                    ReplayFailureReason::UnusedCommEvent { message },
                )));
            }
            Err(err) => return Err(err.into()),
        }

        root = runtime.replay_space.create_checkpoint().await?.root;
        debug!(
            index,
            deploy = %deploy.short_id(),
            cost = result.cost.0,
            recorded_cost = record.cost.0,
            root = %root,
            "deploy replayed"
        );
    }

    info!(deploys = records.len(), start = %start, post_state = %root, "batch replayed");
    Ok(Ok(root))
}
