//! Read-only queries against historical roots
//!
//! Every query resets the primary space to the requested root, reads, and
//! walks away: nothing here commits a checkpoint except
//! [`deploy_payment`], whose whole purpose is to produce a new root.

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::injector::inject;
use std::fmt::Write as _;
use tracing::{debug, warn};
use weave_core::{
    Bond, Channel, Deploy, DeployStatus, Pattern, Runtime, SpaceRow, StateHash,
    TaggedContinuation, Term, Value,
};

/// Run `deploy` against `start` and return whatever it published on `name`.
///
/// Effects are discarded. User errors are logged and the channel is read
/// anyway; an interpreter engine fault fails the query.
pub async fn capture_results(
    runtime: &Runtime,
    start: &StateHash,
    deploy: &Deploy,
    name: &Channel,
) -> Result<Vec<Value>> {
    runtime.space.reset(start).await?;

    let result = inject(
        runtime.reducer.as_ref(),
        &runtime.cost,
        deploy,
        deploy.phlo_limit,
    )
    .await?;

    match DeployStatus::from_errors(result.errors) {
        DeployStatus::Succeeded => {}
        DeployStatus::UserErrors(errors) => {
            warn!(deploy = %deploy.short_id(), ?errors, "query deploy reported errors");
        }
        DeployStatus::InternalErrors(errors) => {
            return Err(RuntimeError::Interpreter { errors });
        }
    }

    let data = runtime.space.get_data(name).await?;
    debug!(channel = %name, results = data.len(), cost = result.cost.0, "results captured");
    Ok(data.into_iter().map(|datum| datum.value).collect())
}

/// Active validator bonds at `start`
pub async fn compute_bonds(
    runtime: &Runtime,
    config: &RuntimeConfig,
    start: &StateHash,
) -> Result<Vec<Bond>> {
    let deploy = Deploy::system(
        config.programs.bonds_query(&config.result_channel),
        config.system_phlo_limit,
    );
    let results = capture_results(runtime, start, &deploy, &config.result_channel()).await?;

    match results.as_slice() {
        [bonds] => parse_bonds(bonds),
        other => Err(RuntimeError::invalid_argument(format!(
            "Expected exactly 1 bonds map, got {}",
            other.len()
        ))),
    }
}

/// Decode the bonds map: identity bytes to integer stake
pub fn parse_bonds(value: &Value) -> Result<Vec<Bond>> {
    let Value::Map(entries) = value else {
        return Err(RuntimeError::malformed(format!(
            "bonds result is not a map: {value}"
        )));
    };

    entries
        .iter()
        .map(|(validator, stake)| {
            let validator = validator.as_bytes().ok_or_else(|| {
                RuntimeError::malformed(format!("bond key is not an identity: {validator}"))
            })?;
            let stake = stake.as_int().ok_or_else(|| {
                RuntimeError::malformed(format!("bond stake is not an integer: {stake}"))
            })?;
            Ok(Bond {
                validator: validator.to_vec(),
                stake,
            })
        })
        .collect()
}

/// Vault balance of `identity` at `start`
pub async fn compute_balance(
    runtime: &Runtime,
    config: &RuntimeConfig,
    start: &StateHash,
    identity: &[u8],
) -> Result<i64> {
    let deploy = Deploy::system(
        config
            .programs
            .balance_query(&config.result_channel, identity),
        config.system_phlo_limit,
    );
    let results = capture_results(runtime, start, &deploy, &config.result_channel()).await?;

    match results.as_slice() {
        [Value::Int(balance)] => Ok(*balance),
        other => Err(RuntimeError::invalid_argument(format!(
            "Expected exactly 1 integer balance for {}, got {other:?}",
            hex::encode(identity)
        ))),
    }
}

/// Charge `amount` to `payer` through the fee-collection contract and commit.
///
/// The contract is assumed to terminate and succeed for valid deploys; its
/// causes are logged, not re-verified.
pub async fn deploy_payment(
    runtime: &Runtime,
    config: &RuntimeConfig,
    start: &StateHash,
    payer: &[u8],
    amount: u64,
) -> Result<StateHash> {
    let deploy = Deploy::system(
        config.programs.payment(payer, amount),
        config.system_phlo_limit,
    );

    runtime.space.reset(start).await?;
    let result = inject(
        runtime.reducer.as_ref(),
        &runtime.cost,
        &deploy,
        deploy.phlo_limit,
    )
    .await?;
    if !result.errors.is_empty() {
        warn!(payer = %hex::encode(payer), amount, errors = ?result.errors, "payment reported errors");
    }

    let checkpoint = runtime.space.create_checkpoint().await?;
    debug!(payer = %hex::encode(payer), amount, root = %checkpoint.root, "payment applied");
    Ok(checkpoint.root)
}

/// Data published on `channel` at `start`
pub async fn get_data(
    runtime: &Runtime,
    start: &StateHash,
    channel: &Channel,
) -> Result<Vec<Value>> {
    runtime.space.reset(start).await?;
    let data = runtime.space.get_data(channel).await?;
    Ok(data.into_iter().map(|datum| datum.value).collect())
}

/// Program continuations waiting on `channels` at `start`.
///
/// Continuations backed by native handlers have no term form and are
/// skipped.
pub async fn get_continuation(
    runtime: &Runtime,
    start: &StateHash,
    channels: &[Channel],
) -> Result<Vec<(Vec<Pattern>, Term)>> {
    runtime.space.reset(start).await?;
    let waiting = runtime.space.get_waiting_continuations(channels).await?;
    Ok(waiting
        .into_iter()
        .filter_map(|wk| match wk.continuation {
            TaggedContinuation::Program(term) => Some((wk.patterns, term)),
            TaggedContinuation::Native(_) => None,
        })
        .collect())
}

/// Human-readable dump of the space at `start`; empty on any failure
pub async fn storage_repr(runtime: &Runtime, start: &StateHash) -> String {
    let rows = match runtime.space.reset(start).await {
        Ok(()) => runtime.space.rows().await,
        Err(err) => Err(err),
    };
    match rows {
        Ok(rows) => render_rows(&rows),
        Err(err) => {
            warn!(root = %start, error = %err, "storage dump failed");
            String::new()
        }
    }
}

fn render_rows(rows: &[SpaceRow]) -> String {
    let mut out = String::new();
    for row in rows {
        if let [channel] = row.channels.as_slice() {
            for datum in &row.data {
                let send = if datum.persist { "!!" } else { "!" };
                let _ = writeln!(out, "{channel}{send}({})", datum.value);
            }
        }
        for wk in &row.continuations {
            let binds = wk
                .patterns
                .iter()
                .zip(&row.channels)
                .map(|(pattern, channel)| format!("{pattern} <- {channel}"))
                .collect::<Vec<_>>()
                .join("; ");
            let arrow = if wk.persist { "<=" } else { "<-" };
            let body = match &wk.continuation {
                TaggedContinuation::Program(term) => term.source().to_string(),
                TaggedContinuation::Native(id) => format!("<native {id}>"),
            };
            let _ = writeln!(out, "for({binds}) {arrow} {{ {body} }}");
        }
    }
    out
}
