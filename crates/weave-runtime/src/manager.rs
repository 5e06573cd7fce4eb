//! Runtime manager
//!
//! Public face of the engine. Owns the guarded runtime, the configuration and
//! the bootstrapped empty-state root. Every operation holds the runtime for
//! its full duration, so operations issued concurrently execute one at a
//! time, in arrival order.

use crate::bootstrap;
use crate::config::RuntimeConfig;
use crate::error::{ReplayResult, Result};
use crate::guard::RuntimeGuard;
use crate::query;
use crate::replay;
use crate::transition;
use std::sync::Arc;
use tracing::info;
use weave_core::{
    Bond, Channel, Deploy, Pattern, ProcessedDeploy, Runtime, StateHash, Term, Value,
};

/// Result of applying a genesis batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisResult {
    /// Root the batch started from
    pub start: StateHash,
    /// Root after the batch
    pub post_state: StateHash,
    /// One record per genesis deploy
    pub processed: Vec<ProcessedDeploy>,
}

/// Handle to the node's state-transition engine
#[derive(Debug, Clone)]
pub struct RuntimeManager {
    empty_state_hash: StateHash,
    guard: RuntimeGuard,
    config: Arc<RuntimeConfig>,
}

impl RuntimeManager {
    /// Take ownership of `runtime`, bootstrap the empty state and return a
    /// ready manager
    pub async fn from_runtime(runtime: Runtime, config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        let guard = RuntimeGuard::new(runtime);
        let empty_state_hash = {
            let lease = guard.acquire().await;
            bootstrap::empty_state_hash(&lease).await?
        };
        info!(empty_state = %empty_state_hash, result_channel = %config.result_channel, "runtime manager ready");
        Ok(Self {
            empty_state_hash,
            guard,
            config: Arc::new(config),
        })
    }

    /// Root of the empty, registry-seeded state
    pub fn empty_state_hash(&self) -> StateHash {
        self.empty_state_hash
    }

    /// Active configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The guard serializing access to the runtime
    pub fn guard(&self) -> &RuntimeGuard {
        &self.guard
    }

    /// Apply new deploys to `start`
    pub async fn compute_state(
        &self,
        start: StateHash,
        deploys: &[Deploy],
    ) -> Result<(StateHash, Vec<ProcessedDeploy>)> {
        let lease = self.guard.acquire().await;
        transition::compute_state(&lease, start, deploys).await
    }

    /// Apply the genesis batch to the empty state
    pub async fn compute_genesis(&self, deploys: &[Deploy]) -> Result<GenesisResult> {
        let start = self.empty_state_hash;
        let lease = self.guard.acquire().await;
        let (post_state, processed) = transition::compute_state(&lease, start, deploys).await?;
        info!(deploys = deploys.len(), post_state = %post_state, "genesis computed");
        Ok(GenesisResult {
            start,
            post_state,
            processed,
        })
    }

    /// Validate a recorded batch against `start`
    pub async fn replay_compute_state(
        &self,
        start: StateHash,
        records: &[ProcessedDeploy],
    ) -> Result<ReplayResult> {
        let lease = self.guard.acquire().await;
        replay::replay_compute_state(&lease, start, records).await
    }

    /// Run `deploy` against `start` without committing and read `name`
    pub async fn capture_results(
        &self,
        start: &StateHash,
        deploy: &Deploy,
        name: &Channel,
    ) -> Result<Vec<Value>> {
        let lease = self.guard.acquire().await;
        query::capture_results(&lease, start, deploy, name).await
    }

    /// Evaluate `term` against `start` and read the result channel.
    ///
    /// The term is expected to publish on the configured result channel.
    pub async fn play_exploratory_deploy(
        &self,
        start: &StateHash,
        term: Term,
    ) -> Result<Vec<Value>> {
        let deploy = Deploy::system(term, self.config.system_phlo_limit);
        let lease = self.guard.acquire().await;
        query::capture_results(&lease, start, &deploy, &self.config.result_channel()).await
    }

    /// Active validator bonds at `start`
    pub async fn compute_bonds(&self, start: &StateHash) -> Result<Vec<Bond>> {
        let lease = self.guard.acquire().await;
        query::compute_bonds(&lease, &self.config, start).await
    }

    /// Vault balance of `identity` at `start`
    pub async fn compute_balance(&self, start: &StateHash, identity: &[u8]) -> Result<i64> {
        let lease = self.guard.acquire().await;
        query::compute_balance(&lease, &self.config, start, identity).await
    }

    /// Charge `amount` to `payer` and return the committed root
    pub async fn deploy_payment(
        &self,
        start: &StateHash,
        payer: &[u8],
        amount: u64,
    ) -> Result<StateHash> {
        let lease = self.guard.acquire().await;
        query::deploy_payment(&lease, &self.config, start, payer, amount).await
    }

    /// Data published on `channel` at `start`
    pub async fn get_data(&self, start: &StateHash, channel: &Channel) -> Result<Vec<Value>> {
        let lease = self.guard.acquire().await;
        query::get_data(&lease, start, channel).await
    }

    /// Program continuations waiting on `channels` at `start`
    pub async fn get_continuation(
        &self,
        start: &StateHash,
        channels: &[Channel],
    ) -> Result<Vec<(Vec<Pattern>, Term)>> {
        let lease = self.guard.acquire().await;
        query::get_continuation(&lease, start, channels).await
    }

    /// Human-readable dump of the space at `start`
    pub async fn storage_repr(&self, start: &StateHash) -> String {
        let lease = self.guard.acquire().await;
        query::storage_repr(&lease, start).await
    }
}
