//! Shared setup for engine integration tests

#![allow(dead_code)]

use std::sync::Arc;
use weave_core::StateHash;
use weave_runtime::{RuntimeConfig, RuntimeManager, SystemPrograms};
use weave_testkit::{
    genesis_deploys, init_test_tracing, programs, test_runtime, MemoryTupleSpace, TestRuntime,
};

pub const ALICE: &[u8] = &[0xaa];
pub const BOB: &[u8] = &[0xbb];
pub const CAROL: &[u8] = &[0xcc];
pub const VALIDATOR_1: &[u8] = &[0x01, 0x01];
pub const VALIDATOR_2: &[u8] = &[0x02, 0x02];

/// Configuration running the testkit's script programs
pub fn script_config() -> RuntimeConfig {
    RuntimeConfig {
        system_phlo_limit: 1_000,
        programs: SystemPrograms {
            bonds: programs::BONDS_QUERY.to_string(),
            balance: programs::BALANCE_QUERY.to_string(),
            payment: programs::PAYMENT.to_string(),
        },
        ..RuntimeConfig::default()
    }
}

/// A bootstrapped manager plus handles to its spaces
pub struct Harness {
    pub manager: RuntimeManager,
    pub space: Arc<MemoryTupleSpace>,
    pub replay_space: Arc<MemoryTupleSpace>,
}

pub async fn harness() -> Harness {
    harness_with(script_config()).await
}

pub async fn harness_with(config: RuntimeConfig) -> Harness {
    init_test_tracing();
    let TestRuntime {
        runtime,
        space,
        replay_space,
    } = test_runtime();
    let manager = RuntimeManager::from_runtime(runtime, config)
        .await
        .expect("bootstrap");
    Harness {
        manager,
        space,
        replay_space,
    }
}

/// Genesis funding Alice with 100 and bonding two validators
pub async fn funded_state(manager: &RuntimeManager) -> StateHash {
    let genesis = genesis_deploys(&[(ALICE, 100)], &[(VALIDATOR_1, 10), (VALIDATOR_2, 20)]);
    let result = manager.compute_genesis(&genesis).await.expect("genesis");
    assert!(result.processed.iter().all(|p| !p.status.is_failed()));
    result.post_state
}
