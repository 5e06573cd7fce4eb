//! Runtime fixtures
//!
//! A [`TestRuntime`] wires script interpreters to a primary/replay pair of
//! in-memory spaces and keeps handles to both spaces so tests can inspect
//! them or inject store faults after the runtime has been handed off.

use crate::interpreter::ScriptInterpreter;
use crate::space::MemoryTupleSpace;
use std::sync::{Arc, Once};
use weave_core::{Deploy, Runtime, Term};

/// Deployer identity used by [`deploy`]
pub const TEST_DEPLOYER: [u8; 4] = [0xde, 0xad, 0xbe, 0xef];

/// Default phlo budget for test deploys
pub const TEST_PHLO_LIMIT: u64 = 10_000;

/// A runtime plus handles to its spaces
#[derive(Debug)]
pub struct TestRuntime {
    /// Execution context to hand to the engine
    pub runtime: Runtime,
    /// Primary space
    pub space: Arc<MemoryTupleSpace>,
    /// Replay space, sharing the primary's history
    pub replay_space: Arc<MemoryTupleSpace>,
}

/// Fresh runtime over empty in-memory spaces
pub fn test_runtime() -> TestRuntime {
    let (primary, replay) = MemoryTupleSpace::pair();
    let space = Arc::new(primary);
    let replay_space = Arc::new(replay);
    let runtime = Runtime::new(
        Arc::new(ScriptInterpreter::new(Arc::clone(&space))),
        Arc::new(ScriptInterpreter::new(Arc::clone(&replay_space))),
        Arc::clone(&space) as _,
        Arc::clone(&replay_space) as _,
    );
    TestRuntime {
        runtime,
        space,
        replay_space,
    }
}

/// Signed-looking deploy from [`TEST_DEPLOYER`] with the default budget.
///
/// `timestamp` distinguishes otherwise identical deploys.
pub fn deploy(source: &str, timestamp: i64) -> Deploy {
    deploy_with_limit(source, TEST_PHLO_LIMIT, timestamp)
}

/// Deploy with an explicit phlo budget
pub fn deploy_with_limit(source: &str, phlo_limit: u64, timestamp: i64) -> Deploy {
    Deploy {
        deployer: TEST_DEPLOYER.to_vec(),
        term: Term::new(source),
        phlo_limit,
        phlo_price: 1,
        timestamp,
        sig: weave_core::hash::hash(&timestamp.to_le_bytes()).to_vec(),
        sig_algorithm: "ed25519".to_string(),
    }
}

/// Genesis deploys funding `accounts` and bonding `validators`
pub fn genesis_deploys(accounts: &[(&[u8], i64)], validators: &[(&[u8], i64)]) -> Vec<Deploy> {
    let mut source = String::new();
    for (identity, amount) in accounts {
        source.push_str(&format!("mint 0x{} {amount}\n", hex::encode(identity)));
    }
    for (identity, stake) in validators {
        source.push_str(&format!("bond 0x{} {stake}\n", hex::encode(identity)));
    }
    vec![deploy(&source, 0)]
}

/// Install a test subscriber once per process; `RUST_LOG` filters it
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
