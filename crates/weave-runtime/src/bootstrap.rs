//! Empty-state bootstrap
//!
//! Both spaces are cleared, seeded with the name registry's root map, and
//! checkpointed. The two roots must agree or the node cannot validate any
//! block it did not produce itself.

use crate::error::{Result, RuntimeError};
use tracing::{debug, info};
use weave_core::{Channel, Datum, Runtime, StateHash, TupleSpaceEffects, Value};

/// Unforgeable id of the registry root channel
pub const REGISTRY_ROOT_ID: [u8; 32] = [
    0xa4, 0xfd, 0x44, 0x7d, 0xed, 0xfc, 0x96, 0x0a, 0x97, 0x2c, 0x91, 0xb2, 0x2d, 0x6f, 0x7e,
    0x55, 0x81, 0x19, 0xe1, 0x4d, 0x95, 0x28, 0x0b, 0x6e, 0x0c, 0x30, 0x60, 0x3a, 0x5b, 0x78,
    0x11, 0x20,
];

/// Channel holding the registry's root map
pub fn registry_root_channel() -> Channel {
    Channel::unforgeable(REGISTRY_ROOT_ID)
}

async fn seed_space<S: TupleSpaceEffects + ?Sized>(space: &S) -> Result<StateHash> {
    space.clear().await?;
    space
        .install(registry_root_channel(), Datum::once(Value::Map(Vec::new())))
        .await?;
    Ok(space.create_checkpoint().await?.root)
}

/// Compute the root of the empty, registry-seeded state on both spaces
pub async fn empty_state_hash(runtime: &Runtime) -> Result<StateHash> {
    let primary = seed_space(runtime.space.as_ref()).await?;
    debug!(root = %primary, "primary space bootstrapped");

    let replay = seed_space(runtime.replay_space.as_ref()).await?;
    debug!(root = %replay, "replay space bootstrapped");

    if primary != replay {
        return Err(RuntimeError::BootstrapDivergence { primary, replay });
    }

    info!(empty_state = %primary, "runtime bootstrapped");
    Ok(primary)
}
