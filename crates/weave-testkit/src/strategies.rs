//! Property test strategies for deploy batches
//!
//! Batches are drawn over a small fixed set of funded accounts so that
//! transfers regularly both succeed and run out of funds.

use crate::fixtures::deploy_with_limit;
use proptest::prelude::*;
use weave_core::Deploy;

// Re-export proptest for convenience
pub use proptest;

/// Accounts funded by [`funded_genesis_source`]
pub const ACCOUNTS: [[u8; 1]; 3] = [[0xa1], [0xb2], [0xc3]];

/// Initial balance of every account in [`ACCOUNTS`]
pub const INITIAL_BALANCE: i64 = 100;

/// Genesis program funding every account in [`ACCOUNTS`]
pub fn funded_genesis_source() -> String {
    ACCOUNTS
        .iter()
        .map(|account| format!("mint 0x{} {INITIAL_BALANCE}", hex::encode(account)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One deploy program: a transfer, a message, a user failure or a burn
pub fn arb_program() -> impl Strategy<Value = String> {
    let account = (0..ACCOUNTS.len()).prop_map(|i| hex::encode(ACCOUNTS[i]));
    prop_oneof![
        4 => (account.clone(), account, 0i64..80)
            .prop_map(|(from, to, amount)| format!("transfer 0x{from} 0x{to} {amount}")),
        2 => (0i64..1000).prop_map(|n| format!(
            "listen \"box\" v {{ send \"seen\" $v }}\nsend \"box\" {n}"
        )),
        1 => prop::collection::vec(b'a'..=b'z', 1..8)
            .prop_map(|msg| format!("fail \"{}\"", String::from_utf8_lossy(&msg))),
        1 => (1i64..50).prop_map(|n| format!("burn {n}")),
    ]
}

/// A batch of deploys with budgets between 5 and 60 phlo
pub fn arb_deploy_batch(max_len: usize) -> impl Strategy<Value = Vec<Deploy>> {
    prop::collection::vec((arb_program(), 5u64..60), 0..=max_len).prop_map(|programs| {
        programs
            .into_iter()
            .enumerate()
            .map(|(i, (source, limit))| deploy_with_limit(&source, limit, i as i64 + 1))
            .collect()
    })
}
