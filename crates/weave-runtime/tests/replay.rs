//! Replay validator tests
//!
//! - Replaying a computed batch reproduces its post-state root
//! - A flipped status is reported at exactly that deploy
//! - Internal errors and unreproduced comm events abort replay
//! - Store faults surface as engine errors, not replay failures

mod common;

use common::*;
use weave_core::{
    CommEvent, ConsumeEvent, DeployStatus, Event, EventHash, InterpreterError, ProduceEvent,
    SpaceError,
};
use weave_runtime::{ReplayFailureReason, RuntimeError};
use weave_testkit::deploy;

#[tokio::test]
async fn replay_reproduces_computed_root() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let d1 = deploy("transfer 0xaa 0xbb 30", 1);
    let d2 = deploy("transfer 0xbb 0xcc 1000", 2);
    let (r1, records) = h.manager.compute_state(r0, &[d1, d2]).await.unwrap();

    let replayed = h.manager.replay_compute_state(r0, &records).await.unwrap();
    assert_eq!(replayed, Ok(r1));
}

#[tokio::test]
async fn replay_of_genesis_matches() {
    let h = harness().await;
    let genesis = weave_testkit::genesis_deploys(&[(ALICE, 5), (BOB, 7)], &[(VALIDATOR_1, 1)]);
    let result = h.manager.compute_genesis(&genesis).await.unwrap();
    assert_eq!(result.start, h.manager.empty_state_hash());

    let replayed = h
        .manager
        .replay_compute_state(result.start, &result.processed)
        .await
        .unwrap();
    assert_eq!(replayed, Ok(result.post_state));
}

#[tokio::test]
async fn flipped_success_is_a_status_mismatch() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let d1 = deploy("transfer 0xaa 0xbb 30", 1);
    let d2 = deploy("transfer 0xbb 0xcc 1000", 2);
    let (_, mut records) = h.manager.compute_state(r0, &[d1.clone(), d2]).await.unwrap();

    records[0].status = DeployStatus::UserErrors(vec![InterpreterError::OutOfPhlogistons]);
    let failure = h
        .manager
        .replay_compute_state(r0, &records)
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(failure.deploy, Some(d1));
    assert_eq!(
        failure.reason,
        ReplayFailureReason::ReplayStatusMismatch {
            replay_failed: false,
            initial_failed: true,
        }
    );
}

#[tokio::test]
async fn stripped_comm_events_starve_the_replayed_transfer() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let d1 = deploy("transfer 0xaa 0xbb 30", 1);
    let (_, mut records) = h.manager.compute_state(r0, &[d1.clone()]).await.unwrap();
    assert!(!records[0].status.is_failed());

    // Without its comm events the vault read never fires on replay, so the
    // transfer sees an empty balance and fails
    records[0].log.retain(|event| !matches!(event, Event::Comm(_)));
    let failure = h
        .manager
        .replay_compute_state(r0, &records)
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(failure.deploy, Some(d1));
    assert_eq!(
        failure.reason,
        ReplayFailureReason::ReplayStatusMismatch {
            replay_failed: true,
            initial_failed: false,
        }
    );
}

#[tokio::test]
async fn flipped_failure_is_a_status_mismatch() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let ok = deploy("send \"x\" 1", 1);
    let bad = deploy("fail \"nope\"", 2);
    let (_, mut records) = h
        .manager
        .compute_state(r0, &[ok, bad.clone()])
        .await
        .unwrap();

    records[1].status = DeployStatus::Succeeded;
    let failure = h
        .manager
        .replay_compute_state(r0, &records)
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(failure.deploy, Some(bad));
    assert_eq!(
        failure.reason,
        ReplayFailureReason::ReplayStatusMismatch {
            replay_failed: true,
            initial_failed: false,
        }
    );
}

#[tokio::test]
async fn internal_error_aborts_replay() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let faulty = deploy("abort \"engine\"", 1);
    let later = deploy("send \"x\" 1", 2);
    let (_, records) = h
        .manager
        .compute_state(r0, &[faulty.clone(), later])
        .await
        .unwrap();

    let failure = h
        .manager
        .replay_compute_state(r0, &records)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure.deploy, Some(faulty));
    assert!(matches!(
        failure.reason,
        ReplayFailureReason::InternalErrors(ref errors) if errors[0].is_internal()
    ));
}

fn bogus_comm() -> Event {
    let hash = EventHash([0x42; 32]);
    Event::Comm(CommEvent {
        consume: ConsumeEvent {
            channel_hashes: vec![hash],
            hash,
            persistent: false,
        },
        produces: vec![ProduceEvent {
            channel_hash: hash,
            hash,
            persistent: false,
        }],
    })
}

#[tokio::test]
async fn unreproduced_comm_event_aborts_replay() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let d1 = deploy("transfer 0xaa 0xbb 1", 1);
    let (_, mut records) = h.manager.compute_state(r0, &[d1.clone()]).await.unwrap();

    records[0].log.push(bogus_comm());
    let failure = h
        .manager
        .replay_compute_state(r0, &records)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure.deploy, Some(d1));
    assert!(matches!(failure.reason, ReplayFailureReason::UnusedCommEvent { .. }));
}

#[tokio::test]
async fn malformed_log_is_rejected_at_rig() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let d1 = deploy("send \"x\" 1", 1);
    let (_, mut records) = h.manager.compute_state(r0, &[d1.clone()]).await.unwrap();

    let Event::Comm(mut comm) = bogus_comm() else {
        unreachable!()
    };
    comm.produces.clear();
    records[0].log.push(Event::Comm(comm));

    let failure = h
        .manager
        .replay_compute_state(r0, &records)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure.deploy, Some(d1));
    assert!(matches!(failure.reason, ReplayFailureReason::UnusedCommEvent { .. }));
}

#[tokio::test]
async fn replay_stops_at_first_divergence() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let batch = vec![
        deploy("send \"a\" 1", 1),
        deploy("send \"b\" 2", 2),
        deploy("send \"c\" 3", 3),
    ];
    let (_, mut records) = h.manager.compute_state(r0, &batch).await.unwrap();
    records[1].status = DeployStatus::UserErrors(vec![]);
    records[2].status = DeployStatus::UserErrors(vec![]);

    let failure = h
        .manager
        .replay_compute_state(r0, &records)
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(failure.deploy, Some(batch[1].clone()));
}

#[tokio::test]
async fn store_fault_is_an_engine_error() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let (_, records) = h
        .manager
        .compute_state(r0, &[deploy("send \"x\" 1", 1)])
        .await
        .unwrap();

    h.replay_space.inject_fault(SpaceError::storage("replay store offline"));
    let err = h
        .manager
        .replay_compute_state(r0, &records)
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Space(SpaceError::Storage { .. })));

    h.replay_space.clear_fault();
    assert!(h.manager.replay_compute_state(r0, &records).await.unwrap().is_ok());
}

#[tokio::test]
async fn replay_of_empty_batch_returns_start() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    assert_eq!(h.manager.replay_compute_state(r0, &[]).await.unwrap(), Ok(r0));
}
