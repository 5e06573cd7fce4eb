//! State transition executor tests
//!
//! - A failed deploy leaves the root unchanged for its successor
//! - Failures are classified user or internal and never abort the batch
//! - Cost never exceeds the deploy's budget
//! - Identical inputs produce identical roots and records

mod common;

use common::*;
use weave_core::{Channel, DeployStatus, InterpreterError, Value};
use weave_testkit::{deploy, deploy_with_limit, vault_channel, STEP_COST};

#[tokio::test]
async fn transfer_batch_advances_only_on_success() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;

    let d1 = deploy("transfer 0xaa 0xbb 30", 1);
    let d2 = deploy("transfer 0xbb 0xcc 1000", 2);
    let (r1, records) = h
        .manager
        .compute_state(r0, &[d1.clone(), d2.clone()])
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].deploy, d1);
    assert_eq!(records[0].status, DeployStatus::Succeeded);
    assert_eq!(records[1].deploy, d2);
    assert!(matches!(
        records[1].status,
        DeployStatus::UserErrors(ref errors) if matches!(errors[..], [InterpreterError::UserAbort { .. }])
    ));
    assert_ne!(r1, r0);

    // R1 reflects only D1
    let (only_d1, _) = h.manager.compute_state(r0, &[d1]).await.unwrap();
    assert_eq!(r1, only_d1);

    let bob = vault_channel(&Value::Bytes(BOB.to_vec())).unwrap();
    assert_eq!(h.manager.get_data(&r1, &bob).await.unwrap(), vec![Value::Int(30)]);
}

#[tokio::test]
async fn failed_deploy_does_not_advance_root() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;

    let failing = deploy("send \"trace\" 1; fail \"rejected\"", 1);
    let (root, records) = h.manager.compute_state(r0, &[failing]).await.unwrap();
    assert_eq!(root, r0);
    assert!(records[0].status.is_failed());
    // The partial effect before the failure is not visible
    let trace = h
        .manager
        .get_data(&root, &Channel::public("trace"))
        .await
        .unwrap();
    assert!(trace.is_empty());
}

#[tokio::test]
async fn successor_sees_root_before_failed_deploy() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;

    let ok = deploy("send \"log\" 1", 1);
    let bad = deploy("send \"log\" 2; fail \"no\"", 2);
    let (with_failure, records) = h
        .manager
        .compute_state(r0, &[ok.clone(), bad, ok.clone()])
        .await
        .unwrap();
    assert_eq!(records.len(), 3);
    assert!(records[1].status.is_failed());

    let (without_failure, _) = h.manager.compute_state(r0, &[ok.clone(), ok]).await.unwrap();
    assert_eq!(with_failure, without_failure);

    let log = h
        .manager
        .get_data(&with_failure, &Channel::public("log"))
        .await
        .unwrap();
    assert_eq!(log, vec![Value::Int(1), Value::Int(1)]);
}

#[tokio::test]
async fn internal_errors_are_classified_and_batch_continues() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;

    let faulty = deploy("abort \"interpreter bug\"", 1);
    let after = deploy("send \"after\" true", 2);
    let (root, records) = h.manager.compute_state(r0, &[faulty, after]).await.unwrap();

    assert!(records[0].status.is_internal_error());
    assert_eq!(records[1].status, DeployStatus::Succeeded);
    assert_ne!(root, r0);
}

#[tokio::test]
async fn syntax_error_is_a_user_error() {
    let h = harness().await;
    let r0 = h.manager.empty_state_hash();
    let (root, records) = h
        .manager
        .compute_state(r0, &[deploy("send", 1)])
        .await
        .unwrap();
    assert_eq!(root, r0);
    assert!(matches!(
        records[0].status,
        DeployStatus::UserErrors(ref errors) if matches!(errors[..], [InterpreterError::Syntax { .. }])
    ));
}

#[tokio::test]
async fn exhausted_budget_costs_exactly_the_limit() {
    let h = harness().await;
    let r0 = h.manager.empty_state_hash();

    let greedy = deploy_with_limit("burn 10000", 250, 1);
    let modest = deploy_with_limit("send \"x\" 1; send \"y\" 2", 250, 2);
    let (_, records) = h
        .manager
        .compute_state(r0, &[greedy, modest])
        .await
        .unwrap();

    assert_eq!(
        records[0].status,
        DeployStatus::UserErrors(vec![InterpreterError::OutOfPhlogistons])
    );
    assert_eq!(records[0].cost.0, 250);
    assert_eq!(records[1].cost.0, 2 * STEP_COST);
}

#[tokio::test]
async fn empty_batch_returns_start() {
    let h = harness().await;
    let r0 = h.manager.empty_state_hash();
    let (root, records) = h.manager.compute_state(r0, &[]).await.unwrap();
    assert_eq!(root, r0);
    assert!(records.is_empty());
}

#[tokio::test]
async fn records_carry_event_logs() {
    let h = harness().await;
    let r0 = funded_state(&h.manager).await;
    let (_, records) = h
        .manager
        .compute_state(
            r0,
            &[
                deploy("transfer 0xaa 0xbb 1", 1),
                deploy("transfer 0xcc 0xaa 5", 2),
            ],
        )
        .await
        .unwrap();
    assert!(!weave_core::comm_events(&records[0].log).is_empty());
    // The failed deploy still produced events replay will need
    assert!(records[1].status.is_failed());
    assert!(!records[1].log.is_empty());
}

#[tokio::test]
async fn unknown_start_root_is_an_engine_error() {
    let h = harness().await;
    let bogus = weave_core::StateHash::new([0x55; 32]);
    let err = h
        .manager
        .compute_state(bogus, &[deploy("send \"x\" 1", 1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        weave_runtime::RuntimeError::Space(weave_core::SpaceError::UnknownRoot { .. })
    ));
}

#[tokio::test]
async fn execution_is_deterministic() {
    let batch = vec![
        deploy("new n; send $n 1; transfer 0xaa 0xbb 10", 1),
        deploy("listen \"box\" v { send \"seen\" $v }\nsend \"box\" 3", 2),
        deploy("transfer 0xbb 0xcc 500", 3),
    ];

    let first = harness().await;
    let second = harness().await;
    let r0_first = funded_state(&first.manager).await;
    let r0_second = funded_state(&second.manager).await;
    assert_eq!(r0_first, r0_second);

    let a = first.manager.compute_state(r0_first, &batch).await.unwrap();
    let b = second.manager.compute_state(r0_second, &batch).await.unwrap();
    assert_eq!(a, b);
}
