//! Unit tests for the shared HTLC service
//!
//! These tests verify config bootstrap, signer verification, the event log
//! and serialized application of concurrent instructions.

use htlc_bridge::{
    Asset, AuthError, Envelope, Event, HtlcError, HtlcService, InMemoryLedger, Instruction,
};

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::*;

/// Service bootstrapped from the test config with the clock pinned at `T`.
async fn test_service() -> HtlcService<InMemoryLedger> {
    let service = HtlcService::from_config(&build_test_config()).unwrap();
    service.with_ledger(|ledger| ledger.set_time(T)).await;
    service
}

/// Test that bootstrap registers routes, resolvers and balances
/// What is tested: HtlcService::from_config with the test config
/// Why: A freshly started service must serve the configured routes
#[tokio::test]
async fn test_bootstrap_from_config() {
    let service = test_service().await;

    assert_eq!(service.owner().await, addr(OWNER));
    let bridge = service.bridge(BRIDGE_ID).await.expect("bridge registered");
    assert_eq!(bridge.source_chain_id, LOCAL_CHAIN_ID);
    assert_eq!(bridge.target_chain_id, EVM_CHAIN_ID);
    assert!(bridge.is_active);
    assert_eq!(service.bridges().await.len(), 1);
    assert!(service.is_whitelisted(&addr(RESOLVER)).await);
    assert!(!service.is_whitelisted(&addr(STRANGER)).await);

    let balance = service
        .with_ledger(|ledger| ledger.balance(&addr(MAKER), &Asset::Native))
        .await;
    assert_eq!(balance, INITIAL_BALANCE);
}

/// Test that bootstrap fails on a route the registry rejects
/// What is tested: from_config with two bridges sharing an id
/// Why: Misconfigured routes must stop start-up rather than be skipped
#[tokio::test]
async fn test_bootstrap_duplicate_bridge_fails() {
    let mut config = build_test_config();
    config.bridges.push(config.bridges[0].clone());

    let err = HtlcService::from_config(&config).err().expect("should fail");

    assert!(err.to_string().contains("Failed to register bridge"));
}

/// Test that applied instructions are recorded in order and rejections are not
/// What is tested: events after create, a failed fill and a successful fill
/// Why: The event log is what relays replay to the foreign chain
#[tokio::test]
async fn test_event_log_records_successes_only() {
    let service = test_service().await;

    service.apply(create_order_envelope(1, 100, SECRET)).await.unwrap();
    let err = service
        .apply(fill_envelope(RESOLVER, 1, "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err, HtlcError::InvalidSecret);
    service.apply(fill_envelope(RESOLVER, 1, SECRET)).await.unwrap();

    let events = service.events().await;
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Event::OrderCreated { order_id: 1, .. }));
    assert!(matches!(events[1], Event::OrderFilled { order_id: 1, .. }));
    assert_eq!(
        service.revealed_secret(1).await.map(|s| s.as_bytes().to_vec()),
        Some(SECRET.as_bytes().to_vec())
    );
}

/// Test that concurrent fills of the same order pay out exactly once
/// What is tested: ten racing fill tasks against one order
/// Why: Instructions are applied one at a time; only the first fill may win
#[tokio::test]
async fn test_concurrent_fills_single_payout() {
    let service = test_service().await;
    service.apply(create_order_envelope(1, 100, SECRET)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.apply(fill_envelope(RESOLVER, 1, SECRET)).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e.code(), 85),
        }
    }

    assert_eq!(successes, 1);
    let order = service.order(1).await.unwrap();
    assert_eq!(order.total_filled, 100);
    let paid = service
        .with_ledger(|ledger| ledger.balance(&addr(TAKER), &Asset::Native))
        .await;
    assert_eq!(paid, 100);
}

/// Test that concurrent creations with distinct ids all succeed
/// What is tested: twenty parallel create_order instructions with random amounts
/// Why: Serialized application must not lose writes
#[tokio::test]
async fn test_concurrent_creates() {
    use rand::Rng;

    let service = test_service().await;
    let amounts: Vec<u128> = {
        let mut rng = rand::thread_rng();
        (0..20).map(|_| rng.gen_range(BRIDGE_MIN..=BRIDGE_MAX / 20)).collect()
    };
    let total: u128 = amounts.iter().sum();

    let mut handles = Vec::new();
    for (id, amount) in amounts.into_iter().enumerate() {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .apply(create_order_envelope(id as u64 + 1, amount, SECRET))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(service.events().await.len(), 20);
    let escrowed = service
        .with_ledger(|ledger| ledger.escrowed(&Asset::Native))
        .await;
    assert_eq!(escrowed, total);
}

/// Test that bootstrap loads signer keys and verification uses them
/// What is tested: verify on envelopes signed by the right key, a wrong key and an unregistered sender
/// Why: The HTTP route relies on this check before applying anything
#[tokio::test]
async fn test_bootstrap_registers_signers() {
    let service = test_service().await;
    let refund = |sender: &str| Envelope::new(sender, Instruction::Refund { order_id: 1 });

    assert!(service.verify(&sign(refund(MAKER))).is_ok());
    assert_eq!(
        service.verify(&sign_as(STRANGER, refund(MAKER))).unwrap_err(),
        AuthError::InvalidSignature(addr(MAKER))
    );
    assert_eq!(
        service.verify(&sign(refund(TAKER))).unwrap_err(),
        AuthError::UnknownSigner(addr(TAKER))
    );
}

/// Test that a malformed signer key stops bootstrap
/// What is tested: from_config with a public key that is not 32 bytes
/// Why: A typo in [[signers]] must not silently lock a sender out
#[tokio::test]
async fn test_bootstrap_bad_signer_key_fails() {
    let mut config = build_test_config();
    config.signers[0].public_key = "0x1234".to_string();

    let err = HtlcService::from_config(&config).err().expect("should fail");

    assert!(err.to_string().contains("Failed to register signer"));
}

/// Test that the event log keeps only the most recent events
/// What is tested: five creates against a log of capacity three
/// Why: The log must not grow without bound on a long-running service
#[tokio::test]
async fn test_event_log_capacity() {
    let mut config = build_test_config();
    config.api.event_log_capacity = 3;
    let service = HtlcService::from_config(&config).unwrap();
    service.with_ledger(|ledger| ledger.set_time(T)).await;

    for id in 1..=5 {
        service.apply(create_order_envelope(id, 100, SECRET)).await.unwrap();
    }

    let events = service.events().await;
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].order_id(), Some(3));

    let page = service.events_page(0, 10).await;
    assert_eq!(page.first_index, 2);
    assert_eq!(page.events[0].index, 2);
    assert_eq!(page.next_index, 5);
    assert!(service.events_page(5, 10).await.events.is_empty());
}
