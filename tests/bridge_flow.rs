//! End-to-end test: deposits on mainnet and rollups, global exit root publication, claims, replay

use std::sync::Arc;
use std::thread;

use alloy_primitives::{Address, U256};
use anyhow::Result;
use exit_tree::errors::{AggregatorError, ClaimError, StoreError};
use exit_tree::{
    Bridge, BridgeConfig, Claim, DepositLeaf, Error, ExitLog, ExitRootSlot, InMemoryExitLog,
    JsonLinesExitLog, LogRecord, MerkleBridgeTree,
};

const BRIDGE: Address = Address::repeat_byte(0xb1);
const MANAGER: Address = Address::repeat_byte(0x3a);
const HEIGHT: u8 = 12;

fn config() -> BridgeConfig { BridgeConfig::new(BRIDGE, MANAGER).with_height(HEIGHT) }

fn asset(origin: u32, destination: u32, amount: u64) -> DepositLeaf {
    DepositLeaf::asset(
        origin,
        Address::repeat_byte(0xee),
        destination,
        Address::repeat_byte(0x77),
        U256::from(amount),
        b"token",
    )
}

#[test]
fn test_mainnet_and_rollup_claims() -> Result<()> {
    let bridge = Bridge::new(config())?;

    let mainnet = bridge.deposit(0, &asset(0, 1, 100))?;
    let rollup = bridge.deposit(1, &asset(1, 0, 250))?;
    let message = DepositLeaf::message(4, Address::ZERO, 0, BRIDGE, U256::ZERO, b"hello");
    let other_rollup = bridge.deposit(4, &message)?;

    assert_eq!(other_rollup.global_exit_root, bridge.global_exit_root());
    assert_eq!(bridge.aggregator().history_len(), 3);

    for (network, receipt) in [(0, mainnet), (1, rollup), (4, other_rollup)] {
        let claim = bridge.build_claim(network, receipt.leaf_index)?;
        assert_eq!(claim.leaf, receipt.leaf);

        let verified = bridge.claim(&claim)?;
        assert_eq!(verified.network_id, network);
        assert_eq!(verified.leaf_index, receipt.leaf_index);
        assert_eq!(verified.global_exit_root, bridge.global_exit_root());
    }
    Ok(())
}

#[test]
fn test_historical_claim_after_later_deposits() -> Result<()> {
    let bridge = Bridge::new(config())?;

    let first = bridge.deposit(2, &asset(2, 0, 1))?;
    let stale_claim = bridge.build_claim(2, first.leaf_index)?;
    for amount in 2..20 {
        bridge.deposit(2, &asset(2, 0, amount))?;
        bridge.deposit(0, &asset(0, 2, amount))?;
    }

    assert_ne!(bridge.global_exit_root(), first.global_exit_root);
    let verified = bridge.claim(&stale_claim)?;
    assert_eq!(verified.global_exit_root, first.global_exit_root);
    assert_eq!(verified.sequence, 0);

    let fresh_claim = bridge.build_claim(2, 5)?;
    assert_ne!(fresh_claim.rollup_exit_root, stale_claim.rollup_exit_root);
    bridge.claim(&fresh_claim)?;
    Ok(())
}

#[test]
fn test_rejected_claims_change_nothing() -> Result<()> {
    let bridge = Bridge::new(config())?;
    bridge.deposit(0, &asset(0, 1, 10))?;
    bridge.deposit(0, &asset(0, 1, 20))?;
    let claim = bridge.build_claim(0, 1)?;

    let forged = Claim { leaf: [0x42; 32], ..claim.clone() };
    assert!(matches!(
        bridge.claim(&forged),
        Err(Error::Claim(ClaimError::InvalidProof { network_id: 0, leaf_index: 1 }))
    ));

    let unknown_root = Claim { rollup_exit_root: [0x01; 32], ..claim.clone() };
    assert!(matches!(
        bridge.claim(&unknown_root),
        Err(Error::Claim(ClaimError::GlobalExitRootNotFound(_)))
    ));
    assert!(!bridge.is_claimed(0, 1));

    bridge.claim(&claim)?;
    assert!(matches!(
        bridge.claim(&claim),
        Err(Error::Claim(ClaimError::AlreadyClaimed { network_id: 0, leaf_index: 1 }))
    ));
    Ok(())
}

#[test]
fn test_unauthorized_slot_update() -> Result<()> {
    let bridge = Bridge::new(config())?;
    bridge.deposit(0, &asset(0, 1, 10))?;
    let before = bridge.aggregator().exit_roots();

    let result = bridge.aggregator().update_exit_root(ExitRootSlot::Rollup, [9u8; 32], BRIDGE);

    assert!(matches!(
        result,
        Err(Error::Aggregator(AggregatorError::Unauthorized { slot: ExitRootSlot::Rollup, caller }))
            if caller == BRIDGE
    ));
    assert_eq!(bridge.aggregator().exit_roots(), before);
    Ok(())
}

#[test]
fn test_concurrent_deposits() -> Result<()> {
    let bridge = Arc::new(Bridge::new(config())?);
    let networks = [0u32, 1, 2, 3];

    let handles: Vec<_> = networks
        .iter()
        .map(|&network| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                (0..25u64)
                    .filter(|&amount| bridge.deposit(network, &asset(network, 0, amount)).is_ok())
                    .count()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("depositor should not panic"), 25);
    }

    for network in networks {
        let expected = MerkleBridgeTree::from_leaves(
            HEIGHT,
            exit_tree::Keccak256Hasher,
            (0..25u64).map(|amount| asset(network, 0, amount).hash()),
        )?;
        assert_eq!(bridge.registry().exit_root(network)?, expected.root());
        assert_eq!(bridge.published_leaf_count(network), Some(25));

        let claim = bridge.build_claim(network, 24)?;
        bridge.claim(&claim)?;
    }
    Ok(())
}

#[test]
fn test_replay_from_json_log() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("exit.log");

    let (global_exit_root, history) = {
        let log = Arc::new(JsonLinesExitLog::open(&path)?);
        let bridge = Bridge::new(config())?.with_log(log);
        bridge.deposit(0, &asset(0, 3, 1))?;
        bridge.deposit(3, &asset(3, 0, 2))?;
        bridge.deposit(3, &asset(3, 0, 3))?;
        let claim = bridge.build_claim(3, 1)?;
        bridge.claim(&claim)?;
        (bridge.global_exit_root(), bridge.aggregator().history())
    };

    let log = Arc::new(JsonLinesExitLog::open(&path)?);
    let replayed = Bridge::replay(config(), log.clone())?;

    assert_eq!(replayed.global_exit_root(), global_exit_root);
    assert_eq!(replayed.aggregator().history(), history);
    assert!(replayed.is_claimed(3, 1));
    assert!(!replayed.is_claimed(3, 0));

    let claim = replayed.build_claim(3, 0)?;
    replayed.claim(&claim)?;
    assert_eq!(log.records()?.last(), Some(&LogRecord::Claimed { network_id: 3, leaf_index: 0 }));
    Ok(())
}

#[test]
fn test_replay_rejects_tampered_history() -> Result<()> {
    let log = Arc::new(InMemoryExitLog::new());
    let bridge = Bridge::new(config())?.with_log(log.clone());
    bridge.deposit(0, &asset(0, 1, 1))?;

    let tampered = Arc::new(InMemoryExitLog::new());
    for record in log.records()? {
        let record = match record {
            LogRecord::Leaf { network_id, leaf_index, .. } => {
                LogRecord::leaf(network_id, leaf_index, [0xff; 32])
            }
            other => other,
        };
        tampered.append(&record)?;
    }

    let result = Bridge::replay(config(), tampered);

    assert!(matches!(
        result,
        Err(Error::Store(StoreError::Inconsistent { network_id: 0, leaf_count: 1 }))
    ));
    Ok(())
}

#[test]
fn test_claim_from_high_rollup_index() -> Result<()> {
    let bridge = Bridge::new(BridgeConfig::new(BRIDGE, MANAGER))?;
    let network = 1u32 << 31;

    let receipt = bridge.deposit(network, &asset(network, 0, 5))?;
    let claim = bridge.build_claim(network, receipt.leaf_index)?;
    let verified = bridge.claim(&claim)?;

    assert_eq!(verified.network_id, network);
    assert_eq!(claim.rollup_exit_root, bridge.rollup_exit_root());
    Ok(())
}
