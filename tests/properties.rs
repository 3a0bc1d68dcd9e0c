//! Property-based tests for exit trees, global indices, the aggregator and the genesis root
//!
//! These tests use proptest to check invariants that hold for all inputs:
//! - The incremental root matches a from-scratch rebuild at every size
//! - Every current and historical proof verifies, and any flipped bit breaks it
//! - Global indices round-trip and mainnet indices never collide with rollup ones
//! - The global exit root always commits to both slots
//! - The genesis root does not depend on account order

use alloy_primitives::{Address, U256};
use exit_tree::codec::{decode_global_index, encode_global_index};
use exit_tree::exit_root::{global_exit_root, ExitRootSlot, GlobalExitRootAggregator, SlotOwners};
use exit_tree::smt::{compute_genesis_root, GenesisAccount};
use exit_tree::tree::{
    root_from_leaves, verify_merkle_proof, Keccak256Hasher, MerkleBridgeTree, MerkleHasher,
};
use exit_tree::Bytes32;
use proptest::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

const HEIGHT: u8 = 6;
const BRIDGE: Address = Address::repeat_byte(0x01);
const MANAGER: Address = Address::repeat_byte(0x02);

fn leaves(max: usize) -> impl Strategy<Value = Vec<Bytes32>> {
    prop::collection::vec(any::<[u8; 32]>(), 1..=max)
}

fn build(leaves: &[Bytes32]) -> MerkleBridgeTree {
    MerkleBridgeTree::from_leaves(HEIGHT, Keccak256Hasher, leaves.iter().copied())
        .expect("leaves should fit the tree")
}

// =============================================================================
// Exit Tree Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_incremental_root_matches_rebuild(leaves in leaves(64)) {
        let mut tree = MerkleBridgeTree::new(HEIGHT).expect("tree should be created");

        for (count, leaf) in leaves.iter().enumerate() {
            let (_, root) = tree.add(*leaf).expect("insert should succeed");
            let rebuilt = root_from_leaves(&leaves[..=count], HEIGHT, &Keccak256Hasher)
                .expect("rebuild should succeed");
            prop_assert_eq!(root, rebuilt);
        }
    }

    #[test]
    fn prop_current_proofs_verify(leaves in leaves(40)) {
        let tree = build(&leaves);

        for (index, leaf) in leaves.iter().enumerate() {
            let proof = tree.get_proof(index as u32).expect("proof should exist");
            prop_assert!(verify_merkle_proof(*leaf, &proof.siblings, index as u32, tree.root()));
        }
    }

    #[test]
    fn prop_historical_proofs_verify(leaves in leaves(40), snapshot in 1usize..=40) {
        let tree = build(&leaves);
        let leaf_count = snapshot.min(leaves.len()) as u64;
        let root = tree.root_at(leaf_count).expect("snapshot should exist");

        for index in 0..leaf_count as u32 {
            let proof = tree.get_proof_at(index, leaf_count).expect("proof should exist");
            prop_assert!(proof.verify(leaves[index as usize], root));
        }
    }

    #[test]
    fn prop_flipped_bit_breaks_proof(
        leaves in leaves(32),
        pick in any::<prop::sample::Index>(),
        level in 0..HEIGHT as usize,
        bit in 0usize..256,
    ) {
        let tree = build(&leaves);
        let index = pick.index(leaves.len()) as u32;
        let mut proof = tree.get_proof(index).expect("proof should exist");

        proof.siblings[level][bit / 8] ^= 1 << (bit % 8);

        prop_assert!(!proof.verify(leaves[index as usize], tree.root()));
    }
}

// =============================================================================
// Global Index Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_global_index_round_trip(
        local_index in any::<u32>(),
        rollup_index in any::<u32>(),
        is_mainnet in any::<bool>(),
    ) {
        let rollup_index = if is_mainnet { 0 } else { rollup_index };

        let encoded = encode_global_index(local_index.into(), rollup_index.into(), is_mainnet)
            .expect("components should fit");
        let decoded = decode_global_index(encoded.as_u256()).expect("index should decode");

        prop_assert_eq!(decoded.local_index, local_index);
        prop_assert_eq!(decoded.rollup_index, rollup_index);
        prop_assert_eq!(decoded.is_mainnet, is_mainnet);

        let boundary = U256::from(1u64) << 64usize;
        if is_mainnet {
            prop_assert!(encoded.as_u256() >= boundary);
        } else {
            prop_assert!(encoded.as_u256() < boundary);
        }
    }

    #[test]
    fn prop_oversized_component_rejected(local_index in (1u64 << 32)..u64::MAX) {
        prop_assert!(encode_global_index(local_index, 0, true).is_err());
        prop_assert!(encode_global_index(local_index, 0, false).is_err());
        prop_assert!(encode_global_index(0, local_index, false).is_err());
    }
}

// =============================================================================
// Aggregator Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_global_exit_root_commits_to_both_slots(
        updates in prop::collection::vec((any::<bool>(), any::<[u8; 32]>()), 1..20),
    ) {
        let aggregator =
            GlobalExitRootAggregator::new(SlotOwners { mainnet: BRIDGE, rollup: MANAGER });
        let mut history = Vec::new();

        for (is_mainnet, root) in updates {
            let before = aggregator.exit_roots();
            let (slot, caller) = if is_mainnet {
                (ExitRootSlot::Mainnet, BRIDGE)
            } else {
                (ExitRootSlot::Rollup, MANAGER)
            };

            let global = aggregator.update_exit_root(slot, root, caller).expect("owner update");
            let after = aggregator.exit_roots();

            if is_mainnet {
                prop_assert_eq!(after.rollup_exit_root, before.rollup_exit_root);
            } else {
                prop_assert_eq!(after.mainnet_exit_root, before.mainnet_exit_root);
            }
            prop_assert_eq!(
                global,
                Keccak256Hasher.hash_pair(&after.mainnet_exit_root, &after.rollup_exit_root)
            );
            prop_assert_eq!(
                global,
                global_exit_root(&Keccak256Hasher, &after.mainnet_exit_root, &after.rollup_exit_root)
            );
            history.push(global);
        }

        // every global exit root seen stays claimable
        for global in history {
            prop_assert!(aggregator.is_historical_root(&global));
        }
    }
}

// =============================================================================
// Genesis Properties
// =============================================================================

fn accounts() -> impl Strategy<Value = Vec<GenesisAccount>> {
    prop::collection::btree_map(any::<[u8; 20]>(), (any::<u64>(), any::<u64>()), 0..12).prop_map(
        |accounts| {
            accounts
                .into_iter()
                .map(|(address, (balance, nonce))| GenesisAccount {
                    address: Address::from(address),
                    balance: U256::from(balance),
                    nonce,
                    ..Default::default()
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn prop_genesis_root_order_independent(accounts in accounts()) {
        let mut reversed = accounts.clone();
        reversed.reverse();

        let forward = compute_genesis_root(&accounts).expect("root should build");
        let backward = compute_genesis_root(&reversed).expect("root should build");

        prop_assert_eq!(forward, backward);
    }
}
