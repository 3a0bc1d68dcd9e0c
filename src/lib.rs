#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Exit Tree
//!
//! A Rust library for the exit side of a hub-and-spoke asset bridge:
//! append-only deposit trees per network, a global exit root that commits
//! to mainnet and every rollup, and claims proven against its history.

// Bridge facade wiring trees, aggregator, claims and the exit log
pub mod bridge;

// Global index and legacy transaction codecs
pub mod codec;

// Error types
pub mod errors;

// Rollup exit tree, global exit root aggregation and claim verification
pub mod exit_root;

// Deposit leaf construction
pub mod leaf;

// Genesis state root over a sparse Merkle tree
pub mod smt;

// Append-only exit log and replay records
pub mod store;

// Incremental exit trees, proofs and proof caching
pub mod tree;

// Shared types and constants
pub mod types;

// Re-export commonly used types and functions
pub use bridge::{Bridge, BridgeConfig, DepositReceipt};
pub use codec::{DecodedGlobalIndex, GlobalIndex};
pub use errors::{Error, Result};
pub use exit_root::{
    Claim, ClaimLedger, ExitRootSlot, GlobalExitRootAggregator, RollupExitTree, SlotOwners,
    VerifiedClaim,
};
pub use leaf::{DepositLeaf, LeafType};
pub use smt::{compute_genesis_root, GenesisAccount};
pub use store::{ExitLog, InMemoryExitLog, JsonLinesExitLog, LogRecord};
pub use tree::{
    verify_merkle_proof, ExitTreeRegistry, Keccak256Hasher, MerkleBridgeTree, MerkleHasher,
    MerkleProof,
};
pub use types::{Bytes32, Leaf, NetworkId, EMPTY_EXIT_ROOT, MAINNET_NETWORK_ID};
