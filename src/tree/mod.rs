//! Exit trees
//!
//! Every network records its outgoing deposits in an append-only Merkle
//! tree whose root is the network's exit root. This module provides the
//! incremental tree, proof generation for current and historical roots,
//! proof verification, and a registry holding one tree per network.

pub mod bridge_tree;
pub mod cache;
pub mod config;
pub mod hasher;
pub mod proof;
#[cfg(any(test, feature = "diagnostics"))]
pub mod read_log;
pub mod rebuild;
pub mod registry;
pub mod source;

pub use bridge_tree::MerkleBridgeTree;
pub use cache::{CachedProofProvider, ProofProvider};
pub use config::{ExitTreeV1Config, TreeConfig};
pub use hasher::{zero_hashes, Keccak256Hasher, MerkleHasher, Sha256Hasher};
pub use proof::{
    calculate_root, calculate_root_with, verify_merkle_proof, verify_merkle_proof_with,
    MerkleProof,
};
#[cfg(any(test, feature = "diagnostics"))]
pub use read_log::{NodeRead, RecordingNodeSource};
pub use rebuild::{proof_from_leaves, root_from_leaves};
pub use registry::ExitTreeRegistry;
pub use source::{generate_merkle_proof, node_at, root_at, NodeSource};
