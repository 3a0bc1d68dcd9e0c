//! Error types for the exit tree library
//!
//! This module defines all error types used throughout the library,
//! providing detailed error information for debugging and handling.
//! Rejecting an invalid Merkle proof is not an error: verification
//! returns `false` for that case.

use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::exit_root::ExitRootSlot;
use crate::types::{Bytes32, NetworkId};

/// The main error type for the exit tree library
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Exit tree errors
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Global exit root aggregation errors
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),

    /// Global index encoding errors
    #[error(transparent)]
    GlobalIndex(#[from] GlobalIndexError),

    /// Claim verification errors
    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// Transaction codec errors
    #[error(transparent)]
    Rlp(#[from] RlpError),

    /// Genesis state root errors
    #[error(transparent)]
    Genesis(#[from] GenesisError),

    /// Exit log errors
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur during exit tree operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeError {
    /// The tree already holds `2^height` leaves
    #[error("Exit tree is full: capacity {capacity} leaves")]
    TreeFull {
        /// Maximum number of leaves the tree can hold
        capacity: u64,
    },

    /// A lookup referenced a leaf that was never inserted
    #[error("Leaf index {index} out of range: tree holds {leaf_count} leaves")]
    IndexOutOfRange {
        /// The requested leaf index
        index: u64,
        /// Number of leaves in the tree (or in the requested snapshot)
        leaf_count: u64,
    },

    /// A historical snapshot larger than the tree was requested
    #[error("Snapshot of {requested} leaves requested but tree holds {leaf_count}")]
    SnapshotOutOfRange {
        /// The requested snapshot size
        requested: u64,
        /// Number of leaves in the tree
        leaf_count: u64,
    },

    /// Tree height outside of the supported range
    #[error("Invalid tree height {height}: must be between 1 and {max}")]
    InvalidHeight {
        /// The requested height
        height: u8,
        /// The maximum supported height
        max: u8,
    },

    /// No tree has been registered for the network
    #[error("No exit tree for network {0}")]
    UnknownNetwork(NetworkId),
}

/// Errors that can occur while updating the global exit root
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AggregatorError {
    /// The caller does not own the slot it tried to update
    #[error("Caller {caller} is not allowed to update the {slot:?} exit root")]
    Unauthorized {
        /// The slot that was targeted
        slot: ExitRootSlot,
        /// The rejected caller
        caller: Address,
    },

    /// Restored history does not match the recomputed global exit root
    #[error("Inconsistent history entry at sequence {sequence}")]
    InconsistentHistory {
        /// Sequence number of the offending entry
        sequence: u64,
    },
}

/// Errors that can occur while encoding or decoding a global index
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GlobalIndexError {
    /// A component does not fit in its encoded range
    #[error("Global index field {field} out of range: {value} exceeds {max}")]
    OutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// The supplied value
        value: u64,
        /// The largest accepted value
        max: u64,
    },

    /// The integer has bits set outside the encoded ranges
    #[error("Non-canonical global index: {0}")]
    NonCanonical(U256),
}

/// Reasons a claim is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClaimError {
    /// `hash(mainnet_exit_root, rollup_exit_root)` was never published
    #[error("Global exit root {0:?} not found in history")]
    GlobalExitRootNotFound(Bytes32),

    /// The Merkle proof does not lead to the cited exit root
    #[error("Invalid Merkle proof for leaf {leaf_index} of network {network_id}")]
    InvalidProof {
        /// Source network of the deposit
        network_id: NetworkId,
        /// Local leaf index of the deposit
        leaf_index: u32,
    },

    /// The deposit has already been released
    #[error("Deposit {leaf_index} of network {network_id} already claimed")]
    AlreadyClaimed {
        /// Source network of the deposit
        network_id: NetworkId,
        /// Local leaf index of the deposit
        leaf_index: u32,
    },

    /// The global index could not be decoded
    #[error(transparent)]
    GlobalIndex(#[from] GlobalIndexError),
}

/// Errors that can occur while decoding a transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RlpError {
    /// The input is not a canonical RLP encoding
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(alloy_rlp::Error),

    /// The list does not hold the expected number of fields
    #[error("Expected {expected} transaction fields, found {found}")]
    FieldCount {
        /// Number of fields required
        expected: usize,
        /// Number of fields present
        found: usize,
    },

    /// Bytes remain after the transaction list
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    /// The signature's `v` is neither 27/28 nor an EIP-155 value
    #[error("Invalid signature v value {0}")]
    InvalidV(u64),
}

impl From<alloy_rlp::Error> for RlpError {
    fn from(err: alloy_rlp::Error) -> Self { RlpError::MalformedEncoding(err) }
}

/// Errors that can occur while computing a genesis state root
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenesisError {
    /// The same address appears more than once
    #[error("Duplicate genesis account: {0}")]
    DuplicateAccount(Address),

    /// Two distinct keys share every bit the tree can branch on
    #[error("State tree keys still collide at max depth {max_depth}")]
    DepthExhausted {
        /// Maximum branching depth of the tree
        max_depth: u8,
    },
}

/// Errors that can occur while reading or writing the exit log
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// A record could not be serialized or parsed
    #[error("Serialization error at line {line}: {reason}")]
    Serialization {
        /// 1-based line number (0 when writing)
        line: usize,
        /// Parser message
        reason: String,
    },

    /// Leaves of a network were not logged in insertion order
    #[error("Out of order leaf for network {network_id}: expected index {expected}, found {found}")]
    OutOfOrder {
        /// Network whose log is inconsistent
        network_id: NetworkId,
        /// Next index the tree expects
        expected: u64,
        /// Index found in the log
        found: u32,
    },

    /// A logged exit root does not match the replayed tree
    #[error("Logged exit root of network {network_id} at {leaf_count} leaves does not match")]
    Inconsistent {
        /// Network whose log is inconsistent
        network_id: NetworkId,
        /// Snapshot size of the logged root
        leaf_count: u64,
    },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self { StoreError::Io(err.to_string()) }
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
