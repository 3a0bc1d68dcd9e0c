//! Exit log
//!
//! Bridge state is rebuilt by replaying an append-only log. The log holds
//! every inserted leaf, every exit root published to the aggregator, every
//! global exit root appended to the history, and every released deposit.

mod json_lines;
mod memory;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

pub use json_lines::JsonLinesExitLog;
pub use memory::InMemoryExitLog;

use crate::exit_root::GlobalExitRootEntry;
use crate::types::{Bytes32, NetworkId};
use crate::Result;

/// One entry of the exit log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogRecord {
    /// A leaf was appended to a network's exit tree
    Leaf {
        /// Network that owns the tree
        network_id: NetworkId,
        /// Position of the leaf
        leaf_index: u32,
        /// The leaf value
        leaf: B256,
    },
    /// A network's exit root was written to the aggregator
    ExitRootPublished {
        /// Network whose exit root was published
        network_id: NetworkId,
        /// Number of leaves in the tree at publication
        leaf_count: u64,
        /// The published exit root
        exit_root: B256,
    },
    /// A global exit root was appended to the history
    GlobalExitRoot {
        /// History position
        sequence: u64,
        /// Mainnet slot value
        mainnet_exit_root: B256,
        /// Rollup slot value
        rollup_exit_root: B256,
        /// `hash(mainnet_exit_root, rollup_exit_root)`
        global_exit_root: B256,
    },
    /// A deposit was released
    Claimed {
        /// Network the deposit was made on
        network_id: NetworkId,
        /// Index of the deposit in that network's exit tree
        leaf_index: u32,
    },
}

impl LogRecord {
    /// Creates a leaf record
    pub fn leaf(network_id: NetworkId, leaf_index: u32, leaf: Bytes32) -> Self {
        Self::Leaf { network_id, leaf_index, leaf: B256::from(leaf) }
    }

    /// Creates an exit root publication record
    pub fn exit_root_published(network_id: NetworkId, leaf_count: u64, exit_root: Bytes32) -> Self {
        Self::ExitRootPublished { network_id, leaf_count, exit_root: B256::from(exit_root) }
    }
}

impl From<&GlobalExitRootEntry> for LogRecord {
    fn from(entry: &GlobalExitRootEntry) -> Self {
        Self::GlobalExitRoot {
            sequence: entry.sequence,
            mainnet_exit_root: B256::from(entry.mainnet_exit_root),
            rollup_exit_root: B256::from(entry.rollup_exit_root),
            global_exit_root: B256::from(entry.global_exit_root),
        }
    }
}

/// Append-only storage for log records
///
/// Implementations must return records in the order they were appended.
pub trait ExitLog: Send + Sync {
    /// Appends a record
    ///
    /// # Arguments
    /// * `record` - The record to persist
    fn append(&self, record: &LogRecord) -> Result<()>;

    /// Reads every record, oldest first
    fn records(&self) -> Result<Vec<LogRecord>>;
}
