//! Core type definitions for the exit tree library
//!
//! This module defines fundamental types and constants shared by the
//! exit trees, the global exit root aggregator and the codecs.

// ============================================================================
// Fundamental Types
// ============================================================================

/// Type alias for 32-byte arrays used across cryptographic operations
pub type Bytes32 = [u8; 32];

/// Type alias for exit tree leaves
pub type Leaf = Bytes32;

/// Type alias for network identifiers (mainnet is network 0)
pub type NetworkId = u32;

/// Type alias for rollup indices inside the rollup exit tree
pub type RollupIndex = u32;

/// The all-zero hash used for empty leaves
pub const ZERO_HASH: Bytes32 = [0u8; 32];

// ============================================================================
// Network Domain
// ============================================================================

/// Network identifier of the root network
pub const MAINNET_NETWORK_ID: NetworkId = 0;

/// Returns the rollup index of a network, or `None` for mainnet
///
/// Rollup networks are numbered from 1, and rollup `n` occupies leaf `n - 1`
/// of the rollup exit tree.
pub fn rollup_index_of(network_id: NetworkId) -> Option<RollupIndex> { network_id.checked_sub(1) }

/// Returns the network identifier owning a rollup exit tree leaf
///
/// Returns `None` if the index has no network identifier (`u32::MAX`).
pub fn network_of_rollup(rollup_index: RollupIndex) -> Option<NetworkId> {
    rollup_index.checked_add(1)
}

// ============================================================================
// Tree Domain
// ============================================================================

/// Height of the exit trees used by the bridge
pub const DEFAULT_TREE_HEIGHT: u8 = 32;

/// Largest supported tree height (leaf indices are 32-bit)
pub const MAX_TREE_HEIGHT: u8 = 32;

/// Root of an empty height-32 exit tree under keccak-256
pub const EMPTY_EXIT_ROOT: Bytes32 = [
    0x27, 0xae, 0x5b, 0xa0, 0x8d, 0x72, 0x91, 0xc9, 0x6c, 0x8c, 0xbd, 0xdc, 0xc1, 0x48, 0xbf, 0x48,
    0xa6, 0xd6, 0x8c, 0x79, 0x74, 0xb9, 0x43, 0x56, 0xf5, 0x37, 0x54, 0xef, 0x61, 0x71, 0xd7, 0x57,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollup_network_mapping() {
        assert_eq!(rollup_index_of(MAINNET_NETWORK_ID), None);
        assert_eq!(rollup_index_of(1), Some(0));
        assert_eq!(rollup_index_of(7), Some(6));
        assert_eq!(network_of_rollup(0), Some(1));
        assert_eq!(network_of_rollup(u32::MAX), None);
    }
}
