//! Sparse Merkle tree over account state
//!
//! Used to compute the state root of a network's genesis. Every piece of
//! account state (balance, nonce, code hash, code length, storage slot)
//! becomes one leaf whose 256-bit key is a hash of the address, the kind of
//! state and the storage slot. Zero values are left out, so the root does
//! not depend on whether an empty entry was listed or not.

pub mod builder;
pub mod config;
pub mod genesis;
pub mod hasher;

pub use builder::{build_smt_node_with, build_smt_root_with};
pub use config::GenesisV1Config;
pub use genesis::{
    compute_genesis_root, compute_genesis_root_with, genesis_leaves, state_key, GenesisAccount,
    StateKeyKind,
};
pub use hasher::KeccakSmtHasher;

use crate::types::Bytes32;

/// Gets the bit value at the given depth (0-255) from a 256-bit key
///
/// Depth 0 is the most significant bit of the first byte; the path from the
/// root to a leaf follows the key's bits in that order.
///
/// # Arguments
/// * `key` - The 32-byte key
/// * `depth` - The depth in the tree (0-255), corresponding to which bit to extract
///
/// # Returns
/// The bit value (0 or 1) at the specified depth
///
/// # Example
///
/// ```rust
/// use exit_tree::smt::get_bit_at_depth;
///
/// let mut key = [0u8; 32];
/// key[0] = 0b10100000;
///
/// assert_eq!(get_bit_at_depth(&key, 0), 1);
/// assert_eq!(get_bit_at_depth(&key, 1), 0);
/// assert_eq!(get_bit_at_depth(&key, 2), 1);
/// ```
pub fn get_bit_at_depth(key: &Bytes32, depth: u8) -> u8 {
    let byte_index = (depth / 8) as usize;
    let bit_index = depth % 8;
    (key[byte_index] >> (7 - bit_index)) & 1
}

/// Trait for hash functions used in state tree operations
///
/// # Example
///
/// ```rust
/// use exit_tree::smt::SmtHasher;
/// use exit_tree::types::Bytes32;
///
/// struct XorHasher;
///
/// impl SmtHasher for XorHasher {
///     fn hash_leaf(&self, _domain_tag: &[u8], key: Bytes32, value: Bytes32) -> Bytes32 {
///         std::array::from_fn(|i| key[i] ^ value[i])
///     }
///
///     fn hash_internal(&self, _domain_tag: &[u8], left: Bytes32, right: Bytes32) -> Bytes32 {
///         std::array::from_fn(|i| left[i] ^ right[i].rotate_left(1))
///     }
///
///     fn zero_hash(&self) -> Bytes32 {
///         [0u8; 32]
///     }
/// }
///
/// assert_eq!(XorHasher.zero_hash(), [0u8; 32]);
/// ```
pub trait SmtHasher {
    /// Computes the hash for a leaf node
    ///
    /// # Arguments
    /// * `domain_tag` - Domain separation tag for leaves
    /// * `key` - The leaf's 256-bit path
    /// * `value` - The stored value (32 bytes, big-endian for integers)
    ///
    /// # Returns
    /// The computed leaf hash (32 bytes)
    fn hash_leaf(&self, domain_tag: &[u8], key: Bytes32, value: Bytes32) -> Bytes32;

    /// Computes the hash for an internal node
    ///
    /// # Arguments
    /// * `domain_tag` - Domain separation tag for internal nodes
    /// * `left` - Left child hash (32 bytes)
    /// * `right` - Right child hash (32 bytes)
    ///
    /// # Returns
    /// The computed internal node hash (32 bytes)
    fn hash_internal(&self, domain_tag: &[u8], left: Bytes32, right: Bytes32) -> Bytes32;

    /// Returns the hash of an empty subtree
    fn zero_hash(&self) -> Bytes32;
}

/// Trait for state tree configuration parameters
///
/// Domain tags keep leaf hashes, internal hashes and other hash contexts
/// apart; bumping them versions the tree.
pub trait SmtConfig {
    /// Returns the domain tag for leaf nodes
    fn leaf_domain_tag(&self) -> &[u8];

    /// Returns the domain tag for internal nodes
    fn internal_domain_tag(&self) -> &[u8];

    /// Returns the deepest level at which keys are split (0-indexed, 255 for 256-bit keys)
    fn max_depth(&self) -> u8;
}
