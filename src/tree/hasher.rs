//! Hasher implementations for exit tree nodes

use alloy_primitives::keccak256;
use sha2::{Digest, Sha256};

use crate::types::{Bytes32, ZERO_HASH};

/// Trait for the two-to-one hash used to build exit trees
///
/// This trait abstracts over different hash function implementations,
/// allowing the same tree code to work with different hash algorithms.
/// Leaves are inserted as-is: only internal nodes are hashed.
///
/// # Example
///
/// ```rust
/// use exit_tree::tree::{Keccak256Hasher, MerkleHasher};
///
/// let hasher = Keccak256Hasher;
/// let parent = hasher.hash_pair(&[1u8; 32], &[2u8; 32]);
/// assert_ne!(parent, hasher.hash_pair(&[2u8; 32], &[1u8; 32]));
/// ```
pub trait MerkleHasher {
    /// Computes the parent of `left` and `right`
    ///
    /// # Arguments
    /// * `left` - Left child hash (32 bytes)
    /// * `right` - Right child hash (32 bytes)
    ///
    /// # Returns
    /// The parent node hash (32 bytes)
    fn hash_pair(&self, left: &Bytes32, right: &Bytes32) -> Bytes32;
}

/// Keccak-256 hasher, the hash used by the bridge contracts
///
/// `hash_pair(l, r) = keccak256(l ‖ r)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keccak256Hasher;

impl MerkleHasher for Keccak256Hasher {
    fn hash_pair(&self, left: &Bytes32, right: &Bytes32) -> Bytes32 {
        let mut preimage = [0u8; 64];
        preimage[..32].copy_from_slice(left);
        preimage[32..].copy_from_slice(right);
        keccak256(preimage).0
    }
}

/// SHA-256 hasher
///
/// `hash_pair(l, r) = sha256(l ‖ r)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl MerkleHasher for Sha256Hasher {
    fn hash_pair(&self, left: &Bytes32, right: &Bytes32) -> Bytes32 {
        let mut hasher = Sha256::new();
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().into()
    }
}

/// Default hasher instance (keccak-256)
pub(crate) const DEFAULT_HASHER: Keccak256Hasher = Keccak256Hasher;

/// Computes the empty-subtree hash of every level from 0 to `height`
///
/// Level 0 is the all-zero leaf and level `k` is `hash(zero[k-1], zero[k-1])`.
/// The returned vector has `height + 1` entries.
pub fn zero_hashes<H: MerkleHasher>(hasher: &H, height: u8) -> Vec<Bytes32> {
    let mut zeros = Vec::with_capacity(height as usize + 1);
    zeros.push(ZERO_HASH);
    for level in 0..height as usize {
        let below = zeros[level];
        zeros.push(hasher.hash_pair(&below, &below));
    }
    zeros
}
