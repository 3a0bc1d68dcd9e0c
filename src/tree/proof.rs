//! Merkle proof verification
//!
//! Verification is a pure fold over the sibling path: at level `k` the
//! running node is the left child when bit `k` of the leaf index is 0 and
//! the right child otherwise. A proof that does not lead to the expected
//! root is reported as `false`, never as an error.

use super::config::{TreeConfig, DEFAULT_CONFIG};
use super::hasher::{MerkleHasher, DEFAULT_HASHER};
use crate::types::Bytes32;

/// Merkle inclusion proof for an exit tree leaf
///
/// The proof consists of sibling hashes along the path from the leaf to the
/// root, leaf level first, paired with the index of the proven leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    /// Index of the proven leaf
    pub index: u32,
    /// Sibling hashes from the leaf level up to the level below the root
    pub siblings: Vec<Bytes32>,
}

impl MerkleProof {
    /// Verifies this proof for `leaf` against `root` with the default hasher and height
    pub fn verify(&self, leaf: Bytes32, root: Bytes32) -> bool {
        verify_merkle_proof(leaf, &self.siblings, self.index, root)
    }

    /// Verifies this proof with a custom hasher and tree height
    pub fn verify_with<H: MerkleHasher>(
        &self,
        leaf: Bytes32,
        root: Bytes32,
        hasher: &H,
        height: u8,
    ) -> bool {
        verify_merkle_proof_with(leaf, &self.siblings, self.index, root, hasher, height)
    }
}

/// Verifies a Merkle inclusion proof
///
/// Uses the keccak-256 hasher and the 32-level exit tree height.
///
/// # Arguments
/// * `leaf` - The leaf value
/// * `proof` - Sibling hashes, leaf level first
/// * `index` - Index of the leaf in the tree
/// * `root` - The expected root
///
/// # Returns
/// `true` if the proof leads to `root`, `false` otherwise (including malformed proofs)
///
/// # Example
///
/// ```rust
/// use exit_tree::tree::{verify_merkle_proof, MerkleBridgeTree};
///
/// let mut tree = MerkleBridgeTree::new(32)?;
/// let (index, root) = tree.add([7u8; 32])?;
/// let proof = tree.get_proof(index)?;
///
/// assert!(verify_merkle_proof([7u8; 32], &proof.siblings, index, root));
/// assert!(!verify_merkle_proof([8u8; 32], &proof.siblings, index, root));
/// # Ok::<(), exit_tree::errors::Error>(())
/// ```
pub fn verify_merkle_proof(leaf: Bytes32, proof: &[Bytes32], index: u32, root: Bytes32) -> bool {
    verify_merkle_proof_with(leaf, proof, index, root, &DEFAULT_HASHER, DEFAULT_CONFIG.height())
}

/// Verifies a Merkle inclusion proof with custom hasher and height
///
/// # Arguments
/// * `leaf` - The leaf value
/// * `proof` - Sibling hashes, leaf level first
/// * `index` - Index of the leaf in the tree
/// * `root` - The expected root
/// * `hasher` - The hash function implementation
/// * `height` - Height of the tree the proof was generated for
///
/// # Returns
/// `true` if the proof has `height` siblings, the index fits in the tree and
/// the path leads to `root`
pub fn verify_merkle_proof_with<H: MerkleHasher>(
    leaf: Bytes32,
    proof: &[Bytes32],
    index: u32,
    root: Bytes32,
    hasher: &H,
    height: u8,
) -> bool {
    if proof.len() != height as usize {
        return false;
    }
    if height < 32 && (index >> height) != 0 {
        return false;
    }

    calculate_root_with(leaf, proof, index, hasher) == root
}

/// Folds a leaf and its sibling path into a root with the default hasher
pub fn calculate_root(leaf: Bytes32, proof: &[Bytes32], index: u32) -> Bytes32 {
    calculate_root_with(leaf, proof, index, &DEFAULT_HASHER)
}

/// Folds a leaf and its sibling path into a root
///
/// Index bits beyond bit 31 are treated as zero.
pub fn calculate_root_with<H: MerkleHasher>(
    leaf: Bytes32,
    proof: &[Bytes32],
    index: u32,
    hasher: &H,
) -> Bytes32 {
    proof.iter().enumerate().fold(leaf, |node, (level, sibling)| {
        let is_right = level < 32 && (index >> level) & 1 == 1;
        if is_right {
            hasher.hash_pair(sibling, &node)
        } else {
            hasher.hash_pair(&node, sibling)
        }
    })
}
