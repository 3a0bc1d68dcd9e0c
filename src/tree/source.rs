//! Node lookup interface used for proof generation
//!
//! Proofs are assembled from finalized nodes: subtrees whose leaves are all
//! present. Partially filled subtrees are recomputed from their children and
//! empty subtrees are answered with the level's zero hash. This lets any
//! historical snapshot of an append-only tree be proven from the current
//! node store.

use super::hasher::MerkleHasher;
use super::proof::MerkleProof;
use crate::errors::TreeError;
use crate::types::Bytes32;
use crate::Result;

/// Read access to the nodes of an append-only Merkle tree
///
/// Level 0 holds the leaves; position `j` at level `k` covers leaves
/// `j * 2^k .. (j + 1) * 2^k`.
pub trait NodeSource {
    /// Returns the fixed height of the tree
    fn height(&self) -> u8;

    /// Returns the number of leaves inserted so far
    fn leaf_count(&self) -> u64;

    /// Returns the hash of a complete subtree, if stored
    ///
    /// # Arguments
    /// * `level` - Level of the node (0 = leaves)
    /// * `position` - Position of the node within its level
    ///
    /// # Returns
    /// `Some(hash)` if every leaf under the node is present and the node is
    /// stored, `None` otherwise
    fn finalized_node(&self, level: u8, position: u64) -> Option<Bytes32>;

    /// Returns the hash of an empty subtree rooted at `level`
    fn zero_hash(&self, level: u8) -> Bytes32;
}

/// Computes a node as it was when the tree held `leaf_count` leaves
///
/// # Arguments
/// * `source` - The node store
/// * `hasher` - The hash function implementation
/// * `level` - Level of the node (0 = leaves)
/// * `position` - Position of the node within its level
/// * `leaf_count` - Size of the snapshot
///
/// # Returns
/// The node hash, or `IndexOutOfRange` if a required leaf is missing from the source
pub fn node_at<S: NodeSource + ?Sized, H: MerkleHasher>(
    source: &S,
    hasher: &H,
    level: u8,
    position: u64,
    leaf_count: u64,
) -> Result<Bytes32> {
    let span = 1u64 << level;
    let start = position.saturating_mul(span);

    if start >= leaf_count {
        return Ok(source.zero_hash(level));
    }

    if start.saturating_add(span) <= leaf_count {
        if let Some(node) = source.finalized_node(level, position) {
            return Ok(node);
        }
    }

    if level == 0 {
        return Err(TreeError::IndexOutOfRange { index: position, leaf_count: source.leaf_count() }
            .into());
    }

    let left = node_at(source, hasher, level - 1, position * 2, leaf_count)?;
    let right = node_at(source, hasher, level - 1, position * 2 + 1, leaf_count)?;
    Ok(hasher.hash_pair(&left, &right))
}

/// Computes the root of the tree as it was when it held `leaf_count` leaves
///
/// # Returns
/// The snapshot root, or `SnapshotOutOfRange` if the tree never held that many leaves
pub fn root_at<S: NodeSource + ?Sized, H: MerkleHasher>(
    source: &S,
    hasher: &H,
    leaf_count: u64,
) -> Result<Bytes32> {
    check_snapshot(source, leaf_count)?;
    node_at(source, hasher, source.height(), 0, leaf_count)
}

/// Generates an inclusion proof for `index` against the snapshot of `leaf_count` leaves
///
/// The proof consists of the sibling hashes along the path from the leaf to
/// the root, leaf level first.
///
/// # Arguments
/// * `source` - The node store
/// * `hasher` - The hash function implementation
/// * `index` - Index of the leaf to prove
/// * `leaf_count` - Size of the snapshot the proof is generated against
///
/// # Returns
/// A `MerkleProof` with `height` siblings
pub fn generate_merkle_proof<S: NodeSource + ?Sized, H: MerkleHasher>(
    source: &S,
    hasher: &H,
    index: u32,
    leaf_count: u64,
) -> Result<MerkleProof> {
    check_snapshot(source, leaf_count)?;
    if u64::from(index) >= leaf_count {
        return Err(TreeError::IndexOutOfRange { index: index.into(), leaf_count }.into());
    }

    let height = source.height();
    let mut siblings = Vec::with_capacity(height as usize);
    for level in 0..height {
        let sibling_position = (u64::from(index) >> level) ^ 1;
        siblings.push(node_at(source, hasher, level, sibling_position, leaf_count)?);
    }

    tracing::debug!(index, leaf_count, "generated exit tree proof");
    Ok(MerkleProof { index, siblings })
}

fn check_snapshot<S: NodeSource + ?Sized>(source: &S, leaf_count: u64) -> Result<()> {
    if leaf_count > source.leaf_count() {
        return Err(TreeError::SnapshotOutOfRange {
            requested: leaf_count,
            leaf_count: source.leaf_count(),
        }
        .into());
    }
    Ok(())
}
