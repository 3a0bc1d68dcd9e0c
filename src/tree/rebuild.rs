//! From-scratch tree construction
//!
//! Builds a full binary tree level by level over a leaf vector padded with
//! zero hashes. Used for trees whose leaves are overwritten in place (the
//! rollup exit tree) and as the reference the incremental tree must match.

use super::hasher::{zero_hashes, MerkleHasher};
use super::proof::MerkleProof;
use crate::errors::TreeError;
use crate::types::Bytes32;
use crate::Result;

/// Computes the root of a height-`height` tree over `leaves`
///
/// # Arguments
/// * `leaves` - Leaf values in index order; missing leaves are zero
/// * `height` - Height of the tree
/// * `hasher` - The hash function implementation
///
/// # Returns
/// The root, or `TreeFull` if there are more than `2^height` leaves
pub fn root_from_leaves<H: MerkleHasher>(
    leaves: &[Bytes32],
    height: u8,
    hasher: &H,
) -> Result<Bytes32> {
    check_capacity(leaves.len(), height)?;
    let zeros = zero_hashes(hasher, height);

    let mut nodes = leaves.to_vec();
    for zero in zeros.iter().take(height as usize) {
        if nodes.is_empty() {
            break;
        }
        nodes = next_level(&nodes, zero, hasher);
    }

    Ok(nodes.first().copied().unwrap_or(zeros[height as usize]))
}

/// Generates the inclusion proof of `index` in a height-`height` tree over `leaves`
///
/// Any index below `2^height` can be proven; indices past the end of
/// `leaves` prove the zero leaf.
pub fn proof_from_leaves<H: MerkleHasher>(
    leaves: &[Bytes32],
    index: u32,
    height: u8,
    hasher: &H,
) -> Result<MerkleProof> {
    check_capacity(leaves.len(), height)?;
    if height < 32 && (index >> height) != 0 {
        return Err(TreeError::IndexOutOfRange { index: index.into(), leaf_count: 1u64 << height }
            .into());
    }
    let zeros = zero_hashes(hasher, height);

    let mut nodes = leaves.to_vec();
    let mut position = index as usize;
    let mut siblings = Vec::with_capacity(height as usize);
    for zero in zeros.iter().take(height as usize) {
        siblings.push(nodes.get(position ^ 1).copied().unwrap_or(*zero));
        nodes = next_level(&nodes, zero, hasher);
        position >>= 1;
    }

    Ok(MerkleProof { index, siblings })
}

fn next_level<H: MerkleHasher>(nodes: &[Bytes32], zero: &Bytes32, hasher: &H) -> Vec<Bytes32> {
    nodes.chunks(2).map(|pair| hasher.hash_pair(&pair[0], pair.get(1).unwrap_or(zero))).collect()
}

fn check_capacity(leaf_count: usize, height: u8) -> Result<()> {
    let capacity = 1u64 << height.min(63);
    if leaf_count as u64 > capacity {
        return Err(TreeError::TreeFull { capacity }.into());
    }
    Ok(())
}
