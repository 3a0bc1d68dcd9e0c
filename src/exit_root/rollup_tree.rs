//! Rollup exit tree
//!
//! Leaf `r` of this tree is the latest exit root of rollup `r`. Unlike the
//! deposit trees its leaves are overwritten in place. Only nodes on a path
//! from a written leaf to the root are stored; every other node is the zero
//! subtree root of its level, so an update or a proof costs `O(height)`
//! whatever the rollup index.

use std::collections::BTreeMap;

use crate::errors::TreeError;
use crate::tree::{zero_hashes, MerkleHasher, MerkleProof};
use crate::types::{Bytes32, RollupIndex, MAX_TREE_HEIGHT};
use crate::Result;

/// Merkle tree over the exit roots of every rollup, indexed by rollup index
#[derive(Clone, Debug)]
pub struct RollupExitTree<H> {
    height: u8,
    hasher: H,
    zeros: Vec<Bytes32>,
    /// Written nodes per level, leaf level first
    nodes: Vec<BTreeMap<u64, Bytes32>>,
    rollup_count: u64,
}

impl<H: MerkleHasher> RollupExitTree<H> {
    /// Creates a tree in which every rollup's exit root is zero
    pub fn new(height: u8, hasher: H) -> Result<Self> {
        if height == 0 || height > MAX_TREE_HEIGHT {
            return Err(TreeError::InvalidHeight { height, max: MAX_TREE_HEIGHT }.into());
        }
        let zeros = zero_hashes(&hasher, height);
        let nodes = vec![BTreeMap::new(); height as usize + 1];
        Ok(Self { height, hasher, zeros, nodes, rollup_count: 0 })
    }

    /// Returns the height of the tree
    pub fn height(&self) -> u8 { self.height }

    /// Returns the number of leaves the tree can hold
    pub fn capacity(&self) -> u64 { 1u64 << self.height }

    /// Returns the rollup exit root
    pub fn root(&self) -> Bytes32 { self.node(self.height as usize, 0) }

    /// Returns one past the highest rollup index ever set
    pub fn rollup_count(&self) -> u64 { self.rollup_count }

    /// Returns the exit root recorded for `rollup_index` (zero if never set)
    pub fn local_exit_root(&self, rollup_index: RollupIndex) -> Bytes32 {
        self.node(0, rollup_index.into())
    }

    /// Checks that `rollup_index` is a leaf position of this tree
    pub fn check_index(&self, rollup_index: RollupIndex) -> Result<()> {
        if u64::from(rollup_index) >= self.capacity() {
            return Err(TreeError::IndexOutOfRange {
                index: rollup_index.into(),
                leaf_count: self.capacity(),
            }
            .into());
        }
        Ok(())
    }

    /// Records the exit root of `rollup_index` and recomputes the tree root
    ///
    /// # Arguments
    /// * `rollup_index` - Leaf position of the rollup
    /// * `exit_root` - The rollup's latest exit root
    ///
    /// # Returns
    /// The new rollup exit root, or `IndexOutOfRange` if the index does not fit the tree
    pub fn set_local_exit_root(
        &mut self,
        rollup_index: RollupIndex,
        exit_root: Bytes32,
    ) -> Result<Bytes32> {
        self.check_index(rollup_index)?;

        let mut position = u64::from(rollup_index);
        let mut current = exit_root;
        self.nodes[0].insert(position, current);
        for level in 0..self.height as usize {
            current = if position & 1 == 0 {
                self.hasher.hash_pair(&current, &self.node(level, position + 1))
            } else {
                self.hasher.hash_pair(&self.node(level, position - 1), &current)
            };
            position >>= 1;
            self.nodes[level + 1].insert(position, current);
        }

        self.rollup_count = self.rollup_count.max(u64::from(rollup_index) + 1);
        tracing::debug!(rollup_index, "updated rollup exit tree");
        Ok(current)
    }

    /// Returns the proof of `rollup_index`'s exit root against the current root
    pub fn get_proof(&self, rollup_index: RollupIndex) -> Result<MerkleProof> {
        self.check_index(rollup_index)?;

        let position = u64::from(rollup_index);
        let siblings = (0..self.height as usize)
            .map(|level| self.node(level, (position >> level) ^ 1))
            .collect();
        Ok(MerkleProof { index: rollup_index, siblings })
    }

    fn node(&self, level: usize, position: u64) -> Bytes32 {
        self.nodes[level].get(&position).copied().unwrap_or(self.zeros[level])
    }
}
