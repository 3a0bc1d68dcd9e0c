//! Append-only incremental exit tree
//!
//! Each network records its deposits in a fixed-height tree. Insertion uses
//! the frontier ("branch") technique: one stored hash per level is enough to
//! extend the tree and recompute its root in O(height). Every node that
//! becomes complete during insertion is also retained, so proofs can be
//! produced for any past leaf against the current or any historical root.

use tracing::debug;

use super::config::TreeConfig;
use super::hasher::{zero_hashes, Keccak256Hasher, MerkleHasher};
use super::proof::MerkleProof;
use super::source::{self, NodeSource};
use crate::errors::TreeError;
use crate::types::{Bytes32, Leaf, MAX_TREE_HEIGHT, ZERO_HASH};
use crate::Result;

/// Fixed-height append-only Merkle tree of deposit leaves
#[derive(Clone, Debug)]
pub struct MerkleBridgeTree<H = Keccak256Hasher> {
    height: u8,
    hasher: H,
    zero_hashes: Vec<Bytes32>,
    /// Latest complete left subtree per level
    branch: Vec<Bytes32>,
    /// Complete subtree roots per level, in position order (level 0 = leaves)
    levels: Vec<Vec<Bytes32>>,
    leaf_count: u64,
    root: Bytes32,
}

impl MerkleBridgeTree<Keccak256Hasher> {
    /// Creates an empty keccak-256 tree
    ///
    /// # Arguments
    /// * `height` - Number of levels, between 1 and 32
    pub fn new(height: u8) -> Result<Self> { Self::with_hasher(height, Keccak256Hasher) }
}

impl<H: MerkleHasher> MerkleBridgeTree<H> {
    /// Creates an empty tree with a custom hasher
    ///
    /// # Arguments
    /// * `height` - Number of levels, between 1 and 32
    /// * `hasher` - The hash function implementation
    pub fn with_hasher(height: u8, hasher: H) -> Result<Self> {
        if height == 0 || height > MAX_TREE_HEIGHT {
            return Err(TreeError::InvalidHeight { height, max: MAX_TREE_HEIGHT }.into());
        }

        let zero_hashes = zero_hashes(&hasher, height);
        let root = zero_hashes[height as usize];
        Ok(Self {
            height,
            hasher,
            zero_hashes,
            branch: vec![ZERO_HASH; height as usize],
            levels: vec![Vec::new(); height as usize + 1],
            leaf_count: 0,
            root,
        })
    }

    /// Creates an empty tree with the height given by `config`
    pub fn from_config<C: TreeConfig>(config: &C, hasher: H) -> Result<Self> {
        Self::with_hasher(config.height(), hasher)
    }

    /// Rebuilds a tree by replaying `leaves` in order
    pub fn from_leaves<I>(height: u8, hasher: H, leaves: I) -> Result<Self>
    where
        I: IntoIterator<Item = Leaf>,
    {
        let mut tree = Self::with_hasher(height, hasher)?;
        for leaf in leaves {
            tree.add(leaf)?;
        }
        Ok(tree)
    }

    /// Returns the height of the tree
    pub fn height(&self) -> u8 { self.height }

    /// Returns the number of leaves the tree can hold (`2^height`)
    pub fn capacity(&self) -> u64 { 1u64 << self.height }

    /// Returns the number of inserted leaves
    pub fn leaf_count(&self) -> u64 { self.leaf_count }

    /// Returns whether no leaf has been inserted
    pub fn is_empty(&self) -> bool { self.leaf_count == 0 }

    /// Returns whether the tree holds `2^height` leaves
    pub fn is_full(&self) -> bool { self.leaf_count >= self.capacity() }

    /// Returns the hasher used by the tree
    pub fn hasher(&self) -> &H { &self.hasher }

    /// Returns the current root (the network's exit root)
    pub fn root(&self) -> Bytes32 { self.root }

    /// Returns the leaf stored at `index`
    pub fn leaf(&self, index: u32) -> Option<Leaf> { self.levels[0].get(index as usize).copied() }

    /// Appends a leaf at the next sequential index
    ///
    /// # Arguments
    /// * `leaf` - The leaf value
    ///
    /// # Returns
    /// `(index, new_root)`, or `TreeFull` if the tree already holds `2^height` leaves
    pub fn add(&mut self, leaf: Leaf) -> Result<(u32, Bytes32)> {
        if self.is_full() {
            return Err(TreeError::TreeFull { capacity: self.capacity() }.into());
        }

        // capacity is at most 2^32, so every index fits in a u32
        let index = self.leaf_count as u32;
        self.leaf_count += 1;
        self.levels[0].push(leaf);

        let mut node = leaf;
        let mut size = self.leaf_count;
        for level in 0..self.height as usize {
            if size & 1 == 1 {
                self.branch[level] = node;
                break;
            }
            node = self.hasher.hash_pair(&self.branch[level], &node);
            self.levels[level + 1].push(node);
            size >>= 1;
        }

        self.root = self.compute_root();
        debug!(index, leaf_count = self.leaf_count, "inserted exit tree leaf");
        Ok((index, self.root))
    }

    /// Returns the inclusion proof of `index` against the current root
    pub fn get_proof(&self, index: u32) -> Result<MerkleProof> {
        self.get_proof_at(index, self.leaf_count)
    }

    /// Returns the inclusion proof of `index` against the root the tree had
    /// when it held `leaf_count` leaves
    pub fn get_proof_at(&self, index: u32, leaf_count: u64) -> Result<MerkleProof> {
        source::generate_merkle_proof(self, &self.hasher, index, leaf_count)
    }

    /// Returns the root the tree had when it held `leaf_count` leaves
    pub fn root_at(&self, leaf_count: u64) -> Result<Bytes32> {
        if leaf_count == self.leaf_count {
            return Ok(self.root);
        }
        source::root_at(self, &self.hasher, leaf_count)
    }

    /// Returns the empty-subtree hash of every level
    pub fn zero_hashes(&self) -> &[Bytes32] { &self.zero_hashes }

    fn compute_root(&self) -> Bytes32 {
        let height = self.height as usize;
        if self.is_full() {
            return self.levels[height][0];
        }

        let mut node = ZERO_HASH;
        for level in 0..height {
            node = if (self.leaf_count >> level) & 1 == 1 {
                self.hasher.hash_pair(&self.branch[level], &node)
            } else {
                self.hasher.hash_pair(&node, &self.zero_hashes[level])
            };
        }
        node
    }
}

impl<H: MerkleHasher> NodeSource for MerkleBridgeTree<H> {
    fn height(&self) -> u8 { self.height }

    fn leaf_count(&self) -> u64 { self.leaf_count }

    fn finalized_node(&self, level: u8, position: u64) -> Option<Bytes32> {
        self.levels.get(level as usize)?.get(usize::try_from(position).ok()?).copied()
    }

    fn zero_hash(&self, level: u8) -> Bytes32 { self.zero_hashes[level as usize] }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::hex;

    use super::*;
    use crate::tree::hasher::Sha256Hasher;
    use crate::tree::proof::verify_merkle_proof_with;
    use crate::tree::rebuild::root_from_leaves;
    use crate::types::EMPTY_EXIT_ROOT;
    use crate::Error;

    fn leaf(n: u8) -> Leaf { [n; 32] }

    #[test]
    fn test_new() {
        let tree = MerkleBridgeTree::new(32).expect("tree should be created");

        assert_eq!(tree.root(), EMPTY_EXIT_ROOT);
        assert_eq!(tree.leaf_count(), 0);
        assert_eq!(tree.capacity(), 1u64 << 32);
        assert!(tree.is_empty());

        assert!(matches!(
            MerkleBridgeTree::new(0),
            Err(Error::Tree(TreeError::InvalidHeight { height: 0, .. }))
        ));
        assert!(matches!(
            MerkleBridgeTree::new(33),
            Err(Error::Tree(TreeError::InvalidHeight { height: 33, .. }))
        ));
    }

    #[test]
    fn test_three_leaf_fixture() {
        let mut tree = MerkleBridgeTree::new(2).expect("tree should be created");
        let hasher = Keccak256Hasher;

        tree.add(leaf(1)).expect("insert should succeed");
        tree.add(leaf(2)).expect("insert should succeed");
        let (index, root) = tree.add(leaf(3)).expect("insert should succeed");

        let expected = hasher.hash_pair(
            &hasher.hash_pair(&leaf(1), &leaf(2)),
            &hasher.hash_pair(&leaf(3), &ZERO_HASH),
        );
        assert_eq!(index, 2);
        assert_eq!(root, expected);
        assert_eq!(
            hex::encode(root),
            "b3eab8646d706247bc8e454e8850ea39af6dbe9bdc9c7751778da0e95d177c34"
        );
    }

    #[test]
    fn test_add_until_full() {
        let mut tree = MerkleBridgeTree::new(2).expect("tree should be created");

        for n in 0..4 {
            let (index, _) = tree.add(leaf(n)).expect("insert should succeed");
            assert_eq!(index, n as u32);
        }
        let root_before = tree.root();

        let result = tree.add(leaf(9));

        assert!(matches!(result, Err(Error::Tree(TreeError::TreeFull { capacity: 4 }))));
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(tree.root(), root_before);
        assert_eq!(
            tree.root(),
            root_from_leaves(&[leaf(0), leaf(1), leaf(2), leaf(3)], 2, &Keccak256Hasher)
                .expect("rebuild should succeed")
        );
    }

    #[test]
    fn test_incremental_root_matches_rebuild() {
        let mut tree = MerkleBridgeTree::with_hasher(5, Sha256Hasher).expect("tree should build");
        let mut leaves = Vec::new();

        for n in 0..32u8 {
            leaves.push(leaf(n));
            let (_, root) = tree.add(leaf(n)).expect("insert should succeed");
            let rebuilt =
                root_from_leaves(&leaves, 5, &Sha256Hasher).expect("rebuild should succeed");
            assert_eq!(root, rebuilt, "mismatch after {} leaves", leaves.len());
        }
    }

    #[test]
    fn test_get_proof() {
        let mut tree = MerkleBridgeTree::new(4).expect("tree should be created");
        for n in 0..11 {
            tree.add(leaf(n)).expect("insert should succeed");
        }

        for index in 0..11u32 {
            let proof = tree.get_proof(index).expect("proof should succeed");
            assert_eq!(proof.siblings.len(), 4);
            assert!(verify_merkle_proof_with(
                leaf(index as u8),
                &proof.siblings,
                index,
                tree.root(),
                &Keccak256Hasher,
                4,
            ));
        }

        assert!(matches!(
            tree.get_proof(11),
            Err(Error::Tree(TreeError::IndexOutOfRange { index: 11, leaf_count: 11 }))
        ));
    }

    #[test]
    fn test_historical_proofs() {
        let mut tree = MerkleBridgeTree::new(4).expect("tree should be created");
        let mut roots = vec![tree.root()];
        for n in 0..9 {
            let (_, root) = tree.add(leaf(n)).expect("insert should succeed");
            roots.push(root);
        }

        for (leaf_count, expected_root) in roots.iter().enumerate() {
            let leaf_count = leaf_count as u64;
            assert_eq!(tree.root_at(leaf_count).expect("root should resolve"), *expected_root);
            for index in 0..leaf_count as u32 {
                let proof = tree.get_proof_at(index, leaf_count).expect("proof should succeed");
                assert!(proof.verify_with(leaf(index as u8), *expected_root, &Keccak256Hasher, 4));
            }
        }

        assert!(tree.root_at(10).is_err());
        assert!(tree.get_proof_at(5, 5).is_err());
    }

    #[test]
    fn test_from_leaves() {
        let leaves = vec![leaf(1), leaf(2), leaf(3)];
        let mut incremental = MerkleBridgeTree::new(3).expect("tree should be created");
        for value in &leaves {
            incremental.add(*value).expect("insert should succeed");
        }

        let replayed = MerkleBridgeTree::from_leaves(3, Keccak256Hasher, leaves)
            .expect("replay should succeed");

        assert_eq!(replayed.root(), incremental.root());
        assert_eq!(replayed.leaf(1), Some(leaf(2)));
        assert_eq!(replayed.leaf(3), None);

        let overflow = MerkleBridgeTree::from_leaves(1, Keccak256Hasher, vec![leaf(1); 3]);
        assert!(matches!(overflow, Err(Error::Tree(TreeError::TreeFull { capacity: 2 }))));
    }
}
