//! Registry of per-network exit trees
//!
//! Each network owns one exit tree behind its own lock: insertions into the
//! same tree are serialized, insertions into different networks' trees run
//! in parallel. The registry is an explicit value passed to whoever needs
//! it; there is no process-wide state.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::bridge_tree::MerkleBridgeTree;
use super::cache::ProofProvider;
use super::config::TreeConfig;
use super::hasher::{Keccak256Hasher, MerkleHasher};
use super::proof::MerkleProof;
use crate::errors::TreeError;
use crate::types::{Bytes32, Leaf, NetworkId, MAX_TREE_HEIGHT};
use crate::Result;

type TreeHandle<H> = Arc<Mutex<MerkleBridgeTree<H>>>;

/// Exit trees keyed by network identifier
#[derive(Debug)]
pub struct ExitTreeRegistry<H = Keccak256Hasher> {
    height: u8,
    hasher: H,
    trees: RwLock<BTreeMap<NetworkId, TreeHandle<H>>>,
}

impl<H: MerkleHasher + Clone> ExitTreeRegistry<H> {
    /// Creates an empty registry whose trees have `height` levels
    pub fn new(height: u8, hasher: H) -> Result<Self> {
        if height == 0 || height > MAX_TREE_HEIGHT {
            return Err(TreeError::InvalidHeight { height, max: MAX_TREE_HEIGHT }.into());
        }
        Ok(Self { height, hasher, trees: RwLock::new(BTreeMap::new()) })
    }

    /// Creates an empty registry with the height given by `config`
    pub fn from_config<C: TreeConfig>(config: &C, hasher: H) -> Result<Self> {
        Self::new(config.height(), hasher)
    }

    /// Returns the height shared by every tree
    pub fn height(&self) -> u8 { self.height }

    /// Returns the registered networks in ascending order
    pub fn networks(&self) -> Vec<NetworkId> { self.trees.read().keys().copied().collect() }

    /// Registers an empty tree for `network_id` (no-op if already present)
    pub fn register(&self, network_id: NetworkId) -> Result<()> {
        self.get_or_create(network_id).map(|_| ())
    }

    /// Appends a leaf to the tree of `network_id`, creating the tree if needed
    ///
    /// # Returns
    /// `(index, new_exit_root)`
    pub fn add_leaf(&self, network_id: NetworkId, leaf: Leaf) -> Result<(u32, Bytes32)> {
        self.with_tree_mut(network_id, |tree| tree.add(leaf))?
    }

    /// Runs `f` with exclusive access to the tree of `network_id`, creating it if needed
    pub fn with_tree_mut<R>(
        &self,
        network_id: NetworkId,
        f: impl FnOnce(&mut MerkleBridgeTree<H>) -> R,
    ) -> Result<R> {
        let handle = self.get_or_create(network_id)?;
        let mut tree = handle.lock();
        Ok(f(&mut tree))
    }

    /// Runs `f` with access to the tree of `network_id`
    ///
    /// Fails with `UnknownNetwork` if the network has no tree.
    pub fn with_tree<R>(
        &self,
        network_id: NetworkId,
        f: impl FnOnce(&MerkleBridgeTree<H>) -> R,
    ) -> Result<R> {
        let handle = self.get(network_id)?;
        let tree = handle.lock();
        Ok(f(&tree))
    }

    /// Returns the current exit root of `network_id`
    pub fn exit_root(&self, network_id: NetworkId) -> Result<Bytes32> {
        self.with_tree(network_id, |tree| tree.root())
    }

    /// Returns `(leaf_count, exit_root)` of `network_id`, read together
    pub fn snapshot(&self, network_id: NetworkId) -> Result<(u64, Bytes32)> {
        self.with_tree(network_id, |tree| (tree.leaf_count(), tree.root()))
    }

    /// Returns the number of leaves in the tree of `network_id`
    pub fn leaf_count(&self, network_id: NetworkId) -> Result<u64> {
        self.with_tree(network_id, |tree| tree.leaf_count())
    }

    /// Returns the leaf at `index` in the tree of `network_id`
    pub fn leaf(&self, network_id: NetworkId, index: u32) -> Result<Leaf> {
        self.with_tree(network_id, |tree| {
            tree.leaf(index).ok_or_else(|| {
                TreeError::IndexOutOfRange { index: index.into(), leaf_count: tree.leaf_count() }
                    .into()
            })
        })?
    }

    /// Returns the proof of `index` against the current exit root of `network_id`
    pub fn get_proof(&self, network_id: NetworkId, index: u32) -> Result<MerkleProof> {
        self.with_tree(network_id, |tree| tree.get_proof(index))?
    }

    /// Returns the proof of `index` against the exit root `network_id` had at `leaf_count` leaves
    pub fn get_proof_at(
        &self,
        network_id: NetworkId,
        index: u32,
        leaf_count: u64,
    ) -> Result<MerkleProof> {
        self.with_tree(network_id, |tree| tree.get_proof_at(index, leaf_count))?
    }

    fn get(&self, network_id: NetworkId) -> Result<TreeHandle<H>> {
        self.trees
            .read()
            .get(&network_id)
            .cloned()
            .ok_or_else(|| TreeError::UnknownNetwork(network_id).into())
    }

    fn get_or_create(&self, network_id: NetworkId) -> Result<TreeHandle<H>> {
        if let Some(handle) = self.trees.read().get(&network_id) {
            return Ok(Arc::clone(handle));
        }

        let mut trees = self.trees.write();
        if let Some(handle) = trees.get(&network_id) {
            return Ok(Arc::clone(handle));
        }
        let tree = MerkleBridgeTree::with_hasher(self.height, self.hasher.clone())?;
        let handle = Arc::new(Mutex::new(tree));
        trees.insert(network_id, Arc::clone(&handle));
        tracing::debug!(network_id, "registered exit tree");
        Ok(handle)
    }
}

impl<H: MerkleHasher + Clone> ProofProvider for ExitTreeRegistry<H> {
    fn proof_at(&self, network_id: NetworkId, index: u32, leaf_count: u64) -> Result<MerkleProof> {
        self.get_proof_at(network_id, index, leaf_count)
    }
}
