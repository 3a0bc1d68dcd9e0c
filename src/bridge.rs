//! Bridge facade
//!
//! Ties the per-network exit trees, the rollup exit tree, the global exit
//! root aggregator and the claim ledger together, and mirrors every state
//! change into an optional exit log so the bridge can be rebuilt by replay.
//!
//! Locks are always taken in the order publication, tree, aggregator. A
//! deposit releases its tree before publishing, so no path holds a tree
//! while waiting for the publication lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::Address;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::codec::GlobalIndex;
use crate::errors::{StoreError, TreeError};
use crate::exit_root::{
    verify_claim, Claim, ClaimLedger, ExitRootSlot, GlobalExitRootAggregator, GlobalExitRootEntry,
    RollupExitTree, SlotOwners, VerifiedClaim,
};
use crate::leaf::DepositLeaf;
use crate::store::{ExitLog, LogRecord};
use crate::tree::config::DEFAULT_CONFIG;
use crate::tree::{
    CachedProofProvider, ExitTreeRegistry, Keccak256Hasher, MerkleHasher, ProofProvider,
    TreeConfig,
};
use crate::types::{rollup_index_of, Bytes32, Leaf, NetworkId, ZERO_HASH};
use crate::Result;

/// Default number of proofs kept by the bridge's proof cache
pub const DEFAULT_PROOF_CACHE_CAPACITY: usize = 4096;

/// Runtime configuration of a [`Bridge`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Height of every exit tree and of the rollup exit tree
    pub height: u8,
    /// Owner of the mainnet slot of the aggregator
    pub bridge_address: Address,
    /// Owner of the rollup slot of the aggregator
    pub rollup_manager_address: Address,
    /// Maximum number of cached claim proofs
    pub proof_cache_capacity: usize,
}

impl BridgeConfig {
    /// Creates a configuration with the default tree height and cache size
    ///
    /// # Arguments
    /// * `bridge_address` - Address allowed to write the mainnet exit root
    /// * `rollup_manager_address` - Address allowed to write the rollup exit root
    pub fn new(bridge_address: Address, rollup_manager_address: Address) -> Self {
        Self {
            height: DEFAULT_CONFIG.height(),
            bridge_address,
            rollup_manager_address,
            proof_cache_capacity: DEFAULT_PROOF_CACHE_CAPACITY,
        }
    }

    /// Returns the configuration with a different tree height
    pub fn with_height(self, height: u8) -> Self { Self { height, ..self } }

    /// Returns the configuration with a different proof cache size
    pub fn with_proof_cache_capacity(self, capacity: usize) -> Self {
        Self { proof_cache_capacity: capacity, ..self }
    }

    fn owners(&self) -> SlotOwners {
        SlotOwners { mainnet: self.bridge_address, rollup: self.rollup_manager_address }
    }
}

/// Outcome of a deposit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositReceipt {
    /// Network the deposit was made on
    pub network_id: NetworkId,
    /// Position of the leaf in the network's exit tree
    pub leaf_index: u32,
    /// The inserted leaf
    pub leaf: Leaf,
    /// Exit root of the network right after the insertion
    pub exit_root: Bytes32,
    /// Global exit root after the network's root was published
    pub global_exit_root: Bytes32,
}

/// Exit roots that have been handed to the aggregator
#[derive(Debug)]
struct Publication<H> {
    rollup_exit_tree: RollupExitTree<H>,
    /// Leaf count of each network's tree at its last publication
    published: BTreeMap<NetworkId, u64>,
}

impl<H: MerkleHasher> Publication<H> {
    /// Records a network's published snapshot
    ///
    /// # Returns
    /// The aggregator slot to write and its new value
    fn record(
        &mut self,
        network_id: NetworkId,
        leaf_count: u64,
        exit_root: Bytes32,
    ) -> Result<(ExitRootSlot, Bytes32)> {
        let slot = match rollup_index_of(network_id) {
            None => (ExitRootSlot::Mainnet, exit_root),
            Some(rollup_index) => (
                ExitRootSlot::Rollup,
                self.rollup_exit_tree.set_local_exit_root(rollup_index, exit_root)?,
            ),
        };
        self.published.insert(network_id, leaf_count);
        Ok(slot)
    }
}

/// Hub of the bridge: deposits on any network, claims against mainnet history
///
/// # Example
///
/// ```rust
/// use alloy_primitives::{Address, U256};
/// use exit_tree::bridge::{Bridge, BridgeConfig};
/// use exit_tree::leaf::DepositLeaf;
///
/// let config = BridgeConfig::new(Address::repeat_byte(0x01), Address::repeat_byte(0x02));
/// let bridge = Bridge::new(config)?;
///
/// let deposit = DepositLeaf::asset(
///     2,
///     Address::ZERO,
///     0,
///     Address::repeat_byte(0x33),
///     U256::from(10u64),
///     &[],
/// );
/// let receipt = bridge.deposit(2, &deposit)?;
///
/// let claim = bridge.build_claim(2, receipt.leaf_index)?;
/// let verified = bridge.claim(&claim)?;
/// assert_eq!(verified.network_id, 2);
/// assert!(bridge.claim(&claim).is_err());
/// # Ok::<(), exit_tree::errors::Error>(())
/// ```
pub struct Bridge<H = Keccak256Hasher> {
    config: BridgeConfig,
    trees: Arc<ExitTreeRegistry<H>>,
    proofs: CachedProofProvider<Arc<ExitTreeRegistry<H>>>,
    aggregator: GlobalExitRootAggregator<H>,
    publication: Mutex<Publication<H>>,
    ledger: ClaimLedger,
    log: Option<Arc<dyn ExitLog>>,
}

impl Bridge<Keccak256Hasher> {
    /// Creates an empty bridge hashing with keccak-256
    pub fn new(config: BridgeConfig) -> Result<Self> { Self::with_hasher(config, Keccak256Hasher) }

    /// Rebuilds a keccak-256 bridge from its exit log
    ///
    /// The returned bridge keeps appending to `log`.
    pub fn replay(config: BridgeConfig, log: Arc<dyn ExitLog>) -> Result<Self> {
        Self::replay_with_hasher(config, Keccak256Hasher, log)
    }
}

impl<H: MerkleHasher + Clone> Bridge<H> {
    /// Creates an empty bridge with a custom hasher
    ///
    /// # Returns
    /// The bridge, or `InvalidHeight` if `config.height` is not in `1..=32`
    pub fn with_hasher(config: BridgeConfig, hasher: H) -> Result<Self> {
        let trees = Arc::new(ExitTreeRegistry::new(config.height, hasher.clone())?);
        let proofs = CachedProofProvider::new(Arc::clone(&trees), config.proof_cache_capacity);
        let publication = Publication {
            rollup_exit_tree: RollupExitTree::new(config.height, hasher.clone())?,
            published: BTreeMap::new(),
        };

        Ok(Self {
            config,
            trees,
            proofs,
            aggregator: GlobalExitRootAggregator::with_hasher(config.owners(), hasher),
            publication: Mutex::new(publication),
            ledger: ClaimLedger::new(),
            log: None,
        })
    }

    /// Rebuilds a bridge with a custom hasher from its exit log
    ///
    /// # Returns
    /// The rebuilt bridge, or the first replay failure: `OutOfOrder` for a
    /// leaf logged out of index order, `Inconsistent` for a published root
    /// the replayed tree does not reproduce, `InconsistentHistory` for a
    /// global exit root entry out of sequence
    pub fn replay_with_hasher(
        config: BridgeConfig,
        hasher: H,
        log: Arc<dyn ExitLog>,
    ) -> Result<Self> {
        let bridge = Self::with_hasher(config, hasher)?;
        let records = log.records()?;
        let count = records.len();
        for record in records {
            bridge.apply(record)?;
        }
        info!(records = count, "replayed exit log");
        Ok(bridge.with_log(log))
    }

    /// Attaches a log that receives every subsequent state change
    pub fn with_log(self, log: Arc<dyn ExitLog>) -> Self { Self { log: Some(log), ..self } }

    /// Returns the configuration
    pub fn config(&self) -> &BridgeConfig { &self.config }

    /// Returns the per-network exit trees
    pub fn registry(&self) -> &ExitTreeRegistry<H> { &self.trees }

    /// Returns the global exit root aggregator
    pub fn aggregator(&self) -> &GlobalExitRootAggregator<H> { &self.aggregator }

    /// Returns the latest global exit root
    pub fn global_exit_root(&self) -> Bytes32 { self.aggregator.last_global_exit_root() }

    /// Returns the current rollup exit root
    pub fn rollup_exit_root(&self) -> Bytes32 { self.publication.lock().rollup_exit_tree.root() }

    /// Returns the leaf count of `network_id` at its last publication
    pub fn published_leaf_count(&self, network_id: NetworkId) -> Option<u64> {
        self.publication.lock().published.get(&network_id).copied()
    }

    /// Returns whether the deposit has been claimed
    pub fn is_claimed(&self, network_id: NetworkId, leaf_index: u32) -> bool {
        self.ledger.is_claimed(network_id, leaf_index)
    }

    /// Records a deposit on `network_id` and publishes the new exit root
    pub fn deposit(&self, network_id: NetworkId, deposit: &DepositLeaf) -> Result<DepositReceipt> {
        self.deposit_leaf(network_id, deposit.hash())
    }

    /// Appends a raw leaf to the exit tree of `network_id` and publishes the new exit root
    ///
    /// # Arguments
    /// * `network_id` - Network the deposit is made on
    /// * `leaf` - The 32-byte leaf
    ///
    /// # Returns
    /// The deposit receipt, or `TreeFull` or `IndexOutOfRange` (a rollup the
    /// rollup exit tree cannot hold) with nothing changed
    pub fn deposit_leaf(&self, network_id: NetworkId, leaf: Leaf) -> Result<DepositReceipt> {
        self.check_publishable(network_id)?;
        let inserted = self.trees.with_tree_mut(network_id, |tree| {
            if tree.is_full() {
                return Err(TreeError::TreeFull { capacity: tree.capacity() }.into());
            }
            // the tree lock keeps each network's leaf records in index order
            let index = tree.leaf_count() as u32;
            self.append_log(&LogRecord::leaf(network_id, index, leaf))?;
            tree.add(leaf)
        })?;
        let (leaf_index, exit_root) = inserted?;

        let global_exit_root = self.publish_exit_root(network_id)?;
        debug!(network_id, leaf_index, "deposited leaf");

        Ok(DepositReceipt { network_id, leaf_index, leaf, exit_root, global_exit_root })
    }

    /// Publishes the current exit root of `network_id` to the aggregator
    ///
    /// Mainnet roots go to the mainnet slot. A rollup's root is written into
    /// the rollup exit tree, whose new root goes to the rollup slot.
    ///
    /// # Returns
    /// The resulting global exit root, or `UnknownNetwork` if the network
    /// has no tree
    pub fn publish_exit_root(&self, network_id: NetworkId) -> Result<Bytes32> {
        self.check_publishable(network_id)?;
        let mut publication = self.publication.lock();
        let (leaf_count, exit_root) = self.trees.snapshot(network_id)?;

        self.append_log(&LogRecord::exit_root_published(network_id, leaf_count, exit_root))?;
        let (slot, root) = publication.record(network_id, leaf_count, exit_root)?;
        let caller = self.config.owners().owner_of(slot);
        let published = self.aggregator.publish(slot, root, caller)?;

        if let Some(entry) = &published.new_entry {
            self.append_log(&LogRecord::from(entry))?;
        }
        Ok(published.global_exit_root)
    }

    /// Builds a claim for a deposit against the current global exit root
    ///
    /// The proofs are made against the exit root the network had at its
    /// last publication, so a deposit can only be claimed once published.
    ///
    /// # Returns
    /// The claim, or `IndexOutOfRange` if the deposit is not covered by the
    /// last publication
    pub fn build_claim(&self, network_id: NetworkId, leaf_index: u32) -> Result<Claim> {
        let publication = self.publication.lock();
        let leaf_count = publication.published.get(&network_id).copied().unwrap_or(0);
        if u64::from(leaf_index) >= leaf_count {
            return Err(TreeError::IndexOutOfRange { index: leaf_index.into(), leaf_count }.into());
        }

        let leaf = self.trees.leaf(network_id, leaf_index)?;
        let proof_local = self.proofs.proof_at(network_id, leaf_index, leaf_count)?.siblings;
        let (global_index, proof_rollup) = match rollup_index_of(network_id) {
            None => (GlobalIndex::mainnet(leaf_index), vec![ZERO_HASH; self.config.height.into()]),
            Some(rollup_index) => (
                GlobalIndex::rollup(rollup_index, leaf_index),
                publication.rollup_exit_tree.get_proof(rollup_index)?.siblings,
            ),
        };
        let roots = self.aggregator.exit_roots();

        Ok(Claim {
            leaf,
            proof_local,
            proof_rollup,
            global_index,
            mainnet_exit_root: roots.mainnet_exit_root,
            rollup_exit_root: roots.rollup_exit_root,
        })
    }

    /// Verifies a claim and releases its deposit
    ///
    /// # Returns
    /// The verified origin of the deposit, or the reason the claim is
    /// refused; a refused claim changes nothing
    pub fn claim(&self, claim: &Claim) -> Result<VerifiedClaim> {
        let result = verify_claim(claim, &self.aggregator, self.config.height).and_then(|verified| {
            self.ledger.try_claim(verified.network_id, verified.leaf_index, || {
                self.append_log(&LogRecord::Claimed {
                    network_id: verified.network_id,
                    leaf_index: verified.leaf_index,
                })
            })?;
            Ok(verified)
        });

        match &result {
            Ok(verified) => info!(
                network_id = verified.network_id,
                leaf_index = verified.leaf_index,
                sequence = verified.sequence,
                "released deposit"
            ),
            Err(err) => warn!(global_index = %claim.global_index, %err, "rejected claim"),
        }
        result
    }

    /// Rejects a rollup whose index has no leaf in the rollup exit tree
    fn check_publishable(&self, network_id: NetworkId) -> Result<()> {
        let capacity = 1u64 << self.config.height;
        match rollup_index_of(network_id) {
            Some(rollup_index) if u64::from(rollup_index) >= capacity => {
                Err(TreeError::IndexOutOfRange { index: rollup_index.into(), leaf_count: capacity }
                    .into())
            }
            _ => Ok(()),
        }
    }

    fn append_log(&self, record: &LogRecord) -> Result<()> {
        match &self.log {
            Some(log) => log.append(record),
            None => Ok(()),
        }
    }

    fn apply(&self, record: LogRecord) -> Result<()> {
        match record {
            LogRecord::Leaf { network_id, leaf_index, leaf } => {
                self.check_publishable(network_id)?;
                let inserted = self.trees.with_tree_mut(network_id, |tree| {
                    let expected = tree.leaf_count();
                    if expected != u64::from(leaf_index) {
                        let found = leaf_index;
                        return Err(StoreError::OutOfOrder { network_id, expected, found }.into());
                    }
                    tree.add(leaf.0)
                })?;
                inserted.map(|_| ())
            }
            LogRecord::ExitRootPublished { network_id, leaf_count, exit_root } => {
                let matches = self
                    .trees
                    .with_tree(network_id, |tree| tree.root_at(leaf_count).ok())
                    .ok()
                    .flatten()
                    == Some(exit_root.0);
                if !matches {
                    return Err(StoreError::Inconsistent { network_id, leaf_count }.into());
                }
                self.publication.lock().record(network_id, leaf_count, exit_root.0).map(|_| ())
            }
            LogRecord::GlobalExitRoot {
                sequence,
                mainnet_exit_root,
                rollup_exit_root,
                global_exit_root,
            } => self.aggregator.restore_entry(GlobalExitRootEntry {
                sequence,
                mainnet_exit_root: mainnet_exit_root.0,
                rollup_exit_root: rollup_exit_root.0,
                global_exit_root: global_exit_root.0,
            }),
            LogRecord::Claimed { network_id, leaf_index } =>
                self.ledger.try_claim(network_id, leaf_index, || Ok(())),
        }
    }
}

impl<H> std::fmt::Debug for Bridge<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("logged", &self.log.is_some())
            .finish_non_exhaustive()
    }
}
