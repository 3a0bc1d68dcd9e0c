//! Global exit root aggregation
//!
//! The aggregator holds two independently owned slots, the mainnet exit root
//! and the rollup exit root, and publishes `hash(mainnet, rollup)` as the
//! global exit root. Every distinct published value is appended to a history
//! that is never rewritten, so claims may cite any past global exit root.

use std::collections::HashMap;

use alloy_primitives::Address;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::errors::AggregatorError;
use crate::tree::{Keccak256Hasher, MerkleHasher};
use crate::types::Bytes32;
use crate::Result;

/// One of the two exit root slots combined into the global exit root
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExitRootSlot {
    /// Exit root of the mainnet deposit tree, written by the bridge
    Mainnet,
    /// Root of the rollup exit tree, written by the rollup manager
    Rollup,
}

/// Addresses allowed to write each slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotOwners {
    /// Owner of the mainnet slot (the bridge)
    pub mainnet: Address,
    /// Owner of the rollup slot (the rollup manager)
    pub rollup: Address,
}

impl SlotOwners {
    /// Returns the owner of `slot`
    pub fn owner_of(&self, slot: ExitRootSlot) -> Address {
        match slot {
            ExitRootSlot::Mainnet => self.mainnet,
            ExitRootSlot::Rollup => self.rollup,
        }
    }
}

/// Both slot values, read together
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExitRoots {
    /// Current mainnet exit root
    pub mainnet_exit_root: Bytes32,
    /// Current rollup exit root
    pub rollup_exit_root: Bytes32,
}

/// A published global exit root and the slot values it was computed from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalExitRootEntry {
    /// Position in the history, starting at 0
    pub sequence: u64,
    /// Mainnet exit root at publication
    pub mainnet_exit_root: Bytes32,
    /// Rollup exit root at publication
    pub rollup_exit_root: Bytes32,
    /// `hash(mainnet_exit_root, rollup_exit_root)`
    pub global_exit_root: Bytes32,
}

/// Outcome of a slot update
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublishedRoot {
    /// The global exit root after the update
    pub global_exit_root: Bytes32,
    /// The history entry appended by the update, `None` if the value was already recorded
    pub new_entry: Option<GlobalExitRootEntry>,
}

#[derive(Debug, Default)]
struct AggregatorState {
    mainnet_exit_root: Bytes32,
    rollup_exit_root: Bytes32,
    history: Vec<GlobalExitRootEntry>,
    by_root: HashMap<Bytes32, u64>,
}

impl AggregatorState {
    fn append(&mut self, entry: GlobalExitRootEntry) {
        self.by_root.insert(entry.global_exit_root, entry.sequence);
        self.history.push(entry);
    }
}

/// Computes the global exit root of two slot values
pub fn global_exit_root<H: MerkleHasher>(
    hasher: &H,
    mainnet_exit_root: &Bytes32,
    rollup_exit_root: &Bytes32,
) -> Bytes32 {
    hasher.hash_pair(mainnet_exit_root, rollup_exit_root)
}

/// Combines the mainnet and rollup exit roots into the global exit root
///
/// All state sits behind one lock: a slot write, the recomputation of the
/// global exit root and the history append happen in a single critical
/// section, so readers never observe a global exit root that disagrees with
/// the slots or is missing from the history.
///
/// # Example
///
/// ```rust
/// use alloy_primitives::Address;
/// use exit_tree::exit_root::{ExitRootSlot, GlobalExitRootAggregator, SlotOwners};
///
/// let bridge = Address::repeat_byte(0x01);
/// let manager = Address::repeat_byte(0x02);
/// let aggregator = GlobalExitRootAggregator::new(SlotOwners { mainnet: bridge, rollup: manager });
///
/// let ger = aggregator.update_exit_root(ExitRootSlot::Mainnet, [5u8; 32], bridge)?;
///
/// assert_eq!(aggregator.last_global_exit_root(), ger);
/// assert!(aggregator.is_historical_root(&ger));
/// assert!(aggregator.update_exit_root(ExitRootSlot::Rollup, [6u8; 32], bridge).is_err());
/// # Ok::<(), exit_tree::errors::Error>(())
/// ```
#[derive(Debug)]
pub struct GlobalExitRootAggregator<H = Keccak256Hasher> {
    owners: SlotOwners,
    hasher: H,
    state: RwLock<AggregatorState>,
}

impl GlobalExitRootAggregator<Keccak256Hasher> {
    /// Creates an aggregator with both slots at zero and an empty history
    pub fn new(owners: SlotOwners) -> Self { Self::with_hasher(owners, Keccak256Hasher) }
}

impl<H: MerkleHasher> GlobalExitRootAggregator<H> {
    /// Creates an aggregator with a custom hasher
    pub fn with_hasher(owners: SlotOwners, hasher: H) -> Self {
        Self { owners, hasher, state: RwLock::new(AggregatorState::default()) }
    }

    /// Returns the slot owners
    pub fn owners(&self) -> SlotOwners { self.owners }

    /// Returns the hasher used for global exit roots
    pub fn hasher(&self) -> &H { &self.hasher }

    /// Writes `root` into `slot` on behalf of `caller`
    ///
    /// # Arguments
    /// * `slot` - The slot to write
    /// * `root` - The new slot value
    /// * `caller` - Address performing the update; must own `slot`
    ///
    /// # Returns
    /// The new global exit root, or `Unauthorized` without any state change
    pub fn update_exit_root(
        &self,
        slot: ExitRootSlot,
        root: Bytes32,
        caller: Address,
    ) -> Result<Bytes32> {
        self.publish(slot, root, caller).map(|published| published.global_exit_root)
    }

    /// Writes `root` into `slot` and reports whether a history entry was appended
    pub fn publish(
        &self,
        slot: ExitRootSlot,
        root: Bytes32,
        caller: Address,
    ) -> Result<PublishedRoot> {
        if self.owners.owner_of(slot) != caller {
            warn!(?slot, %caller, "rejected exit root update from non-owner");
            return Err(AggregatorError::Unauthorized { slot, caller }.into());
        }

        let mut state = self.state.write();
        match slot {
            ExitRootSlot::Mainnet => state.mainnet_exit_root = root,
            ExitRootSlot::Rollup => state.rollup_exit_root = root,
        }

        let global_exit_root =
            global_exit_root(&self.hasher, &state.mainnet_exit_root, &state.rollup_exit_root);
        if state.by_root.contains_key(&global_exit_root) {
            return Ok(PublishedRoot { global_exit_root, new_entry: None });
        }

        let entry = GlobalExitRootEntry {
            sequence: state.history.len() as u64,
            mainnet_exit_root: state.mainnet_exit_root,
            rollup_exit_root: state.rollup_exit_root,
            global_exit_root,
        };
        state.append(entry);
        info!(
            sequence = entry.sequence,
            global_exit_root = %alloy_primitives::B256::from(global_exit_root),
            "published global exit root"
        );
        Ok(PublishedRoot { global_exit_root, new_entry: Some(entry) })
    }

    /// Returns the global exit root of the current slot values
    pub fn last_global_exit_root(&self) -> Bytes32 {
        let state = self.state.read();
        global_exit_root(&self.hasher, &state.mainnet_exit_root, &state.rollup_exit_root)
    }

    /// Returns both slot values as seen by a single reader
    pub fn exit_roots(&self) -> ExitRoots {
        let state = self.state.read();
        ExitRoots {
            mainnet_exit_root: state.mainnet_exit_root,
            rollup_exit_root: state.rollup_exit_root,
        }
    }

    /// Returns whether `root` was ever published
    pub fn is_historical_root(&self, root: &Bytes32) -> bool {
        self.state.read().by_root.contains_key(root)
    }

    /// Returns the history position of `root`
    pub fn sequence_of(&self, root: &Bytes32) -> Option<u64> {
        self.state.read().by_root.get(root).copied()
    }

    /// Returns the history entry at `sequence`
    pub fn entry(&self, sequence: u64) -> Option<GlobalExitRootEntry> {
        let state = self.state.read();
        usize::try_from(sequence).ok().and_then(|position| state.history.get(position)).copied()
    }

    /// Returns the number of published global exit roots
    pub fn history_len(&self) -> u64 { self.state.read().history.len() as u64 }

    /// Returns a copy of the full history
    pub fn history(&self) -> Vec<GlobalExitRootEntry> { self.state.read().history.clone() }

    /// Re-appends a previously published entry, as read back from a log
    ///
    /// The entry must be the next one in sequence, must hash correctly and
    /// must not repeat an earlier value. On success both slots take the
    /// entry's values.
    pub fn restore_entry(&self, entry: GlobalExitRootEntry) -> Result<()> {
        let mut state = self.state.write();
        let expected =
            global_exit_root(&self.hasher, &entry.mainnet_exit_root, &entry.rollup_exit_root);
        if entry.sequence != state.history.len() as u64
            || entry.global_exit_root != expected
            || state.by_root.contains_key(&entry.global_exit_root)
        {
            return Err(AggregatorError::InconsistentHistory { sequence: entry.sequence }.into());
        }

        state.mainnet_exit_root = entry.mainnet_exit_root;
        state.rollup_exit_root = entry.rollup_exit_root;
        state.append(entry);
        Ok(())
    }

    /// Restores a sequence of entries, stopping at the first inconsistent one
    pub fn restore<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = GlobalExitRootEntry>,
    {
        entries.into_iter().try_for_each(|entry| self.restore_entry(entry))
    }
}
