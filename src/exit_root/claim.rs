//! Claim verification
//!
//! A claim cites a pair of slot values, proves its deposit leaf against one
//! of them, and names the deposit through its global index. Mainnet deposits
//! are proven directly against the mainnet exit root. Rollup deposits are
//! proven in two stages: the leaf is folded into the rollup's local exit
//! root, which is then proven against the rollup exit root at the rollup's
//! index.

use std::collections::HashSet;

use parking_lot::Mutex;

use super::aggregator::{global_exit_root, GlobalExitRootAggregator};
use crate::codec::GlobalIndex;
use crate::errors::ClaimError;
use crate::tree::{calculate_root_with, verify_merkle_proof_with, MerkleHasher};
use crate::types::{network_of_rollup, Bytes32, Leaf, NetworkId, MAINNET_NETWORK_ID};
use crate::Result;

/// Everything a claimant presents to release a deposit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    /// The deposit leaf
    pub leaf: Leaf,
    /// Sibling path of the leaf in its origin network's exit tree
    pub proof_local: Vec<Bytes32>,
    /// Sibling path of the origin rollup's exit root in the rollup exit tree
    /// (ignored for mainnet deposits)
    pub proof_rollup: Vec<Bytes32>,
    /// Encoded origin and leaf index
    pub global_index: GlobalIndex,
    /// Mainnet slot value the proof is made against
    pub mainnet_exit_root: Bytes32,
    /// Rollup slot value the proof is made against
    pub rollup_exit_root: Bytes32,
}

/// A claim whose proofs checked out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifiedClaim {
    /// Network the deposit was made on
    pub network_id: NetworkId,
    /// Index of the deposit in that network's exit tree
    pub leaf_index: u32,
    /// The cited global exit root
    pub global_exit_root: Bytes32,
    /// History position of the cited global exit root
    pub sequence: u64,
}

/// Verifies a claim against the aggregator's history
///
/// # Arguments
/// * `claim` - The claim to check
/// * `aggregator` - Source of the global exit root history
/// * `height` - Height of the exit trees and of the rollup exit tree
///
/// # Returns
/// The origin of the verified deposit, or the reason the claim is refused.
/// Nothing is recorded: releasing the deposit is up to the caller.
pub fn verify_claim<H: MerkleHasher>(
    claim: &Claim,
    aggregator: &GlobalExitRootAggregator<H>,
    height: u8,
) -> Result<VerifiedClaim> {
    let index = claim.global_index.decode().map_err(ClaimError::from)?;
    let hasher = aggregator.hasher();

    let cited = global_exit_root(hasher, &claim.mainnet_exit_root, &claim.rollup_exit_root);
    let sequence = aggregator
        .sequence_of(&cited)
        .ok_or(ClaimError::GlobalExitRootNotFound(cited))?;

    let (network_id, proven) = if index.is_mainnet {
        let proven = verify_merkle_proof_with(
            claim.leaf,
            &claim.proof_local,
            index.local_index,
            claim.mainnet_exit_root,
            hasher,
            height,
        );
        (MAINNET_NETWORK_ID, proven)
    } else {
        let network_id = network_of_rollup(index.rollup_index).ok_or(ClaimError::InvalidProof {
            network_id: NetworkId::MAX,
            leaf_index: index.local_index,
        })?;
        let proven = claim.proof_local.len() == height as usize
            && (height >= 32 || index.local_index >> height == 0)
            && verify_merkle_proof_with(
                calculate_root_with(claim.leaf, &claim.proof_local, index.local_index, hasher),
                &claim.proof_rollup,
                index.rollup_index,
                claim.rollup_exit_root,
                hasher,
                height,
            );
        (network_id, proven)
    };

    if !proven {
        return Err(ClaimError::InvalidProof { network_id, leaf_index: index.local_index }.into());
    }

    Ok(VerifiedClaim {
        network_id,
        leaf_index: index.local_index,
        global_exit_root: cited,
        sequence,
    })
}

/// Set of released deposits, keyed by `(origin network, leaf index)`
#[derive(Debug, Default)]
pub struct ClaimLedger {
    claimed: Mutex<HashSet<(NetworkId, u32)>>,
}

impl ClaimLedger {
    /// Creates an empty ledger
    pub fn new() -> Self { Self::default() }

    /// Returns whether the deposit has been released
    pub fn is_claimed(&self, network_id: NetworkId, leaf_index: u32) -> bool {
        self.claimed.lock().contains(&(network_id, leaf_index))
    }

    /// Marks a deposit as released
    ///
    /// `before_insert` runs after the duplicate check and before the deposit
    /// is recorded, while the ledger is locked; if it fails nothing is
    /// recorded. Concurrent attempts on the same deposit see exactly one
    /// success.
    ///
    /// # Returns
    /// `AlreadyClaimed` if the deposit was released before
    pub fn try_claim<F>(
        &self,
        network_id: NetworkId,
        leaf_index: u32,
        before_insert: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let mut claimed = self.claimed.lock();
        if claimed.contains(&(network_id, leaf_index)) {
            return Err(ClaimError::AlreadyClaimed { network_id, leaf_index }.into());
        }
        before_insert()?;
        claimed.insert((network_id, leaf_index));
        Ok(())
    }

    /// Returns the number of released deposits
    pub fn len(&self) -> usize { self.claimed.lock().len() }

    /// Returns whether no deposit has been released
    pub fn is_empty(&self) -> bool { self.claimed.lock().is_empty() }
}
