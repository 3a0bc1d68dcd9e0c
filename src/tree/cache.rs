//! Cache layer for exit tree proofs
//!
//! Claims for the same deposit against the same published snapshot ask for
//! the same proof over and over. This module wraps a proof provider with a
//! sharded concurrent cache (quick-cache, S3-FIFO eviction) keyed by
//! `(network, leaf index, snapshot size)`. Trees are append-only, so a proof
//! for a given snapshot never changes and entries never go stale.

use std::sync::Arc;

use quick_cache::sync::Cache;

use super::proof::MerkleProof;
use crate::types::NetworkId;
use crate::Result;

/// Source of historical exit tree proofs
pub trait ProofProvider {
    /// Returns the proof of leaf `index` of `network_id` against the root the
    /// network's tree had when it held `leaf_count` leaves
    fn proof_at(&self, network_id: NetworkId, index: u32, leaf_count: u64) -> Result<MerkleProof>;
}

impl<P: ProofProvider + ?Sized> ProofProvider for Arc<P> {
    fn proof_at(&self, network_id: NetworkId, index: u32, leaf_count: u64) -> Result<MerkleProof> {
        (**self).proof_at(network_id, index, leaf_count)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ProofKey {
    network_id: NetworkId,
    index: u32,
    leaf_count: u64,
}

/// Cached proof provider
///
/// Wraps another provider; hits are answered from memory and misses are
/// delegated and then stored. Errors are never cached.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use exit_tree::tree::{CachedProofProvider, ExitTreeRegistry, Keccak256Hasher, ProofProvider};
///
/// let registry = Arc::new(ExitTreeRegistry::new(32, Keccak256Hasher)?);
/// let (index, root) = registry.add_leaf(0, [3u8; 32])?;
/// let cached = CachedProofProvider::new(Arc::clone(&registry), 1024);
///
/// let proof = cached.proof_at(0, index, 1)?;
/// assert!(proof.verify([3u8; 32], root));
/// # Ok::<(), exit_tree::errors::Error>(())
/// ```
pub struct CachedProofProvider<P> {
    provider: P,
    cache: Arc<Cache<ProofKey, MerkleProof>>,
}

impl<P> CachedProofProvider<P> {
    /// Creates a new cached proof provider
    ///
    /// # Arguments
    /// * `provider` - The underlying proof provider to wrap
    /// * `capacity` - Maximum number of cached proofs (approximately)
    pub fn new(provider: P, capacity: usize) -> Self {
        Self { provider, cache: Arc::new(Cache::new(capacity.max(1))) }
    }

    /// Returns the wrapped provider
    pub fn inner(&self) -> &P { &self.provider }

    /// Returns the number of cached proofs
    pub fn len(&self) -> usize { self.cache.len() }

    /// Returns whether the cache holds no proof
    pub fn is_empty(&self) -> bool { self.cache.is_empty() }
}

impl<P: ProofProvider> ProofProvider for CachedProofProvider<P> {
    fn proof_at(&self, network_id: NetworkId, index: u32, leaf_count: u64) -> Result<MerkleProof> {
        let key = ProofKey { network_id, index, leaf_count };

        if let Some(proof) = self.cache.get(&key) {
            return Ok(proof);
        }

        let proof = self.provider.proof_at(network_id, index, leaf_count)?;
        self.cache.insert(key, proof.clone());
        Ok(proof)
    }
}
