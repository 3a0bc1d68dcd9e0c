//! Hasher implementations for state tree operations

use alloy_primitives::Keccak256;

use super::SmtHasher;
use crate::types::Bytes32;

/// Keccak-256 hasher for state tree operations
///
/// `hash_leaf = keccak256(tag ‖ key ‖ value)` and
/// `hash_internal = keccak256(tag ‖ left ‖ right)`; empty subtrees are zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeccakSmtHasher;

impl KeccakSmtHasher {
    fn hash_parts(domain_tag: &[u8], first: &Bytes32, second: &Bytes32) -> Bytes32 {
        let mut hasher = Keccak256::new();
        hasher.update(domain_tag);
        hasher.update(first);
        hasher.update(second);
        hasher.finalize().0
    }
}

impl SmtHasher for KeccakSmtHasher {
    fn hash_leaf(&self, domain_tag: &[u8], key: Bytes32, value: Bytes32) -> Bytes32 {
        Self::hash_parts(domain_tag, &key, &value)
    }

    fn hash_internal(&self, domain_tag: &[u8], left: Bytes32, right: Bytes32) -> Bytes32 {
        Self::hash_parts(domain_tag, &left, &right)
    }

    fn zero_hash(&self) -> Bytes32 { [0u8; 32] }
}

/// Default hasher instance (keccak-256)
pub(crate) const DEFAULT_HASHER: KeccakSmtHasher = KeccakSmtHasher;
