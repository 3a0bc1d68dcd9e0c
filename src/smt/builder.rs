//! Sparse Merkle tree building functions

use std::collections::BTreeMap;

use super::{get_bit_at_depth, SmtConfig, SmtHasher};
use crate::errors::GenesisError;
use crate::types::Bytes32;
use crate::Result;

/// Computes the state tree root with custom hasher and config
///
/// # Arguments
/// * `leaves` - Map of 256-bit keys to their values
/// * `hasher` - The hash function implementation
/// * `config` - The tree configuration
///
/// # Returns
/// The root hash, or the zero hash if `leaves` is empty
pub fn build_smt_root_with<H: SmtHasher, C: SmtConfig>(
    leaves: &BTreeMap<Bytes32, Bytes32>,
    hasher: &H,
    config: &C,
) -> Result<Bytes32> {
    let sorted: Vec<(Bytes32, Bytes32)> = leaves.iter().map(|(k, v)| (*k, *v)).collect();
    build_smt_node_with(&sorted, 0, hasher, config)
}

/// Builds the node at `depth` over a key-sorted slice of leaves
///
/// Every key in `leaves` shares the same first `depth` bits. The slice is
/// split by the bit at `depth` before termination is checked, so keys that
/// differ only in the last bit still land in different children. At
/// `max_depth` a child holding one leaf is that leaf's hash.
///
/// # Returns
/// The node hash, or `DepthExhausted` if two keys are still together once
/// `max_depth` is reached
pub fn build_smt_node_with<H: SmtHasher, C: SmtConfig>(
    leaves: &[(Bytes32, Bytes32)],
    depth: u8,
    hasher: &H,
    config: &C,
) -> Result<Bytes32> {
    if leaves.is_empty() {
        return Ok(hasher.zero_hash());
    }

    // keys are sorted, so the ones with a 0 bit at this depth come first
    let split = leaves.partition_point(|(key, _)| get_bit_at_depth(key, depth) == 0);
    let (left, right) = leaves.split_at(split);

    let max_depth = config.max_depth();
    if depth >= max_depth {
        if left.len() > 1 || right.len() > 1 {
            return Err(GenesisError::DepthExhausted { max_depth }.into());
        }
        let leaf_hash = |(key, value): &(Bytes32, Bytes32)| {
            hasher.hash_leaf(config.leaf_domain_tag(), *key, *value)
        };
        return Ok(match (left.first().map(leaf_hash), right.first().map(leaf_hash)) {
            (Some(left_child), Some(right_child)) =>
                hasher.hash_internal(config.internal_domain_tag(), left_child, right_child),
            (Some(child), None) | (None, Some(child)) => child,
            (None, None) => hasher.zero_hash(),
        });
    }

    let left_child = build_smt_node_with(left, depth + 1, hasher, config)?;
    let right_child = build_smt_node_with(right, depth + 1, hasher, config)?;
    Ok(hasher.hash_internal(config.internal_domain_tag(), left_child, right_child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smt::{GenesisV1Config, KeccakSmtHasher};
    use crate::Error;

    struct ShallowConfig;

    impl SmtConfig for ShallowConfig {
        fn leaf_domain_tag(&self) -> &[u8] { b"EXIT_SMT_LEAF_v1" }

        fn internal_domain_tag(&self) -> &[u8] { b"EXIT_SMT_NODE_v1" }

        fn max_depth(&self) -> u8 { 1 }
    }

    #[test]
    fn test_build_smt_root_with() {
        let hasher = KeccakSmtHasher;
        let config = GenesisV1Config;

        let empty = build_smt_root_with(&BTreeMap::new(), &hasher, &config).expect("empty root");

        assert_eq!(empty, hasher.zero_hash());

        let mut leaves = BTreeMap::new();
        leaves.insert([0u8; 32], [1u8; 32]);

        let single = build_smt_root_with(&leaves, &hasher, &config).expect("root should build");

        assert_ne!(single, hasher.zero_hash());
    }

    #[test]
    fn test_build_smt_node_with() {
        let hasher = KeccakSmtHasher;
        let config = ShallowConfig;
        let left_key = [0b0000_0000u8; 32];
        let right_key = [0b1000_0000u8; 32];
        let leaves = [(left_key, [4u8; 32]), (right_key, [5u8; 32])];

        let single_at_max = build_smt_node_with(&leaves[..1], 1, &hasher, &config)
            .expect("node should build");
        let split = build_smt_node_with(&leaves, 0, &hasher, &config).expect("node should build");

        let left_leaf = hasher.hash_leaf(config.leaf_domain_tag(), left_key, [4u8; 32]);
        let right_leaf = hasher.hash_leaf(config.leaf_domain_tag(), right_key, [5u8; 32]);
        assert_eq!(single_at_max, left_leaf);
        let internal = hasher.hash_internal(config.internal_domain_tag(), left_leaf, right_leaf);
        assert_eq!(split, internal);
    }

    #[test]
    fn test_depth_exhausted() {
        let hasher = KeccakSmtHasher;
        let config = ShallowConfig;
        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        first[31] = 1;
        second[31] = 2;

        let leaves = [(first, [1u8; 32]), (second, [1u8; 32])];

        let result = build_smt_node_with(&leaves, 0, &hasher, &config);

        assert!(matches!(
            result,
            Err(Error::Genesis(GenesisError::DepthExhausted { max_depth: 1 }))
        ));
    }
}
