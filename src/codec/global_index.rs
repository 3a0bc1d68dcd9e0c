//! Global index encoding
//!
//! A claim identifies its deposit with a single integer that carries the
//! origin kind, the rollup index and the leaf index in the origin tree:
//!
//! * mainnet deposit: `local_index + 2^64`
//! * rollup deposit: `local_index + rollup_index * 2^32`
//!
//! Both components are below `2^32`, so rollup indices stay below `2^64` and
//! the two ranges never overlap.

use std::fmt;

use alloy_primitives::U256;

use crate::errors::GlobalIndexError;
use crate::types::RollupIndex;

const MAX_COMPONENT: u64 = u32::MAX as u64;

/// Encoded claim position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalIndex(U256);

/// Components of a global index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodedGlobalIndex {
    /// Leaf index in the origin network's exit tree
    pub local_index: u32,
    /// Leaf index of the origin rollup in the rollup exit tree (0 for mainnet)
    pub rollup_index: RollupIndex,
    /// Whether the deposit was made on mainnet
    pub is_mainnet: bool,
}

impl GlobalIndex {
    /// Encodes a claim position
    ///
    /// # Arguments
    /// * `local_index` - Leaf index in the origin tree, below `2^32`
    /// * `rollup_index` - Rollup index, below `2^32`; must be 0 for mainnet
    /// * `is_mainnet` - Whether the deposit was made on mainnet
    ///
    /// # Returns
    /// The global index, or `OutOfRange` for a component that cannot round-trip
    pub fn encode(
        local_index: u64,
        rollup_index: u64,
        is_mainnet: bool,
    ) -> Result<Self, GlobalIndexError> {
        check_component("local_index", local_index, MAX_COMPONENT)?;
        if is_mainnet {
            check_component("rollup_index", rollup_index, 0)?;
            return Ok(Self(U256::from_limbs([local_index, 1, 0, 0])));
        }
        check_component("rollup_index", rollup_index, MAX_COMPONENT)?;
        Ok(Self(U256::from_limbs([local_index | (rollup_index << 32), 0, 0, 0])))
    }

    /// Returns the global index of mainnet leaf `local_index`
    pub fn mainnet(local_index: u32) -> Self {
        Self(U256::from_limbs([u64::from(local_index), 1, 0, 0]))
    }

    /// Returns the global index of leaf `local_index` of rollup `rollup_index`
    pub fn rollup(rollup_index: RollupIndex, local_index: u32) -> Self {
        let low = u64::from(local_index) | (u64::from(rollup_index) << 32);
        Self(U256::from_limbs([low, 0, 0, 0]))
    }

    /// Wraps a raw integer without validating it
    ///
    /// Validation happens in [`GlobalIndex::decode`].
    pub fn from_u256(value: U256) -> Self { Self(value) }

    /// Returns the raw integer
    pub fn as_u256(&self) -> U256 { self.0 }

    /// Splits the index into its components
    ///
    /// # Returns
    /// The components, or `NonCanonical` if bits are set outside the encoded
    /// ranges (above bit 64, or in the rollup field of a mainnet index)
    pub fn decode(&self) -> Result<DecodedGlobalIndex, GlobalIndexError> {
        let [low, flag, high0, high1] = *self.0.as_limbs();
        if flag > 1 || high0 != 0 || high1 != 0 {
            return Err(GlobalIndexError::NonCanonical(self.0));
        }

        let local_index = (low & MAX_COMPONENT) as u32;
        let rollup_index = (low >> 32) as u32;
        let is_mainnet = flag == 1;
        if is_mainnet && rollup_index != 0 {
            return Err(GlobalIndexError::NonCanonical(self.0));
        }

        Ok(DecodedGlobalIndex {
            local_index,
            rollup_index,
            is_mainnet,
        })
    }
}

impl fmt::Display for GlobalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

impl From<GlobalIndex> for U256 {
    fn from(index: GlobalIndex) -> Self { index.0 }
}

/// Encodes `(local_index, rollup_index, is_mainnet)` into a global index
pub fn encode_global_index(
    local_index: u64,
    rollup_index: u64,
    is_mainnet: bool,
) -> Result<GlobalIndex, GlobalIndexError> {
    GlobalIndex::encode(local_index, rollup_index, is_mainnet)
}

/// Decodes a raw global index into its components
pub fn decode_global_index(value: U256) -> Result<DecodedGlobalIndex, GlobalIndexError> {
    GlobalIndex::from_u256(value).decode()
}

fn check_component(field: &'static str, value: u64, max: u64) -> Result<(), GlobalIndexError> {
    if value > max {
        return Err(GlobalIndexError::OutOfRange { field, value, max });
    }
    Ok(())
}
