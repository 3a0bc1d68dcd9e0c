//! Deposit leaves
//!
//! A deposit is committed to an exit tree as a single 32-byte leaf:
//! `keccak256(leaf_type ‖ origin_network ‖ origin_address ‖ destination_network
//! ‖ destination_address ‖ amount ‖ metadata_hash)`, packed big-endian.

use alloy_primitives::{keccak256, Address, U256};

use crate::types::{Bytes32, Leaf, NetworkId};

/// Length of the packed leaf preimage (1 + 4 + 20 + 4 + 20 + 32 + 32)
const LEAF_PREIMAGE_LEN: usize = 113;

/// Kind of bridged transfer a leaf commits to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LeafType {
    /// Token or native asset transfer
    Asset = 0,
    /// Arbitrary message carrying native value
    Message = 1,
}

/// The data committed by one deposit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositLeaf {
    /// Asset transfer or message
    pub leaf_type: LeafType,
    /// Network where the token was originally issued (or the sender's network for messages)
    pub origin_network: NetworkId,
    /// Token address on its origin network (or the message sender)
    pub origin_address: Address,
    /// Network the deposit can be claimed on
    pub destination_network: NetworkId,
    /// Recipient on the destination network
    pub destination_address: Address,
    /// Amount released by the claim
    pub amount: U256,
    /// Hash of the token metadata or message payload
    pub metadata_hash: Bytes32,
}

impl DepositLeaf {
    /// Creates an asset transfer leaf
    ///
    /// # Arguments
    /// * `origin_network` - Network where the token was issued
    /// * `origin_token` - Token address on that network (zero for the native asset)
    /// * `destination_network` - Network the transfer can be claimed on
    /// * `destination_address` - Recipient address
    /// * `amount` - Amount transferred
    /// * `metadata` - Token metadata (hashed into the leaf)
    pub fn asset(
        origin_network: NetworkId,
        origin_token: Address,
        destination_network: NetworkId,
        destination_address: Address,
        amount: U256,
        metadata: &[u8],
    ) -> Self {
        Self {
            leaf_type: LeafType::Asset,
            origin_network,
            origin_address: origin_token,
            destination_network,
            destination_address,
            amount,
            metadata_hash: metadata_hash(metadata),
        }
    }

    /// Creates a message leaf
    ///
    /// # Arguments
    /// * `origin_network` - Network the message is sent from
    /// * `sender` - Address that sent the message
    /// * `destination_network` - Network the message is delivered to
    /// * `destination_address` - Receiving contract
    /// * `value` - Native value attached to the message
    /// * `payload` - Message payload (hashed into the leaf)
    pub fn message(
        origin_network: NetworkId,
        sender: Address,
        destination_network: NetworkId,
        destination_address: Address,
        value: U256,
        payload: &[u8],
    ) -> Self {
        Self {
            leaf_type: LeafType::Message,
            origin_network,
            origin_address: sender,
            destination_network,
            destination_address,
            amount: value,
            metadata_hash: metadata_hash(payload),
        }
    }

    /// Computes the 32-byte leaf inserted into the exit tree
    pub fn hash(&self) -> Leaf {
        let mut preimage = Vec::with_capacity(LEAF_PREIMAGE_LEN);
        preimage.push(self.leaf_type as u8);
        preimage.extend_from_slice(&self.origin_network.to_be_bytes());
        preimage.extend_from_slice(self.origin_address.as_slice());
        preimage.extend_from_slice(&self.destination_network.to_be_bytes());
        preimage.extend_from_slice(self.destination_address.as_slice());
        preimage.extend_from_slice(&self.amount.to_be_bytes::<32>());
        preimage.extend_from_slice(&self.metadata_hash);
        keccak256(&preimage).0
    }
}

/// Hashes token metadata or a message payload
pub fn metadata_hash(metadata: &[u8]) -> Bytes32 { keccak256(metadata).0 }

#[cfg(test)]
mod tests {
    use alloy_primitives::hex;

    use super::*;

    #[test]
    fn test_asset_leaf_hash() {
        let leaf = DepositLeaf::asset(
            0,
            Address::ZERO,
            1,
            Address::repeat_byte(0x11),
            U256::from(1_000_000_000_000_000_000u64),
            &[],
        );

        assert_eq!(
            hex::encode(leaf.hash()),
            "757bf7a6989937e4222f35d5b854a2585095214889126ce4ed59a598457b6e9a"
        );
    }

    #[test]
    fn test_leaf_type_changes_hash() {
        let asset = DepositLeaf::asset(0, Address::ZERO, 1, Address::ZERO, U256::from(5), b"m");
        let message = DepositLeaf::message(0, Address::ZERO, 1, Address::ZERO, U256::from(5), b"m");

        assert_eq!(asset.metadata_hash, message.metadata_hash);
        assert_ne!(asset.hash(), message.hash());
    }

    #[test]
    fn test_metadata_hash() {
        assert_eq!(
            hex::encode(metadata_hash(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
