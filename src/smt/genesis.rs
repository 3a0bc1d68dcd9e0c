//! Genesis state root
//!
//! Turns a list of genesis accounts into state tree leaves and computes the
//! root. Each non-zero piece of state gets the key
//! `keccak256(address ‖ kind ‖ slot)`, where `slot` is the storage slot for
//! storage entries and zero otherwise.

use std::collections::{BTreeMap, HashSet};

use alloy_primitives::{keccak256, Address, Bytes, U256};

use super::builder::build_smt_root_with;
use super::config::DEFAULT_CONFIG;
use super::hasher::DEFAULT_HASHER;
use super::{SmtConfig, SmtHasher};
use crate::errors::GenesisError;
use crate::types::Bytes32;
use crate::Result;

/// Kind of account state a key points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateKeyKind {
    /// Account balance
    Balance = 0,
    /// Account nonce
    Nonce = 1,
    /// Keccak-256 of the account's bytecode
    CodeHash = 2,
    /// One storage slot
    Storage = 3,
    /// Length of the account's bytecode in bytes
    CodeLength = 4,
}

/// One account of the genesis state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenesisAccount {
    /// Account address
    pub address: Address,
    /// Initial balance
    pub balance: U256,
    /// Initial nonce
    pub nonce: u64,
    /// Deployed bytecode, if the account is a contract
    pub bytecode: Option<Bytes>,
    /// Initial storage, slot to value
    pub storage: Option<BTreeMap<U256, U256>>,
}

/// Computes the state tree key of one piece of account state
///
/// # Arguments
/// * `address` - The account
/// * `kind` - Which piece of state
/// * `slot` - The storage slot for [`StateKeyKind::Storage`], zero otherwise
pub fn state_key(address: &Address, kind: StateKeyKind, slot: U256) -> Bytes32 {
    let mut preimage = [0u8; 20 + 1 + 32];
    preimage[..20].copy_from_slice(address.as_slice());
    preimage[20] = kind as u8;
    preimage[21..].copy_from_slice(&slot.to_be_bytes::<32>());
    keccak256(preimage).0
}

/// Expands genesis accounts into state tree leaves
///
/// Zero balances, zero nonces, empty bytecode and zero storage values
/// produce no leaf.
///
/// # Returns
/// The leaves keyed by state key, or `DuplicateAccount` if an address is
/// listed twice
pub fn genesis_leaves(accounts: &[GenesisAccount]) -> Result<BTreeMap<Bytes32, Bytes32>> {
    let mut seen = HashSet::with_capacity(accounts.len());
    let mut leaves = BTreeMap::new();

    for account in accounts {
        if !seen.insert(account.address) {
            return Err(GenesisError::DuplicateAccount(account.address).into());
        }

        let address = &account.address;
        let mut put = |kind: StateKeyKind, slot: U256, value: U256| {
            if !value.is_zero() {
                leaves.insert(state_key(address, kind, slot), value.to_be_bytes::<32>());
            }
        };

        put(StateKeyKind::Balance, U256::ZERO, account.balance);
        put(StateKeyKind::Nonce, U256::ZERO, U256::from(account.nonce));
        if let Some(code) = account.bytecode.as_ref().filter(|code| !code.is_empty()) {
            put(StateKeyKind::CodeHash, U256::ZERO, U256::from_be_bytes(keccak256(code).0));
            put(StateKeyKind::CodeLength, U256::ZERO, U256::from(code.len()));
        }
        for (slot, value) in account.storage.iter().flatten() {
            put(StateKeyKind::Storage, *slot, *value);
        }
    }

    Ok(leaves)
}

/// Computes the genesis state root with the default hasher and config
///
/// # Example
///
/// ```rust
/// use alloy_primitives::{Address, U256};
/// use exit_tree::smt::{compute_genesis_root, GenesisAccount};
///
/// let alice = GenesisAccount {
///     address: Address::repeat_byte(0xaa),
///     balance: U256::from(100u64),
///     ..Default::default()
/// };
/// let bob = GenesisAccount {
///     address: Address::repeat_byte(0xbb),
///     nonce: 1,
///     ..Default::default()
/// };
///
/// let root = compute_genesis_root(&[alice.clone(), bob.clone()])?;
/// assert_eq!(root, compute_genesis_root(&[bob, alice])?);
/// # Ok::<(), exit_tree::errors::Error>(())
/// ```
pub fn compute_genesis_root(accounts: &[GenesisAccount]) -> Result<Bytes32> {
    compute_genesis_root_with(accounts, &DEFAULT_HASHER, &DEFAULT_CONFIG)
}

/// Computes the genesis state root with custom hasher and config
pub fn compute_genesis_root_with<H: SmtHasher, C: SmtConfig>(
    accounts: &[GenesisAccount],
    hasher: &H,
    config: &C,
) -> Result<Bytes32> {
    let leaves = genesis_leaves(accounts)?;
    let root = build_smt_root_with(&leaves, hasher, config)?;
    tracing::debug!(accounts = accounts.len(), leaves = leaves.len(), "computed genesis root");
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smt::KeccakSmtHasher;
    use crate::Error;

    fn contract() -> GenesisAccount {
        let mut storage = BTreeMap::new();
        storage.insert(U256::from(0u64), U256::from(7u64));
        storage.insert(U256::from(1u64), U256::ZERO);
        GenesisAccount {
            address: Address::repeat_byte(0xcc),
            balance: U256::ZERO,
            nonce: 1,
            bytecode: Some(Bytes::from_static(&[0x60, 0x00, 0x60, 0x00])),
            storage: Some(storage),
        }
    }

    #[test]
    fn test_state_key() {
        let address = Address::repeat_byte(0x01);

        let balance = state_key(&address, StateKeyKind::Balance, U256::ZERO);
        let nonce = state_key(&address, StateKeyKind::Nonce, U256::ZERO);
        let slot_one = state_key(&address, StateKeyKind::Storage, U256::from(1u64));
        let slot_two = state_key(&address, StateKeyKind::Storage, U256::from(2u64));

        assert_ne!(balance, nonce);
        assert_ne!(slot_one, slot_two);
        assert_eq!(balance, state_key(&address, StateKeyKind::Balance, U256::ZERO));
    }

    #[test]
    fn test_genesis_leaves() {
        let leaves = genesis_leaves(&[contract()]).expect("leaves should build");
        let address = Address::repeat_byte(0xcc);

        // nonce, code hash, code length and one non-zero storage slot
        assert_eq!(leaves.len(), 4);
        assert!(!leaves.contains_key(&state_key(&address, StateKeyKind::Balance, U256::ZERO)));
        assert_eq!(
            leaves.get(&state_key(&address, StateKeyKind::CodeLength, U256::ZERO)),
            Some(&U256::from(4u64).to_be_bytes::<32>())
        );
        assert_eq!(
            leaves.get(&state_key(&address, StateKeyKind::Storage, U256::ZERO)),
            Some(&U256::from(7u64).to_be_bytes::<32>())
        );
    }

    #[test]
    fn test_zero_values_are_absent() {
        let bare = GenesisAccount {
            address: Address::repeat_byte(0x02),
            balance: U256::from(5u64),
            ..Default::default()
        };
        let padded = GenesisAccount {
            bytecode: Some(Bytes::new()),
            storage: Some(BTreeMap::from([(U256::from(3u64), U256::ZERO)])),
            ..bare.clone()
        };

        assert_eq!(
            compute_genesis_root(&[bare]).expect("root should build"),
            compute_genesis_root(&[padded]).expect("root should build")
        );
    }

    #[test]
    fn test_duplicate_account() {
        let result = compute_genesis_root(&[contract(), contract()]);

        assert!(matches!(
            result,
            Err(Error::Genesis(GenesisError::DuplicateAccount(address)))
                if address == Address::repeat_byte(0xcc)
        ));
    }

    #[test]
    fn test_empty_genesis() {
        let root = compute_genesis_root(&[]).expect("root should build");

        assert_eq!(root, KeccakSmtHasher.zero_hash());
    }

    #[test]
    fn test_order_independence() {
        let funded = GenesisAccount {
            address: Address::repeat_byte(0x10),
            balance: U256::from(1_000u64),
            ..Default::default()
        };

        let forward = compute_genesis_root(&[funded.clone(), contract()]).expect("root");
        let backward = compute_genesis_root(&[contract(), funded]).expect("root");

        assert_eq!(forward, backward);
        assert_ne!(forward, KeccakSmtHasher.zero_hash());
    }
}
