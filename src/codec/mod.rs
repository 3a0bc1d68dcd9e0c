//! Wire encodings
//!
//! The global index that positions a claim, and the canonical RLP encoding
//! of legacy transactions.

pub mod global_index;
pub mod rlp;

pub use global_index::{decode_global_index, encode_global_index, DecodedGlobalIndex, GlobalIndex};
pub use rlp::{LegacyTransaction, SignedLegacyTransaction, TxSignature};
