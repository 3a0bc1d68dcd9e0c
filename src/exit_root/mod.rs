//! Global exit root
//!
//! The rollup exit tree collects the exit roots of every rollup, the
//! aggregator combines its root with the mainnet exit root into the global
//! exit root, and claims are verified against the aggregator's history.

pub mod aggregator;
pub mod claim;
pub mod rollup_tree;

pub use aggregator::{
    global_exit_root, ExitRootSlot, ExitRoots, GlobalExitRootAggregator, GlobalExitRootEntry,
    PublishedRoot, SlotOwners,
};
pub use claim::{verify_claim, Claim, ClaimLedger, VerifiedClaim};
pub use rollup_tree::RollupExitTree;
