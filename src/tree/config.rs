//! Configuration for exit trees

use crate::types::DEFAULT_TREE_HEIGHT;

/// Trait for exit tree configuration parameters
///
/// This trait abstracts over tree parameters so that protocol versions can
/// change them without touching the tree code.
///
/// # Example
///
/// ```rust
/// use exit_tree::tree::TreeConfig;
///
/// struct TinyConfig;
///
/// impl TreeConfig for TinyConfig {
///     fn height(&self) -> u8 {
///         4
///     }
/// }
///
/// assert_eq!(TinyConfig.height(), 4);
/// ```
pub trait TreeConfig {
    /// Returns the fixed height of every exit tree
    ///
    /// A tree of height `h` holds `2^h` leaves and its proofs carry `h`
    /// sibling hashes.
    fn height(&self) -> u8;
}

/// Exit tree v1 configuration: 32 levels, matching the bridge contracts
#[derive(Clone, Copy, Debug, Default)]
pub struct ExitTreeV1Config;

impl TreeConfig for ExitTreeV1Config {
    fn height(&self) -> u8 { DEFAULT_TREE_HEIGHT }
}

/// Default config instance (exit tree v1)
pub(crate) const DEFAULT_CONFIG: ExitTreeV1Config = ExitTreeV1Config;
