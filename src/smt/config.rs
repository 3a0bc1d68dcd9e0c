//! Configuration implementations for state tree operations

use super::SmtConfig;

/// Genesis state tree v1 configuration
#[derive(Clone, Copy, Debug, Default)]
pub struct GenesisV1Config;

impl SmtConfig for GenesisV1Config {
    fn leaf_domain_tag(&self) -> &[u8] { b"EXIT_SMT_LEAF_v1" }

    fn internal_domain_tag(&self) -> &[u8] { b"EXIT_SMT_NODE_v1" }

    fn max_depth(&self) -> u8 {
        255 // 256-bit keys, 0-indexed depth
    }
}

/// Default config instance (genesis v1)
pub(crate) const DEFAULT_CONFIG: GenesisV1Config = GenesisV1Config;
