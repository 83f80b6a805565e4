//! Emulator configuration. Every field has a default, so a partial JSON file is enough.

use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::core::coin_selection::SelectorConfig;
use crate::core::params::NetworkParams;
use crate::core::rng::DEFAULT_SEED;
use crate::error::{EmulatorError, Result};

/// Network number used for test networks (addresses are prefixed `addr_test1`).
pub const TESTNET_NET_NUMBER: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Identity of the emulator instance; mixed into genesis transaction ids.
    pub emulator_id: u64,
    /// Initial PRNG state.
    pub seed: u32,
    pub net_number: u8,
    pub params: NetworkParams,
    pub selector: SelectorConfig,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            emulator_id: 0,
            seed: DEFAULT_SEED,
            net_number: TESTNET_NET_NUMBER,
            params: NetworkParams::default(),
            selector: SelectorConfig::default(),
        }
    }
}

impl EmulatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EmulatorError::Encoding(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg =
            EmulatorConfig::from_json_str(r#"{"seed": 42, "params": {"slot_length_ms": 20}}"#)
                .unwrap();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.emulator_id, 0);
        assert_eq!(cfg.params.slot_length_ms, 20);
        assert_eq!(cfg.params.coins_per_utxo_byte, NetworkParams::default().coins_per_utxo_byte);
        assert_eq!(cfg.selector, SelectorConfig::default());
    }

    #[test]
    fn test_invalid_config_is_encoding_error() {
        let err = EmulatorConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, EmulatorError::Encoding(_)));
    }
}
