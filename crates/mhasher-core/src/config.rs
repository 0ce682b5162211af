//! Engine configuration.
//!
//! Thresholds only decide *how* work is scheduled, never what it produces.

use serde::Deserialize;

use crate::error::{MhasherError, MhasherResult};

/// Configuration for the hashing engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum record count before digesting, sorting and set difference go parallel
    pub parallel_threshold: usize,
    /// Minimum node count of a Merkle level before its parents are built in parallel
    pub merkle_parallel_threshold: usize,
    /// Ceiling on a batch session's packed buffer, in bytes
    pub max_batch_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 1024,
            merkle_parallel_threshold: 64,
            max_batch_bytes: 1 << 30,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `MHASHER_*` environment variables.
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            parallel_threshold: env_usize("MHASHER_PARALLEL_THRESHOLD")
                .unwrap_or(defaults.parallel_threshold),
            merkle_parallel_threshold: env_usize("MHASHER_MERKLE_PARALLEL_THRESHOLD")
                .unwrap_or(defaults.merkle_parallel_threshold),
            max_batch_bytes: env_usize("MHASHER_MAX_BATCH_BYTES")
                .unwrap_or(defaults.max_batch_bytes),
        }
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(input: &str) -> MhasherResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| MhasherError::InvalidArgument(format!("invalid config JSON: {}", e)))
    }

    /// Force every operation onto the sequential path.
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
            merkle_parallel_threshold: usize::MAX,
            ..Self::default()
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"parallel_threshold": 8}"#).unwrap();
        assert_eq!(config.parallel_threshold, 8);
        assert_eq!(config.merkle_parallel_threshold, 64);
        assert_eq!(config.max_batch_bytes, EngineConfig::default().max_batch_bytes);
    }

    #[test]
    fn test_json_invalid() {
        let err = EngineConfig::from_json("{not json").unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_sequential_keeps_batch_limit() {
        let config = EngineConfig::sequential();
        assert_eq!(config.parallel_threshold, usize::MAX);
        assert_eq!(config.max_batch_bytes, 1 << 30);
    }
}
