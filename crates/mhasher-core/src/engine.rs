//! Engine - configured entry point for every stateless operation

use crate::batch::BatchSession;
use crate::config::EngineConfig;
use crate::digest::{self, Algorithm, Digest};
use crate::error::MhasherResult;
use crate::merkle::{self, Branching, MerkleTree};
use crate::records::{FixedDigestCollection, Records};
use crate::setops::{self, KeepMask, Permutation};

/// Hashing, Merkle and set-algebra operations under one configuration.
///
/// Holds no state besides its configuration; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn digest(&self, algorithm: Algorithm, bytes: &[u8]) -> Digest {
        algorithm.digest(bytes)
    }

    pub fn multiple_hashes<R: Records + ?Sized>(&self, algorithm: Algorithm, records: &R) -> Vec<Digest> {
        digest::multiple_hashes(algorithm, records, &self.config)
    }

    pub fn sort<R: Records + ?Sized>(&self, records: &R) -> Permutation {
        setops::sort(records, &self.config)
    }

    pub fn unique<R: Records + ?Sized>(&self, records: &R) -> KeepMask {
        setops::unique(records, &self.config)
    }

    pub fn unique_sort<R: Records + ?Sized>(&self, records: &R) -> Permutation {
        setops::unique_sort(records, &self.config)
    }

    pub fn remove<B, E>(&self, base: &B, exclude: &E) -> KeepMask
    where
        B: Records + ?Sized,
        E: Records + ?Sized,
    {
        setops::remove(base, exclude, &self.config)
    }

    pub fn sort_hash256(&self, digests: &FixedDigestCollection<'_>) -> Permutation {
        setops::sort_hash256(digests, &self.config)
    }

    pub fn unique_hash256(
        &self,
        digests: &FixedDigestCollection<'_>,
    ) -> MhasherResult<FixedDigestCollection<'static>> {
        setops::unique_hash256(digests, &self.config)
    }

    pub fn quick_unique_hash256(
        &self,
        digests: &FixedDigestCollection<'_>,
    ) -> MhasherResult<FixedDigestCollection<'static>> {
        setops::quick_unique_hash256(digests)
    }

    pub fn checksum<R: Records + ?Sized>(&self, algorithm: Algorithm, records: &R) -> MhasherResult<Digest> {
        merkle::checksum(algorithm, records, &self.config)
    }

    pub fn merkle_root(
        &self,
        algorithm: Algorithm,
        branching: Branching,
        leaves: &FixedDigestCollection<'_>,
    ) -> MhasherResult<Digest> {
        merkle::merkle_root(algorithm, branching, leaves, &self.config)
    }

    pub fn merkle_tree(
        &self,
        algorithm: Algorithm,
        branching: Branching,
        leaves: &FixedDigestCollection<'_>,
    ) -> MhasherResult<MerkleTree> {
        MerkleTree::build(algorithm, branching, leaves, &self.config)
    }

    /// Start a batch session bounded by this engine's byte ceiling
    pub fn start_batch(&self) -> BatchSession {
        BatchSession::with_config(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_delegates() {
        let engine = Engine::new();
        let records = vec!["b", "a", "b"];
        assert_eq!(engine.sort(&records), vec![1, 0, 2]);
        assert_eq!(engine.unique(&records), vec![true, true, false]);
        assert_eq!(engine.unique_sort(&records), vec![1, 0]);
        assert_eq!(engine.remove(&records, &vec!["a"]), vec![true, false, true]);
    }

    #[test]
    fn test_engine_batch_uses_ceiling() {
        let engine = Engine::with_config(EngineConfig {
            max_batch_bytes: 2,
            ..EngineConfig::default()
        });
        let mut session = engine.start_batch();
        assert!(session.pack(["abc"]).is_err());
    }
}
