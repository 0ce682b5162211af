//! Merkle builder.
//!
//! Two leaf-sourcing modes:
//! - checksum: hash every raw record, then hash the concatenated leaf
//!   digests once (flat, single level)
//! - merkle root: reduce caller-supplied digests level by level with a
//!   binary or sexdec branching factor
//!
//! Level reduction groups `fanout` consecutive nodes and hashes their
//! concatenation. Binary levels promote a trailing odd node unchanged;
//! sexdec levels hash a trailing partial group from the nodes present.
//! Nodes within a level are independent and computed in parallel above the
//! configured threshold. A single leaf is its own root.

use log::trace;

use crate::config::EngineConfig;
use crate::digest::{multiple_hashes, Algorithm, Digest};
use crate::error::{try_reserve, MhasherError, MhasherResult};
use crate::parallel;
use crate::records::{FixedDigestCollection, Records};

/// Branching factor of a Merkle reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branching {
    /// Two children per parent
    Binary,
    /// Sixteen children per parent
    Sexdec,
}

impl Branching {
    /// Resolve a C-boundary selector (the fanout itself)
    pub fn from_selector(selector: u32) -> MhasherResult<Self> {
        match selector {
            2 => Ok(Branching::Binary),
            16 => Ok(Branching::Sexdec),
            other => Err(MhasherError::UnsupportedBranching(other)),
        }
    }

    pub const fn fanout(self) -> usize {
        match self {
            Branching::Binary => 2,
            Branching::Sexdec => 16,
        }
    }

    /// Build one parent from a group of at most `fanout` siblings.
    fn parent(self, algorithm: Algorithm, group: &[Digest]) -> Digest {
        match (self, group) {
            (Branching::Binary, [only]) => *only,
            _ => algorithm.digest_parts(group),
        }
    }

    /// Reduce one level to the next.
    fn reduce(self, algorithm: Algorithm, level: &[Digest], config: &EngineConfig) -> Vec<Digest> {
        parallel::map_chunks(
            level,
            self.fanout(),
            config.merkle_parallel_threshold,
            |group| self.parent(algorithm, group),
        )
    }
}

/// A node of a built tree: its digest and its level (0 = leaf).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerkleNode {
    pub digest: Digest,
    pub level: usize,
}

/// Lift pre-hashed leaves into digests, checking their width.
fn leaves_from(
    algorithm: Algorithm,
    leaves: &FixedDigestCollection<'_>,
) -> MhasherResult<Vec<Digest>> {
    if leaves.is_empty() {
        return Err(MhasherError::EmptyLeaves);
    }
    if leaves.width() != algorithm.output_len() {
        return Err(MhasherError::DigestWidthMismatch {
            algorithm: algorithm.name(),
            expected: algorithm.output_len(),
            actual: leaves.width(),
        });
    }
    let mut out = Vec::new();
    try_reserve(&mut out, leaves.len())?;
    for leaf in leaves.iter_records() {
        out.push(Digest::from_slice(algorithm, leaf)?);
    }
    Ok(out)
}

/// Root of the multi-level tree over pre-hashed leaves.
///
/// Only the current and next level are held in memory.
pub fn merkle_root(
    algorithm: Algorithm,
    branching: Branching,
    leaves: &FixedDigestCollection<'_>,
    config: &EngineConfig,
) -> MhasherResult<Digest> {
    let mut level = leaves_from(algorithm, leaves)?;
    let mut depth = 0;
    while level.len() > 1 {
        level = branching.reduce(algorithm, &level, config);
        depth += 1;
        trace!("merkle level {} reduced to {} nodes", depth, level.len());
    }
    Ok(level[0])
}

/// Flat checksum over raw records.
///
/// `digest(leaf_0 ‖ … ‖ leaf_{n-1})` with `leaf_i = digest(record_i)`. One
/// record yields its leaf digest; zero records are rejected.
pub fn checksum<R>(algorithm: Algorithm, records: &R, config: &EngineConfig) -> MhasherResult<Digest>
where
    R: Records + ?Sized,
{
    match records.count() {
        0 => Err(MhasherError::EmptyLeaves),
        1 => Ok(algorithm.digest(records.record(0))),
        _ => {
            let leaves = multiple_hashes(algorithm, records, config);
            Ok(algorithm.digest_parts(&leaves))
        }
    }
}

/// Multi-level tree retaining every level, so the path from any leaf to the
/// root can be read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    algorithm: Algorithm,
    branching: Branching,
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Build over pre-hashed leaves.
    pub fn build(
        algorithm: Algorithm,
        branching: Branching,
        leaves: &FixedDigestCollection<'_>,
        config: &EngineConfig,
    ) -> MhasherResult<Self> {
        let mut levels = vec![leaves_from(algorithm, leaves)?];
        while let Some(top) = levels.last().filter(|l| l.len() > 1) {
            let next = branching.reduce(algorithm, top, config);
            levels.push(next);
        }
        Ok(Self {
            algorithm,
            branching,
            levels,
        })
    }

    /// Build over raw records, hashing each into a leaf first.
    pub fn from_records<R>(
        algorithm: Algorithm,
        branching: Branching,
        records: &R,
        config: &EngineConfig,
    ) -> MhasherResult<Self>
    where
        R: Records + ?Sized,
    {
        let leaves = multiple_hashes(algorithm, records, config);
        let leaves = FixedDigestCollection::from_digests(&leaves)?;
        Self::build(algorithm, branching, &leaves, config)
    }

    pub fn root(&self) -> Digest {
        // Construction guarantees a non-empty top level.
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of levels including the leaves
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn branching(&self) -> Branching {
        self.branching
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    pub fn level(&self, level: usize) -> Option<&[Digest]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    pub fn node(&self, level: usize, index: usize) -> Option<MerkleNode> {
        self.levels
            .get(level)
            .and_then(|nodes| nodes.get(index))
            .map(|&digest| MerkleNode { digest, level })
    }

    /// Index range of the children of `(level, index)` in `level - 1`.
    pub fn children(&self, level: usize, index: usize) -> Option<std::ops::Range<usize>> {
        if level == 0 || level >= self.levels.len() || index >= self.levels[level].len() {
            return None;
        }
        let fanout = self.branching.fanout();
        let below = self.levels[level - 1].len();
        let start = index * fanout;
        Some(start..(start + fanout).min(below))
    }
}
