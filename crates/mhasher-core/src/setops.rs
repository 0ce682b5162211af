//! Record set algebra: sort, unique, unique-sort, remove.
//!
//! Ordering is unsigned byte-wise lexicographic with a shorter record
//! sorting before any record it is a prefix of. Byte-identical records are
//! ordered by original index, which makes the order total: the sort result
//! never depends on the algorithm or the degree of parallelism.
//!
//! Every operation works on indices only; record bytes are never moved.

use std::cmp::Ordering;

use ahash::AHashSet;

use crate::config::EngineConfig;
use crate::error::{try_reserve, MhasherResult};
use crate::parallel;
use crate::records::{FixedDigestCollection, RecordCollection, Records};

/// Original indices in result order
pub type Permutation = Vec<usize>;

/// One survival flag per original record, in input order
pub type KeepMask = Vec<bool>;

#[inline]
fn compare<R: Records + ?Sized>(records: &R, a: usize, b: usize) -> Ordering {
    records
        .record(a)
        .cmp(records.record(b))
        .then_with(|| a.cmp(&b))
}

/// Permutation that lists records in ascending byte order, ties by index.
pub fn sort<R>(records: &R, config: &EngineConfig) -> Permutation
where
    R: Records + ?Sized,
{
    let mut indices: Permutation = (0..records.count()).collect();
    parallel::sort_total(&mut indices, config.parallel_threshold, |&a, &b| {
        compare(records, a, b)
    });
    indices
}

/// Keep exactly the lowest original index of every distinct byte value.
///
/// Input order does not matter: an internal ordering pass groups duplicates.
pub fn unique<R>(records: &R, config: &EngineConfig) -> KeepMask
where
    R: Records + ?Sized,
{
    let mut mask = vec![false; records.count()];
    let mut previous: Option<&[u8]> = None;
    for i in sort(records, config) {
        let current = records.record(i);
        if previous != Some(current) {
            // First in its run, so the lowest index holding these bytes.
            mask[i] = true;
            previous = Some(current);
        }
    }
    mask
}

/// Sorted, deduplicated indices. The survivor of each duplicate group is its
/// lowest original index; the count is the length of the result.
pub fn unique_sort<R>(records: &R, config: &EngineConfig) -> Permutation
where
    R: Records + ?Sized,
{
    let mut indices = sort(records, config);
    indices.dedup_by(|later, kept| records.record(*later) == records.record(*kept));
    indices
}

/// Keep every base record whose bytes appear nowhere in `exclude`.
pub fn remove<B, E>(base: &B, exclude: &E, config: &EngineConfig) -> KeepMask
where
    B: Records + ?Sized,
    E: Records + ?Sized,
{
    if exclude.is_empty() {
        return vec![true; base.count()];
    }
    let excluded: AHashSet<&[u8]> = exclude.iter_records().collect();
    parallel::map_indices(base.count(), config.parallel_threshold, |i| {
        !excluded.contains(base.record(i))
    })
}

// ============================================================================
// Fixed-digest fast paths
// ============================================================================

/// Sort uniform-width digests. Same order and tie-break as `sort`.
pub fn sort_hash256(digests: &FixedDigestCollection<'_>, config: &EngineConfig) -> Permutation {
    sort(digests, config)
}

/// Distinct digests in ascending order.
pub fn unique_hash256(
    digests: &FixedDigestCollection<'_>,
    config: &EngineConfig,
) -> MhasherResult<FixedDigestCollection<'static>> {
    let survivors = unique_sort(digests, config);
    FixedDigestCollection::from_records(
        survivors.iter().map(|&i| digests.record(i)),
        digests.width(),
        survivors.len(),
    )
}

/// Distinct digests in unspecified order, via one hash-set pass.
///
/// Same survivor set as `unique_hash256`; use that instead when the output
/// must be canonical.
pub fn quick_unique_hash256(
    digests: &FixedDigestCollection<'_>,
) -> MhasherResult<FixedDigestCollection<'static>> {
    let mut seen: AHashSet<&[u8]> = AHashSet::with_capacity(digests.len());
    let survivors: Vec<&[u8]> = digests
        .iter_records()
        .filter(|d| seen.insert(*d))
        .collect();
    FixedDigestCollection::from_records(survivors.iter().copied(), digests.width(), survivors.len())
}

// ============================================================================
// Materialisation helpers
// ============================================================================

/// Copy the records named by `indices`, in that order.
pub fn gather<R>(records: &R, indices: &[usize]) -> MhasherResult<RecordCollection<'static>>
where
    R: Records + ?Sized,
{
    let mut out = RecordCollection::new();
    for &i in indices {
        out.push(records.record(i))?;
    }
    Ok(out)
}

/// Copy the records whose mask flag is set, preserving input order.
pub fn compact<R>(records: &R, mask: &[bool]) -> MhasherResult<RecordCollection<'static>>
where
    R: Records + ?Sized,
{
    let mut kept: Vec<usize> = Vec::new();
    try_reserve(&mut kept, mask.len())?;
    kept.extend(mask.iter().enumerate().filter(|(_, keep)| **keep).map(|(i, _)| i));
    gather(records, &kept)
}
