//! Threshold-gated parallel helpers.
//!
//! With the `parallel` feature, work above the threshold runs on rayon;
//! without it every helper is sequential. Outputs are identical either way.

use std::cmp::Ordering;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Map `0..n` through `f`, collecting in index order.
#[cfg(feature = "parallel")]
pub(crate) fn map_indices<T, F>(n: usize, threshold: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if n >= threshold {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn map_indices<T, F>(n: usize, _threshold: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..n).map(f).collect()
}

/// Map consecutive chunks of `items` through `f`, collecting in chunk order.
#[cfg(feature = "parallel")]
pub(crate) fn map_chunks<S, T, F>(items: &[S], size: usize, threshold: usize, f: F) -> Vec<T>
where
    S: Sync,
    T: Send,
    F: Fn(&[S]) -> T + Sync + Send,
{
    if items.len() >= threshold {
        items.par_chunks(size).map(f).collect()
    } else {
        items.chunks(size).map(f).collect()
    }
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn map_chunks<S, T, F>(items: &[S], size: usize, _threshold: usize, f: F) -> Vec<T>
where
    S: Sync,
    T: Send,
    F: Fn(&[S]) -> T + Sync + Send,
{
    items.chunks(size).map(f).collect()
}

/// Sort with a total order. Callers must break every tie so the result does
/// not depend on the algorithm chosen.
#[cfg(feature = "parallel")]
pub(crate) fn sort_total<T, F>(items: &mut [T], threshold: usize, cmp: F)
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    if items.len() >= threshold {
        items.par_sort_unstable_by(cmp);
    } else {
        items.sort_unstable_by(cmp);
    }
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn sort_total<T, F>(items: &mut [T], _threshold: usize, cmp: F)
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    items.sort_unstable_by(cmp);
}
