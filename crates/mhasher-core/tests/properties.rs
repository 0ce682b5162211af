//! Property tests for the set algebra and Merkle reduction

use std::collections::BTreeSet;

use mhasher_core::{
    gather, merkle_root, multiple_hashes, quick_unique_hash256, remove, sort, unique, unique_hash256,
    unique_sort, Algorithm, Branching, EngineConfig, FixedDigestCollection, Records,
};
use proptest::prelude::*;

/// Config that takes the parallel path for every non-trivial input
fn eager_parallel() -> EngineConfig {
    EngineConfig {
        parallel_threshold: 1,
        merkle_parallel_threshold: 1,
        ..EngineConfig::default()
    }
}

// Short records over a small alphabet so duplicates and prefixes are common.
fn records() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(0u8..4, 0..4), 0..64)
}

fn leaves(max: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..8), 1..max)
}

proptest! {
    #[test]
    fn sort_is_ordered_permutation(data in records()) {
        let perm = sort(&data, &EngineConfig::default());

        let mut seen = perm.clone();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..data.len()).collect::<Vec<_>>());

        for pair in perm.windows(2) {
            let (a, b) = (data.record(pair[0]), data.record(pair[1]));
            prop_assert!(a < b || (a == b && pair[0] < pair[1]));
        }
    }

    #[test]
    fn unique_sort_is_minimal(data in records()) {
        let config = EngineConfig::default();
        let survivors = unique_sort(&data, &config);

        let distinct: BTreeSet<&[u8]> = data.iter().map(Vec::as_slice).collect();
        prop_assert_eq!(survivors.len(), distinct.len());

        for &i in &survivors {
            let first = data.iter().position(|r| r == &data[i]).unwrap();
            prop_assert_eq!(first, i);
        }
        let kept: Vec<&[u8]> = survivors.iter().map(|&i| data.record(i)).collect();
        prop_assert!(kept.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unique_mask_agrees_with_unique_sort(data in records()) {
        let config = EngineConfig::default();
        let mask = unique(&data, &config);
        let mut from_mask: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();
        let mut from_sort = unique_sort(&data, &config);
        from_mask.sort_unstable();
        from_sort.sort_unstable();
        prop_assert_eq!(from_mask, from_sort);
    }

    #[test]
    fn remove_is_membership_test(base in records(), exclude in records()) {
        let mask = remove(&base, &exclude, &EngineConfig::default());
        prop_assert_eq!(mask.len(), base.len());
        for (i, keep) in mask.iter().enumerate() {
            prop_assert_eq!(*keep, !exclude.contains(&base[i]));
        }
    }

    #[test]
    fn parallel_matches_sequential(data in records(), exclude in records()) {
        let seq = EngineConfig::sequential();
        let par = eager_parallel();

        prop_assert_eq!(sort(&data, &seq), sort(&data, &par));
        prop_assert_eq!(unique(&data, &seq), unique(&data, &par));
        prop_assert_eq!(unique_sort(&data, &seq), unique_sort(&data, &par));
        prop_assert_eq!(remove(&data, &exclude, &seq), remove(&data, &exclude, &par));
        prop_assert_eq!(
            multiple_hashes(Algorithm::Keccak256, &data, &seq),
            multiple_hashes(Algorithm::Keccak256, &data, &par)
        );
    }

    #[test]
    fn merkle_root_is_deterministic_across_configs(data in leaves(80)) {
        let k = Algorithm::Keccak256;
        let digests = multiple_hashes(k, &data, &EngineConfig::default());
        let leaves = FixedDigestCollection::from_digests(&digests).unwrap();
        for branching in [Branching::Binary, Branching::Sexdec] {
            let seq = merkle_root(k, branching, &leaves, &EngineConfig::sequential()).unwrap();
            let par = merkle_root(k, branching, &leaves, &eager_parallel()).unwrap();
            prop_assert_eq!(seq, par);
        }
    }

    #[test]
    fn merkle_root_is_order_sensitive(
        data in leaves(40),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let k = Algorithm::Keccak256;
        let config = EngineConfig::default();
        let digests = multiple_hashes(k, &data, &config);
        let (i, j) = (a.index(digests.len()), b.index(digests.len()));
        prop_assume!(digests[i] != digests[j]);

        let mut swapped = digests.clone();
        swapped.swap(i, j);

        let original = FixedDigestCollection::from_digests(&digests).unwrap();
        let reordered = FixedDigestCollection::from_digests(&swapped).unwrap();
        for branching in [Branching::Binary, Branching::Sexdec] {
            prop_assert_ne!(
                merkle_root(k, branching, &original, &config).unwrap(),
                merkle_root(k, branching, &reordered, &config).unwrap()
            );
        }
    }

    #[test]
    fn odd_leaf_is_promoted_not_duplicated(data in leaves(40)) {
        prop_assume!(data.len() % 2 == 1 && data.len() > 1);
        let k = Algorithm::Sha3_256;
        let config = EngineConfig::default();

        let digests = multiple_hashes(k, &data, &config);
        let mut padded = digests.clone();
        padded.push(digests[digests.len() - 1]);

        let odd = FixedDigestCollection::from_digests(&digests).unwrap();
        let even = FixedDigestCollection::from_digests(&padded).unwrap();
        prop_assert_ne!(
            merkle_root(k, Branching::Binary, &odd, &config).unwrap(),
            merkle_root(k, Branching::Binary, &even, &config).unwrap()
        );
    }

    #[test]
    fn quick_and_ordered_unique_agree_as_sets(picks in prop::collection::vec(0usize..12, 0..60)) {
        let pool = multiple_hashes(Algorithm::Keccak256, &(0u8..12).map(|i| vec![i]).collect::<Vec<_>>(), &EngineConfig::default());
        let chosen: Vec<_> = picks.iter().map(|&i| pool[i]).collect();
        let digests = FixedDigestCollection::from_digests(&chosen).unwrap();

        let ordered = unique_hash256(&digests, &EngineConfig::default()).unwrap();
        let quick = quick_unique_hash256(&digests).unwrap();

        let ordered_set: BTreeSet<&[u8]> = ordered.iter_records().collect();
        let quick_set: BTreeSet<&[u8]> = quick.iter_records().collect();
        prop_assert_eq!(ordered.len(), quick.len());
        prop_assert_eq!(ordered_set, quick_set);

        let listed: Vec<&[u8]> = ordered.iter_records().collect();
        prop_assert!(listed.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn gather_sorted_yields_ascending_bytes(data in records()) {
        let sorted = gather(&data, &sort(&data, &EngineConfig::default())).unwrap();
        prop_assert_eq!(sorted.len(), data.len());
        let listed: Vec<&[u8]> = sorted.iter_records().collect();
        prop_assert!(listed.windows(2).all(|w| w[0] <= w[1]));
    }
}
