//! Benchmarks for bulk digesting, sorting and Merkle reduction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mhasher_core::{
    checksum, merkle_root, multiple_hashes, sort, unique_sort, Algorithm, Branching, EngineConfig,
    FixedDigestCollection, RecordCollection,
};

fn synthetic_records(count: usize) -> RecordCollection<'static> {
    RecordCollection::from_records((0..count).map(|i| format!("record-{:08}", (i * 7919) % count)))
}

fn bench_multiple_hashes(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest");
    for count in [1_000usize, 100_000] {
        let records = synthetic_records(count);
        group.throughput(Throughput::Bytes(records.as_bytes().len() as u64));
        for algorithm in Algorithm::ALL {
            group.bench_with_input(BenchmarkId::new(algorithm.name(), count), &records, |b, records| {
                b.iter(|| black_box(multiple_hashes(algorithm, records, &EngineConfig::default())))
            });
        }
    }
    group.finish();
}

fn bench_set_algebra(c: &mut Criterion) {
    let mut group = c.benchmark_group("setops");
    let records = synthetic_records(100_000);
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("sort", |b| {
        b.iter(|| black_box(sort(&records, &EngineConfig::default())))
    });
    group.bench_function("sort_sequential", |b| {
        b.iter(|| black_box(sort(&records, &EngineConfig::sequential())))
    });
    group.bench_function("unique_sort", |b| {
        b.iter(|| black_box(unique_sort(&records, &EngineConfig::default())))
    });

    group.finish();
}

fn bench_merkle(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle");
    let records = synthetic_records(65_536);
    let config = EngineConfig::default();
    let digests = multiple_hashes(Algorithm::Keccak256, &records, &config);
    let leaves = match FixedDigestCollection::from_digests(&digests) {
        Ok(leaves) => leaves,
        Err(e) => panic!("leaf packing failed: {}", e),
    };
    group.throughput(Throughput::Elements(leaves.len() as u64));

    for branching in [Branching::Binary, Branching::Sexdec] {
        group.bench_function(format!("root_{:?}", branching).to_lowercase(), |b| {
            b.iter(|| black_box(merkle_root(Algorithm::Keccak256, branching, &leaves, &config)))
        });
    }
    group.bench_function("checksum", |b| {
        b.iter(|| black_box(checksum(Algorithm::Keccak256, &records, &config)))
    });

    group.finish();
}

criterion_group!(benches, bench_multiple_hashes, bench_set_algebra, bench_merkle);
criterion_main!(benches);
