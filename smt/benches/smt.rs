#[cfg(feature = "benchmarks")]
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
#[cfg(feature = "benchmarks")]
use smt::{verify_proof, Blake3Hasher, SparseMerkleTree, Store};

#[cfg(feature = "benchmarks")]
fn filled_tree(keys: u32) -> SparseMerkleTree<Blake3Hasher> {
    let mut smt = SparseMerkleTree::new(Store::memory(), Store::memory());
    for i in 0..keys {
        smt.update(&i.to_le_bytes(), &i.to_be_bytes()).unwrap();
    }
    smt
}

#[cfg(feature = "benchmarks")]
fn smt_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("smt");
    for keys in [1_000u32, 10_000] {
        let smt = filled_tree(keys);

        group.bench_with_input(BenchmarkId::new("prove", keys), &smt, |b, smt| {
            let mut i = 0u32;
            b.iter(|| {
                i = (i + 1) % keys;
                smt.prove(&i.to_le_bytes()).unwrap()
            })
        });

        let key = 7u32.to_le_bytes();
        let value = 7u32.to_be_bytes();
        let proof = smt.prove(&key).unwrap();
        group.bench_with_input(BenchmarkId::new("verify", keys), &proof, |b, proof| {
            b.iter(|| verify_proof(proof, smt.root(), &key, &value, smt.spec()))
        });

        group.bench_function(BenchmarkId::new("update", keys), |b| {
            b.iter_batched(
                || filled_tree(keys),
                |mut smt| smt.update(&keys.to_le_bytes(), b"fresh").unwrap(),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

#[cfg(feature = "benchmarks")]
criterion_group!(benches, smt_benchmark);
#[cfg(feature = "benchmarks")]
criterion_main!(benches);

#[cfg(not(feature = "benchmarks"))]
fn main() {}
