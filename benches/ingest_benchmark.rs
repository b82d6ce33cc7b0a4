//! Benchmarks for the ingestion hot paths.
//!
//! Run with: cargo bench --bench ingest_benchmark

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dep_ledger::diff::diff_hashes;
use dep_ledger::ledger::{append_scan, RepositoryRecord};
use dep_ledger::model::{canonicalize, Dependency, DependencyHash, Ecosystem};
use dep_ledger::parsers::ParserRegistry;
use std::hint::black_box;
use std::path::Path;

/// Generate `count` distinct dependencies spread over every ecosystem.
fn generate_dependencies(prefix: &str, count: usize) -> Vec<Dependency> {
    let ecosystems = [Ecosystem::Maven, Ecosystem::Npm, Ecosystem::Go, Ecosystem::Python];
    (0..count)
        .map(|i| {
            Dependency::new(
                format!("{prefix}-package-{i}"),
                format!("1.{}.{}", i % 10, i % 100),
                ecosystems[i % ecosystems.len()],
            )
        })
        .collect()
}

fn hashes(prefix: &str, count: usize) -> Vec<DependencyHash> {
    canonicalize(&mut generate_dependencies(prefix, count))
}

fn bench_directory_scan(c: &mut Criterion) {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/repo");
    let registry = ParserRegistry::declared_only();
    c.bench_function("scan_fixture_repo", |b| {
        b.iter(|| black_box(registry.scan_directory(&root, true)))
    });
}

fn bench_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");
    for size in [100, 1000, 5000] {
        let mut deps = generate_dependencies("dep", size);
        // Duplicate a tenth so deduplication has work to do
        deps.extend(deps[..size / 10].to_vec());
        deps.reverse();
        group.bench_with_input(BenchmarkId::from_parameter(size), &deps, |b, deps| {
            b.iter(|| black_box(canonicalize(&mut deps.clone())))
        });
    }
    group.finish();
}

fn bench_hash_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_hashes");
    for size in [1000, 10_000] {
        let old = hashes("dep", size);
        let mut new = old[size / 20..].to_vec();
        new.extend(hashes("new", size / 20));
        new.sort();
        group.bench_with_input(BenchmarkId::from_parameter(size), &(old, new), |b, (old, new)| {
            b.iter(|| black_box(diff_hashes(old, new)))
        });
    }
    group.finish();
}

fn bench_chain_append(c: &mut Criterion) {
    // Alternating dependency sets force a mix of realized and reference entries
    let sets = [hashes("a", 500), hashes("b", 500)];
    c.bench_function("append_200_scans", |b| {
        b.iter(|| {
            let mut record = RepositoryRecord::new("acme/api");
            for i in 0..200 {
                let set = &sets[(i / 3) % 2];
                let _ = black_box(append_scan(&mut record, "refs/heads/main", &format!("sha{i}"), set));
            }
            record
        })
    });
}

criterion_group!(
    benches,
    bench_directory_scan,
    bench_canonicalize,
    bench_hash_diff,
    bench_chain_append
);
criterion_main!(benches);
