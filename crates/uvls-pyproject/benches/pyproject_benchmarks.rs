//! Benchmarks for manifest scanning.
//!
//! Every save re-runs the extractor and the missing-dependency check, and every
//! link request re-runs the resolver, so all three should stay well under a
//! millisecond for typical manifests.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use uvls_core::LockEntrySet;
use uvls_pyproject::{LinkResolver, LockMatch, check_manifest, extract_dependencies};

/// Small manifest with a project array and a table.
const SMALL: &str = r#"
[project]
name = "small-project"
version = "0.1.0"
dependencies = [
    "requests>=2.28.0",
    "flask>=3.0.0",
    "pydantic>=2.0.0",
]

[dependencies]
sqlalchemy = "2.0.0"
pytest = "7.0.0"
"#;

/// Manifest with `entries` table dependencies and as many array entries.
fn generate_manifest(entries: usize) -> String {
    let mut content = String::from("[project]\nname = \"large\"\ndependencies = [\n");

    for i in 0..entries {
        content.push_str(&format!("    \"array-package-{}>={}.{}\",\n", i, i % 10, i % 20));
    }
    content.push_str("]\n\n[dependencies]\n");

    for i in 0..entries {
        content.push_str(&format!("table-package-{} = \"{}.{}.0\"\n", i, i % 10, i % 20));
    }

    content.push_str("\n[tool.uv]\npackage = false\n");
    content
}

/// Lock file mentioning every other table package.
fn generate_lock(entries: usize) -> String {
    (0..entries)
        .step_by(2)
        .map(|i| format!("[[package]]\nname = \"table-package-{i}\"\nversion = \"1.0.0\"\n\n"))
        .collect()
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_dependencies");

    group.bench_function("small", |b| {
        b.iter(|| extract_dependencies(black_box(SMALL)))
    });

    for size in [50, 200] {
        let manifest = generate_manifest(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &manifest, |b, m| {
            b.iter(|| extract_dependencies(black_box(m)))
        });
    }

    group.finish();
}

fn bench_link_resolution(c: &mut Criterion) {
    let resolver = LinkResolver::default();
    let mut group = c.benchmark_group("manifest_links");

    group.bench_function("small", |b| {
        b.iter(|| resolver.manifest_links(black_box(SMALL)))
    });

    for size in [50, 200] {
        let manifest = generate_manifest(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &manifest, |b, m| {
            b.iter(|| resolver.manifest_links(black_box(m)))
        });
    }

    let lock = generate_lock(400);
    group.bench_function("lock_400", |b| {
        b.iter(|| resolver.lock_links(black_box(&lock)))
    });

    group.finish();
}

fn bench_missing_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("missing_dependencies");
    let manifest = generate_manifest(200);
    let lock = LockEntrySet::new(generate_lock(200));

    for mode in [LockMatch::Substring, LockMatch::Token] {
        group.bench_with_input(
            BenchmarkId::new("200_deps", format!("{mode:?}")),
            &mode,
            |b, &mode| b.iter(|| check_manifest(black_box(&manifest), &lock, mode)),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_extraction,
    bench_link_resolution,
    bench_missing_check
);
criterion_main!(benches);
