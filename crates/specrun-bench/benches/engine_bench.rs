//! Engine benchmarks: registry load, partitioning, and run throughput.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use specrun_core::{ExclusionFilter, SpecRegistry, SpecSet, Subject};
use specrun_harness::{ReferenceSubject, TestRunner};

fn spec_json(cases: usize) -> String {
    let mut body = String::from(r#"{"version":"v1","suite":"bench","cases":["#);
    for i in 0..cases {
        if i > 0 {
            body.push(',');
        }
        body.push_str(&format!(
            r#"{{"name":"case_{i:05}","operation":"echo","inputs":{{"value":{i}}},"expect":{{"kind":"exact","value":{i}}}}}"#
        ));
    }
    body.push_str("]}");
    body
}

fn exclusion_lines(cases: usize) -> String {
    // Exclude every fourth case.
    (0..cases)
        .step_by(4)
        .map(|i| format!("case_{i:05} known-bad upstream\n"))
        .collect()
}

fn loaded_registry(cases: usize) -> SpecRegistry {
    let set = SpecSet::from_json(&spec_json(cases)).expect("valid bench spec");
    let subject: Arc<dyn Subject> = Arc::new(ReferenceSubject::new());
    SpecRegistry::from_sets(&[set], &subject).expect("bench load")
}

fn bench_registry_load(c: &mut Criterion) {
    let sizes: &[usize] = &[64, 512, 2048];
    let mut group = c.benchmark_group("registry_load");

    for &size in sizes {
        let json = spec_json(size);
        group.bench_with_input(BenchmarkId::new("from_sets", size), &size, |b, _| {
            b.iter(|| {
                let set = SpecSet::from_json(&json).unwrap();
                let subject: Arc<dyn Subject> = Arc::new(ReferenceSubject::new());
                let registry = SpecRegistry::from_sets(&[set], &subject).unwrap();
                black_box(registry.len());
            });
        });
    }
    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let sizes: &[usize] = &[64, 512, 2048];
    let mut group = c.benchmark_group("partition");

    for &size in sizes {
        let registry = loaded_registry(size);
        let filter = ExclusionFilter::from_lines(&exclusion_lines(size)).unwrap();
        group.bench_with_input(BenchmarkId::new("quartile_excluded", size), &size, |b, _| {
            b.iter(|| {
                let partition = filter.partition(registry.cases().cloned());
                black_box(partition.to_run.len() + partition.to_skip.len());
            });
        });
    }
    group.finish();
}

fn bench_run_sequential(c: &mut Criterion) {
    let sizes: &[usize] = &[64, 512];
    let mut group = c.benchmark_group("run_sequential");

    for &size in sizes {
        let registry = loaded_registry(size);
        let cases: Vec<_> = registry.cases().cloned().collect();
        let runner = TestRunner::new("bench");
        group.bench_with_input(BenchmarkId::new("echo_cases", size), &size, |b, _| {
            b.iter(|| {
                let results = runner.run(&cases);
                black_box(results.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_registry_load,
    bench_partition,
    bench_run_sequential
);
criterion_main!(benches);
