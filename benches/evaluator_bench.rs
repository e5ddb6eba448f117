//! Criterion benchmarks for the treeglom evaluator.
//!
//! Measures raw evaluation cost over pre-built Values and pre-compiled
//! Specs: no JSON parsing, no serialization.
//!
//! Run:
//!   cargo bench
//!   cargo bench -- deep_path   # one group

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use indexmap::IndexMap;
use treeglom::{glom, parse, IterMode, Spec, Value};

// ── Data builders ─────────────────────────────────────────────────────────────

/// Nested object `depth` levels deep: {"k": {"k": ... {"k": leaf}}}.
fn deep_obj(depth: usize, leaf: Value) -> Value {
    let mut v = leaf;
    for _ in 0..depth {
        let mut m = IndexMap::new();
        m.insert("k".to_string(), v);
        v = Value::object(m);
    }
    v
}

/// Wide tree of `n` branches with the needle buried in the last one.
fn haystack(n: usize) -> Value {
    let mut root = IndexMap::new();
    for i in 0..n {
        let mut branch = IndexMap::new();
        branch.insert("id".to_string(), Value::from(i));
        branch.insert("payload".to_string(), deep_obj(4, Value::from(i as f64)));
        if i == n - 1 {
            branch.insert("needle".to_string(), Value::from("found"));
        }
        root.insert(format!("branch{}", i), Value::object(branch));
    }
    Value::object(root)
}

/// Mapping of `n` entries, for the entries→iterate→merge pipeline.
fn mapping(n: usize) -> Value {
    let mut m = IndexMap::new();
    for i in 0..n {
        m.insert(format!("key{}", i), Value::from(i as f64));
    }
    Value::object(m)
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_deep_path(c: &mut Criterion) {
    let data = deep_obj(16, Value::from(1.0));
    let expr = vec!["k"; 16].join(".");
    let spec = parse(&expr).unwrap();

    c.bench_function("deep_path/compiled", |b| {
        b.iter(|| glom(black_box(&data), black_box(&spec)).unwrap())
    });

    c.bench_function("deep_path/parse_and_eval", |b| {
        b.iter(|| {
            let spec = parse(black_box(&expr)).unwrap();
            glom(black_box(&data), &spec).unwrap()
        })
    });
}

fn bench_recursive_search(c: &mut Criterion) {
    let data = haystack(100);
    let first = Spec::search("needle");
    let all = Spec::search_all("id");

    c.bench_function("recursive_search/first_match_late", |b| {
        b.iter(|| glom(black_box(&data), black_box(&first)).unwrap())
    });

    c.bench_function("recursive_search/collect_all", |b| {
        b.iter(|| glom(black_box(&data), black_box(&all)).unwrap())
    });
}

fn bench_entries_merge(c: &mut Criterion) {
    let data = mapping(100);
    let spec = Spec::seq([
        Spec::entries(),
        Spec::iterate_with(
            Spec::object([(Spec::index(0), Spec::index(1))]),
            IterMode::All,
        ),
        Spec::merge(),
    ]);

    c.bench_function("entries_merge/identity_pipeline", |b| {
        b.iter(|| glom(black_box(&data), black_box(&spec)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_deep_path,
    bench_recursive_search,
    bench_entries_merge
);
criterion_main!(benches);
