//! # Hydration Benchmarks
//!
//! | Shape | What it stresses |
//! |-------|------------------|
//! | wide, passive | walk + placeholder bookkeeping |
//! | wide, startable | join barrier with many interleaved starts |
//! | deep | nested branch creation |
//! | JSON | registry lookups while loading |
//! | teardown | sequential stop over the flat list |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hydrate_engine::{dehydrate, hydrate, ConfigNode, ModuleDescriptor, ModuleRef};
use hydrate_tests::fixtures::{registry, Closable, Delayed, FakeNoStart, TestContext};
use serde_json::json;
use tokio::runtime::Runtime;

const WIDTHS: [usize; 3] = [10, 100, 1_000];

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| panic!("failed to build runtime: {e}"))
}

fn wide<F>(width: usize, node: F) -> ConfigNode<TestContext>
where
    F: Fn(usize) -> ConfigNode<TestContext>,
{
    ConfigNode::map((0..width).map(|i| (format!("m{i}"), node(i))))
}

fn deep(depth: usize) -> ConfigNode<TestContext> {
    (0..depth).fold(
        ModuleDescriptor::new(ModuleRef::module::<FakeNoStart>()).into(),
        |inner, level| ConfigNode::map([(format!("level{level}"), inner)]),
    )
}

// ============================================================================
// HYDRATE
// ============================================================================

fn bench_wide_trees(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("hydrate-wide");
    group.measurement_time(Duration::from_secs(5));

    for width in WIDTHS {
        group.throughput(Throughput::Elements(width as u64));

        let passive = wide(width, |_| {
            ModuleDescriptor::new(ModuleRef::module::<FakeNoStart>()).into()
        });
        group.bench_with_input(BenchmarkId::new("passive", width), &passive, |b, config| {
            b.iter(|| {
                rt.block_on(async {
                    let hydration = hydrate(Arc::new(TestContext::new()), config, None).await;
                    black_box(hydration.map(|h| h.all_objects.len()).ok())
                })
            })
        });

        let startable = wide(width, |i| {
            ModuleDescriptor::new(ModuleRef::module::<Delayed>())
                .setting("value", i)
                .into()
        });
        group.bench_with_input(
            BenchmarkId::new("startable", width),
            &startable,
            |b, config| {
                b.iter(|| {
                    rt.block_on(async {
                        let hydration = hydrate(Arc::new(TestContext::new()), config, None).await;
                        black_box(hydration.map(|h| h.tree.len()).ok())
                    })
                })
            },
        );
    }

    group.finish();
}

fn bench_deep_tree(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("hydrate-deep");

    for depth in [8, 64, 256] {
        let config = deep(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &config, |b, config| {
            b.iter(|| {
                rt.block_on(async {
                    let hydration = hydrate(Arc::new(TestContext::new()), config, None).await;
                    black_box(hydration.is_ok())
                })
            })
        });
    }

    group.finish();
}

// ============================================================================
// LOADING
// ============================================================================

fn bench_json_loading(c: &mut Criterion) {
    let registry = registry().unwrap_or_else(|e| panic!("fixture registry: {e}"));
    let mut group = c.benchmark_group("load-json");

    for width in WIDTHS {
        let document = serde_json::Value::Object(
            (0..width)
                .map(|i| {
                    (
                        format!("m{i}"),
                        json!({ "module": "Delayed", "value": i, "enabled": i % 7 != 0 }),
                    )
                })
                .collect(),
        );
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &document, |b, doc| {
            b.iter(|| black_box(ConfigNode::from_json(doc, &registry).is_ok()))
        });
    }

    group.finish();
}

// ============================================================================
// DEHYDRATE
// ============================================================================

fn bench_teardown(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("dehydrate");

    for width in WIDTHS {
        let config = wide(width, |i| {
            ModuleDescriptor::new(ModuleRef::module::<Closable>())
                .setting("name", format!("c{i}"))
                .into()
        });
        let ctx = Arc::new(TestContext::new());
        let objects = rt
            .block_on(hydrate(ctx.clone(), &config, None))
            .map(|h| h.all_objects)
            .unwrap_or_else(|e| panic!("hydration failed: {e}"));

        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &objects, |b, objects| {
            b.iter(|| rt.block_on(async { black_box(dehydrate(ctx.as_ref(), objects).await.is_ok()) }))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_wide_trees,
    bench_deep_tree,
    bench_json_loading,
    bench_teardown
);
criterion_main!(benches);
