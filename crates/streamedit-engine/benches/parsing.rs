use criterion::{Criterion, criterion_group, criterion_main};
use relative_path::RelativePath;
use streamedit_engine::{
    BlockPolicy, Document, SessionRegistry, StreamDriver, Workspace, parse_diff_blocks,
};
mod common;

/// Re-parsing the accumulated text on every chunk is quadratic in stream
/// length; this tracks what that costs for realistic diff sizes.
fn bench_reparse_growing_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    group.sample_size(10);

    let path = RelativePath::new("bench.rs");
    for blocks in [1, 10, 50] {
        let diff = common::generate_diff(blocks, 1);
        let chunks = common::chunk(&diff, 16);

        group.bench_function(format!("reparse_{blocks}_blocks"), |b| {
            b.iter(|| {
                let mut raw = String::new();
                for chunk in &chunks {
                    raw.push_str(chunk);
                    let parsed = parse_diff_blocks(std::hint::black_box(&raw), path);
                    std::hint::black_box(parsed);
                }
            });
        });
    }

    group.finish();
}

fn bench_drive_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver");
    group.sample_size(10);

    let source = common::generate_source(200);
    let diff = common::generate_diff(200, 20);
    let chunks = common::chunk(&diff, 16);
    let root = std::env::temp_dir();

    group.bench_function("stream_10_blocks_in_memory", |b| {
        b.iter(|| {
            let mut workspace = Workspace::new(&root);
            workspace.insert("bench.rs", Document::from(source.as_str()));
            let mut registry = SessionRegistry::new();
            let mut driver = StreamDriver::new(
                &mut registry,
                &mut workspace,
                "bench.rs",
                BlockPolicy::Sequential,
            );
            for chunk in &chunks {
                driver.push_chunk(chunk).unwrap();
            }
            std::hint::black_box(driver.streaming_ranges());
            driver.abort();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_reparse_growing_stream, bench_drive_stream);
criterion_main!(benches);
