// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use scriven::format::markdown::{parse_markdown, serialize_markdown};
use scriven::model::assign_node_ids;

mod fixtures;
mod profiler;

// Benchmark identity (keep stable):
// - Group names in this file: `md.parse`, `md.serialize`, `md.assign_ids`
// - Case IDs (the string after the `/`) must remain stable across refactors so
//   results stay comparable over time (e.g. `small`, `medium`, `large`).
// - If implementations move/deduplicate, update the wiring but do not rename
//   group or case IDs.
fn benches_parse(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("md.parse");

        for case in [fixtures::Case::Small, fixtures::Case::Medium, fixtures::Case::Large] {
            let markdown = fixtures::markdown(case);

            group.throughput(Throughput::Bytes(markdown.len() as u64));
            group.bench_function(case.id(), move |b| {
                b.iter(|| {
                    let root = parse_markdown(black_box(&markdown));
                    black_box(root.node_count())
                })
            });
        }

        group.finish();
    }

    {
        let mut group = c.benchmark_group("md.serialize");

        for case in [fixtures::Case::Small, fixtures::Case::Medium, fixtures::Case::Large] {
            let tree = fixtures::tree(case);

            group.throughput(Throughput::Elements(tree.node_count() as u64));
            group.bench_function(case.id(), move |b| {
                b.iter(|| {
                    let markdown = serialize_markdown(black_box(&tree));
                    black_box(markdown.len())
                })
            });
        }

        group.finish();
    }

    {
        let mut group = c.benchmark_group("md.assign_ids");

        for case in [fixtures::Case::Small, fixtures::Case::Medium, fixtures::Case::Large] {
            let tree = fixtures::tree(case);

            group.throughput(Throughput::Elements(tree.node_count() as u64));
            group.bench_function(case.id(), move |b| {
                b.iter_batched(
                    || tree.clone(),
                    |mut root| {
                        assign_node_ids(&mut root);
                        black_box(root.node_count())
                    },
                    criterion::BatchSize::SmallInput,
                )
            });
        }

        group.finish();
    }
}

criterion_group! {
    name = benches;
    config = profiler::criterion();
    targets = benches_parse
}
criterion_main!(benches);
