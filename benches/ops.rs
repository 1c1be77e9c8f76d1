// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use scriven::ops::execute_commands;
use scriven::query::{find_node_by_id, search_by_text};

mod fixtures;
mod profiler;

// Benchmark identity (keep stable):
// - Group names in this file: `ops.apply`, `ops.lookup`, `ops.search`
// - Case IDs (the string after the `/`) must remain stable across refactors so
//   results stay comparable over time (e.g. `insert_tail_50`, `medium`).
// - If implementations move/deduplicate, update the wiring but do not rename
//   group or case IDs.
fn benches_ops(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("ops.apply");

        let tree = fixtures::tree(fixtures::Case::Medium);
        for (case_id, batch) in [
            ("insert_tail_50", fixtures::insert_batch(50)),
            ("insert_tail_200", fixtures::insert_batch(200)),
            ("modify_values_50", fixtures::modify_batch(50)),
        ] {
            group.throughput(Throughput::Elements(batch.commands.len() as u64));
            let tree = tree.clone();
            group.bench_function(case_id, move |b| {
                b.iter_batched(
                    || tree.clone(),
                    |mut root| {
                        let report = execute_commands(&mut root, black_box(&batch));
                        black_box(report.applied().wrapping_add(root.node_count()))
                    },
                    BatchSize::SmallInput,
                )
            });
        }

        group.finish();
    }

    {
        let mut group = c.benchmark_group("ops.lookup");

        for case in [fixtures::Case::Small, fixtures::Case::Medium, fixtures::Case::Large] {
            let tree = fixtures::tree(case);
            let nodes = tree.node_count();
            // Deep in pre-order, so lookup walks most of the tree.
            let needle: scriven::model::NodeId =
                format!("node-{}", nodes - 1).parse().expect("node id");

            group.throughput(Throughput::Elements(nodes as u64));
            group.bench_function(case.id(), move |b| {
                b.iter(|| {
                    let found = find_node_by_id(black_box(&tree), black_box(&needle));
                    black_box(found.is_some())
                })
            });
        }

        group.finish();
    }

    {
        let mut group = c.benchmark_group("ops.search");

        for case in [fixtures::Case::Small, fixtures::Case::Medium, fixtures::Case::Large] {
            let tree = fixtures::tree(case);

            group.throughput(Throughput::Elements(tree.node_count() as u64));
            group.bench_function(case.id(), move |b| {
                b.iter(|| {
                    let matches =
                        search_by_text(black_box(&tree), black_box("replica digest"), 10);
                    black_box(matches.len())
                })
            });
        }

        group.finish();
    }
}

criterion_group! {
    name = benches;
    config = profiler::criterion();
    targets = benches_ops
}
criterion_main!(benches);
