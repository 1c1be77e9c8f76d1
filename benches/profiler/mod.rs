// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Shared criterion configuration for the bench targets.
//!
//! Tunable through `SCRIVEN_BENCH_*` environment variables; each benchmark
//! emits a pprof flamegraph under `target/criterion`.

use std::str::FromStr;
use std::time::Duration;

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};

fn env_or<T: FromStr + Ord>(name: &str, default: T, min: T, max: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

pub fn criterion() -> Criterion {
    Criterion::default()
        .sample_size(env_or("SCRIVEN_BENCH_SAMPLES", 60, 10, 200))
        .warm_up_time(Duration::from_secs(env_or(
            "SCRIVEN_BENCH_WARMUP_SECS",
            3,
            1,
            60,
        )))
        .measurement_time(Duration::from_secs(env_or(
            "SCRIVEN_BENCH_MEASURE_SECS",
            5,
            1,
            120,
        )))
        .with_profiler(PProfProfiler::new(
            env_or("SCRIVEN_PROFILE_HZ", 100, 1, 1000),
            Output::Flamegraph(None),
        ))
}
