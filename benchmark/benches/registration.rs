// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Setup-phase cost benchmarks.
//!
//! Measures building the endpoint catalog and registering all of it through
//! the capability registrar against each target version's surface.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::time::Duration;
use verbench_core::{CapabilityRegistrar, EndpointCatalog, PayloadBuffers};
use verbench_target::{binding_for, known_versions};

fn bench_catalog_build(c: &mut Criterion) {
    let payloads = PayloadBuffers::shared().expect("payloads");

    c.bench_function("catalog_build", |b| {
        b.iter(|| EndpointCatalog::build(&payloads).expect("catalog"));
    });
}

fn bench_register_catalog(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_catalog");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    let payloads = PayloadBuffers::shared().expect("payloads");
    let catalog = EndpointCatalog::build(&payloads).expect("catalog");
    let registrar = CapabilityRegistrar::new();

    for version in known_versions() {
        group.bench_with_input(BenchmarkId::from_parameter(version), &version, |b, &version| {
            b.iter_batched(
                || {
                    // Every iteration needs an empty route table.
                    let mut binding = binding_for(version, false).expect("binding");
                    let running = binding.start_server(0).expect("start");
                    (binding, running)
                },
                |(binding, running)| {
                    let resolutions = registrar
                        .register_all(&running.surface, catalog.scenarios())
                        .expect("register");
                    (binding, resolutions)
                },
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_catalog_build, bench_register_catalog);
criterion_main!(benches);
