// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Verbench Benchmarking Framework
//!
//! Measures request throughput of one fixed endpoint catalog against several
//! major versions of the target engine, so results stay comparable across
//! versions.
//!
//! # Benchmark Cases
//!
//! - **hello**: plain text, lifecycle filters and exception mapping in one cycle
//! - **payload / json / stream**: empty, 100KB and 1MB bodies
//! - **routesN**: last route of a group of N registered routes
//!
//! # Data Output
//!
//! Each version writes `results/<version>.json`; the run writes
//! `run-metadata.json` next to them.

pub mod harness;
pub mod metrics;
pub mod reporter;
pub mod runner;

pub use harness::{MeasurementHarness, RunOutcome};
pub use metrics::{
    BenchmarkReport, BenchmarkResult, BenchmarkSettings, RunMetadata, SystemInfo,
    ThroughputMetrics,
};
pub use reporter::{markdown_summary, JsonReporter, ReporterError};
pub use runner::{run_version, sanity_check, RunPlan};
