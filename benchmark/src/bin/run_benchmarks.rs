// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI tool to run the catalog against every selected target version and
//! write JSON reports.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context as _};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use verbench_benchmark::{
    markdown_summary, run_version, BenchmarkSettings, JsonReporter, MeasurementHarness, RunMetadata,
    RunPlan, SystemInfo,
};
use verbench_core::config::parse_version_tokens;
use verbench_core::{Config, ConfigLoader, EndpointCatalog, PayloadBuffers};
use verbench_target::{binding_for, known_versions};

#[derive(Parser)]
#[command(name = "run_benchmarks")]
#[command(about = "Run the endpoint catalog against target versions and generate JSON reports")]
struct Args {
    /// Output directory for benchmark data
    #[arg(short, long, default_value = "benchmark-results")]
    output: PathBuf,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target versions, comma or whitespace separated (configured or all known if empty)
    #[arg(long, default_value = "")]
    versions: String,

    /// Benchmark cases to run (all if not specified)
    #[arg(short, long)]
    benchmark: Vec<String>,

    /// Worker threads (one per CPU if not specified)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Warmup duration per case
    #[arg(long)]
    warmup_ms: Option<u64>,

    /// Measurement duration per case
    #[arg(long)]
    measurement_ms: Option<u64>,

    /// Target server port (0 for ephemeral)
    #[arg(short, long)]
    port: Option<u16>,

    /// Run in quick mode (short warmup and measurement)
    #[arg(long)]
    quick: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => ConfigLoader::load_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    let harness = build_harness(&args, &config);
    let versions = select_versions(&args.versions, &config.versions);
    let bindings = versions
        .iter()
        .map(|v| binding_for(v, config.server.trace_requests))
        .collect::<Result<Vec<_>, _>>()?;

    let payloads = PayloadBuffers::shared()?;
    let catalog = EndpointCatalog::build(&payloads)?;
    let cases = catalog.select(&args.benchmark);
    if cases.is_empty() {
        bail!("no benchmark case matches {:?}", args.benchmark);
    }

    println!("Verbench Benchmark Suite");
    println!("========================");
    println!("Output directory: {:?}", args.output);
    println!("Versions: {}", versions.join(", "));
    println!(
        "Threads: {}, warmup: {:?}, measurement: {:?}",
        harness.thread_count(),
        harness.warmup_duration(),
        harness.measurement_duration()
    );
    println!();

    let reporter = JsonReporter::new(&args.output)?;
    let metadata = RunMetadata::new(BenchmarkSettings {
        versions: versions.clone(),
        warmup_ms: harness.warmup_duration().as_millis() as u64,
        measurement_ms: harness.measurement_duration().as_millis() as u64,
        threads: harness.thread_count(),
        result_format: "json".to_string(),
    });
    reporter.save_metadata(&metadata)?;
    tracing::info!(run_id = %metadata.run_id, "Run started");

    let plan = RunPlan {
        catalog: &catalog,
        cases,
        harness,
        client: config.client,
        port: args.port.unwrap_or(config.server.port),
        system_info: SystemInfo::collect(),
    };

    let mut reports = Vec::new();
    let mut failed = Vec::new();
    for binding in bindings {
        let version = binding.version().to_string();
        println!("Running {}...", version);
        match run_version(binding, &plan) {
            Ok(report) => {
                let path = reporter.save(&report)?;
                println!("  ✓ {} results saved to {:?}", version, path);
                reports.push(report);
            }
            Err(e) => {
                tracing::error!(version = %version, error = %e, "Version run failed");
                println!("  ✗ {}: {}", version, e);
                failed.push(version);
            }
        }
    }

    println!();
    print!("{}", markdown_summary(&reports));

    if !failed.is_empty() {
        bail!("benchmark run failed for: {}", failed.join(", "));
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_harness(args: &Args, config: &Config) -> MeasurementHarness {
    let measurement = &config.measurement;
    let (warmup, measure) = if args.quick {
        (Duration::from_millis(200), Duration::from_millis(1_000))
    } else {
        (measurement.warmup, measurement.measurement)
    };

    let mut harness = MeasurementHarness::new()
        .warmup(args.warmup_ms.map(Duration::from_millis).unwrap_or(warmup))
        .measurement(
            args.measurement_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(measure),
        );
    if let Some(threads) = args.threads.or(measurement.threads) {
        harness = harness.threads(threads);
    }
    harness
}

/// Command line tokens, else configured versions, else every known version.
fn select_versions(cli: &str, configured: &[String]) -> Vec<String> {
    let from_cli = parse_version_tokens(cli);
    if !from_cli.is_empty() {
        return from_cli;
    }
    if !configured.is_empty() {
        return configured.to_vec();
    }
    known_versions().into_iter().map(str::to_string).collect()
}
