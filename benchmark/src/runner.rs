// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Per-version benchmark run.
//!
//! Starts one session per target version, checks the catalog actually
//! behaves before measuring anything, then measures every selected case
//! under the harness and collects the results into one report.

use verbench_core::catalog::{ERROR_BODY, EXCEPTION_PATH, HELLO_PATH, LIFECYCLE_PATH};
use verbench_core::payload::{HELLO_BODY, SIZE_1MB};
use verbench_core::{
    BenchmarkCase, BenchmarkSession, ClientSettings, EndpointCatalog, LoadError, VerbenchError,
    VerbenchResult, VersionBinding,
};

use crate::harness::MeasurementHarness;
use crate::metrics::{BenchmarkReport, BenchmarkResult, SystemInfo, ThroughputMetrics};

/// Expected (path, status, body) of the fixed sanity requests.
const SANITY_CHECKS: [(&str, u16, &str); 3] = [
    (HELLO_PATH, 200, HELLO_BODY),
    (LIFECYCLE_PATH, 200, "ABC"),
    (EXCEPTION_PATH, 500, ERROR_BODY),
];

/// Everything a version run needs besides the binding.
pub struct RunPlan<'a> {
    pub catalog: &'a EndpointCatalog,
    pub cases: Vec<&'a BenchmarkCase>,
    pub harness: MeasurementHarness,
    pub client: ClientSettings,
    pub port: u16,
    pub system_info: SystemInfo,
}

/// Measure every planned case against one binding.
pub fn run_version(
    binding: Box<dyn VersionBinding>,
    plan: &RunPlan<'_>,
) -> VerbenchResult<BenchmarkReport> {
    let version = binding.version().to_string();
    let mut session = BenchmarkSession::setup(binding, plan.catalog, plan.port, plan.client)?;

    let measured = sanity_check(&session).and_then(|()| {
        let mut report = BenchmarkReport::with_system_info(&version, plan.system_info.clone());
        for case in &plan.cases {
            report.add_result(measure_case(&session, &plan.harness, case));
        }
        Ok(report)
    });

    let torn_down = session.teardown();
    let report = measured?;
    torn_down?;
    Ok(report)
}

/// Fail fast if the registered catalog does not serve what it should.
pub fn sanity_check(session: &BenchmarkSession) -> VerbenchResult<()> {
    for (path, status, body) in SANITY_CHECKS {
        let response = session.fetch(path)?;
        if response.status != status || response.text() != body {
            return Err(unexpected(
                session.url(path),
                format!(
                    "expected {status} {body:?}, got {} {:?}",
                    response.status,
                    response.text()
                ),
            ));
        }
    }

    let large = session.fetch("/payload/1mb")?;
    if large.body.len() != SIZE_1MB {
        return Err(unexpected(
            session.url("/payload/1mb"),
            format!("expected {SIZE_1MB} bytes, got {}", large.body.len()),
        ));
    }

    tracing::info!(version = session.version(), "Sanity checks passed");
    Ok(())
}

fn unexpected(url: String, reason: String) -> VerbenchError {
    VerbenchError::Load(LoadError::Unexpected { url, reason })
}

fn measure_case(
    session: &BenchmarkSession,
    harness: &MeasurementHarness,
    case: &BenchmarkCase,
) -> BenchmarkResult {
    tracing::info!(
        version = session.version(),
        case = %case.name,
        threads = harness.thread_count(),
        "Measuring"
    );

    let outcome = harness.run(|| session.run_case(case));
    let throughput = ThroughputMetrics::from_outcome(&outcome);

    if outcome.failures > 0 {
        tracing::warn!(
            version = session.version(),
            case = %case.name,
            failures = outcome.failures,
            first = outcome.first_failure.as_deref().unwrap_or_default(),
            "Case finished with failed requests"
        );
    }
    tracing::info!(
        version = session.version(),
        case = %case.name,
        ops_per_sec = throughput.ops_per_sec,
        "Case measured"
    );

    let mut result = BenchmarkResult::new(
        &case.name,
        session.version(),
        harness.thread_count(),
        throughput,
    )
    .with_metadata("paths", &case.paths);
    if let Some(first) = outcome.first_failure {
        result = result.with_metadata("first_failure", first);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use verbench_core::PayloadBuffers;
    use verbench_target::binding_for;

    #[test]
    fn test_run_version_measures_selected_cases() {
        let catalog = EndpointCatalog::build(&PayloadBuffers::shared().unwrap()).unwrap();
        let plan = RunPlan {
            catalog: &catalog,
            cases: catalog.select(&["hello".to_string(), "routes100".to_string()]),
            harness: MeasurementHarness::new()
                .threads(2)
                .warmup(Duration::from_millis(20))
                .measurement(Duration::from_millis(100)),
            client: ClientSettings::default(),
            port: 0,
            system_info: SystemInfo::collect(),
        };

        let report = run_version(binding_for("v4", false).unwrap(), &plan).unwrap();
        assert_eq!(report.target_version, "v4");
        let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["hello", "routes100"]);
        for result in &report.results {
            assert!(result.throughput.total_operations > 0, "{}", result.name);
            assert_eq!(result.throughput.failed_operations, 0, "{}", result.name);
            assert_eq!(result.threads, 2);
        }
    }
}
