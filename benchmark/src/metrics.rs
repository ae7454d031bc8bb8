// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Standardized metrics types for benchmark results.
//!
//! This module defines the data structures used to capture and serialize
//! throughput measurements and the metadata needed to compare runs across
//! target versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sysinfo::System;
use uuid::Uuid;

use crate::harness::RunOutcome;

/// Throughput metrics for one measured case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputMetrics {
    /// Successful operations per second
    pub ops_per_sec: f64,
    /// Bytes transferred per second
    pub bytes_per_sec: f64,
    /// Successful operations
    pub total_operations: u64,
    /// Failed operations; these never count towards throughput
    pub failed_operations: u64,
    /// Total bytes transferred
    pub total_bytes: u64,
    /// Duration of the measurement in nanoseconds
    pub duration_ns: u64,
}

impl ThroughputMetrics {
    /// Calculate throughput from counters and duration.
    pub fn calculate(operations: u64, failed: u64, bytes: u64, duration_ns: u64) -> Self {
        let duration_secs = duration_ns as f64 / 1_000_000_000.0;
        let rate = |count: u64| {
            if duration_secs > 0.0 {
                count as f64 / duration_secs
            } else {
                0.0
            }
        };
        Self {
            ops_per_sec: rate(operations),
            bytes_per_sec: rate(bytes),
            total_operations: operations,
            failed_operations: failed,
            total_bytes: bytes,
            duration_ns,
        }
    }

    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        Self::calculate(
            outcome.operations,
            outcome.failures,
            outcome.bytes,
            outcome.elapsed.as_nanos() as u64,
        )
    }
}

/// System information captured at benchmark time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// CPU architecture
    pub architecture: String,
    /// CPU model name
    pub cpu_model: String,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// A single benchmark result with all associated metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Name of the benchmark case
    pub name: String,
    /// Target version the case ran against
    pub target_version: String,
    /// Worker threads used
    pub threads: usize,
    /// Throughput metrics
    pub throughput: ThroughputMetrics,
    /// Additional metadata specific to this benchmark
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BenchmarkResult {
    pub fn new(
        name: impl Into<String>,
        target_version: impl Into<String>,
        threads: usize,
        throughput: ThroughputMetrics,
    ) -> Self {
        Self {
            name: name.into(),
            target_version: target_version.into(),
            threads,
            throughput,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the result. Values that fail to serialize are stored as null.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.metadata.insert(key.into(), value);
        self
    }
}

/// All results for one target version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Suite identifier
    pub benchmark_suite: String,
    /// Framework version
    pub version: String,
    /// Target version measured
    pub target_version: String,
    /// Timestamp when benchmarks were run
    pub timestamp: DateTime<Utc>,
    /// System information
    pub system_info: SystemInfo,
    /// Individual benchmark results
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkReport {
    /// Create an empty report for a target version.
    pub fn new(target_version: impl Into<String>) -> Self {
        Self::with_system_info(target_version, SystemInfo::collect())
    }

    pub fn with_system_info(target_version: impl Into<String>, system_info: SystemInfo) -> Self {
        Self {
            benchmark_suite: "verbench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            target_version: target_version.into(),
            timestamp: Utc::now(),
            system_info,
            results: Vec::new(),
        }
    }

    /// Add a result to the report.
    pub fn add_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    /// Failed operations across every result.
    pub fn total_failures(&self) -> u64 {
        self.results
            .iter()
            .map(|r| r.throughput.failed_operations)
            .sum()
    }
}

/// Settings a run was executed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkSettings {
    pub versions: Vec<String>,
    pub warmup_ms: u64,
    pub measurement_ms: u64,
    pub threads: usize,
    pub result_format: String,
}

/// Metadata describing one invocation of the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub run_id: String,
    pub run_timestamp_utc: DateTime<Utc>,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub workflow: String,
    #[serde(default)]
    pub run_number: String,
    #[serde(default)]
    pub run_attempt: String,
    #[serde(default)]
    pub git_sha: String,
    #[serde(default)]
    pub git_ref: String,
    pub benchmark_settings: BenchmarkSettings,
}

impl RunMetadata {
    /// New metadata with a fresh run id, filling CI fields from the environment.
    pub fn new(settings: BenchmarkSettings) -> Self {
        Self::with_lookup(settings, |key| std::env::var(key).ok())
    }

    pub fn with_lookup(
        settings: BenchmarkSettings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let var = |key: &str| lookup(key).unwrap_or_default();
        Self {
            run_id: Uuid::new_v4().to_string(),
            run_timestamp_utc: Utc::now(),
            repository: var("GITHUB_REPOSITORY"),
            workflow: var("GITHUB_WORKFLOW"),
            run_number: var("GITHUB_RUN_NUMBER"),
            run_attempt: var("GITHUB_RUN_ATTEMPT"),
            git_sha: var("GITHUB_SHA"),
            git_ref: var("GITHUB_REF"),
            benchmark_settings: settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings() -> BenchmarkSettings {
        BenchmarkSettings {
            versions: vec!["v4".to_string(), "v5".to_string()],
            warmup_ms: 1000,
            measurement_ms: 5000,
            threads: 8,
            result_format: "json".to_string(),
        }
    }

    #[test]
    fn test_throughput_calculation() {
        let metrics = ThroughputMetrics::calculate(1000, 3, 1_000_000, 1_000_000_000);
        assert!((metrics.ops_per_sec - 1000.0).abs() < 0.01);
        assert!((metrics.bytes_per_sec - 1_000_000.0).abs() < 0.01);
        assert_eq!(metrics.failed_operations, 3);
    }

    #[test]
    fn test_zero_duration_has_zero_rate() {
        let metrics = ThroughputMetrics::calculate(10, 0, 10, 0);
        assert_eq!(metrics.ops_per_sec, 0.0);
    }

    #[test]
    fn test_from_outcome() {
        let outcome = RunOutcome {
            operations: 500,
            failures: 2,
            bytes: 5000,
            elapsed: Duration::from_millis(500),
            first_failure: Some("timeout".to_string()),
        };
        let metrics = ThroughputMetrics::from_outcome(&outcome);
        assert!((metrics.ops_per_sec - 1000.0).abs() < 0.01);
        assert_eq!(metrics.failed_operations, 2);
        assert_eq!(metrics.total_bytes, 5000);
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.memory_bytes > 0);
    }

    #[test]
    fn test_report_total_failures() {
        let mut report = BenchmarkReport::new("v5");
        report.add_result(BenchmarkResult::new(
            "hello",
            "v5",
            4,
            ThroughputMetrics::calculate(10, 1, 0, 1_000),
        ));
        report.add_result(BenchmarkResult::new(
            "json1mb",
            "v5",
            4,
            ThroughputMetrics::calculate(10, 2, 0, 1_000),
        ));
        assert_eq!(report.total_failures(), 3);
    }

    #[test]
    fn test_run_metadata_serialization() {
        let metadata = RunMetadata::with_lookup(settings(), |key| {
            (key == "GITHUB_SHA").then(|| "abc123".to_string())
        });

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["gitSha"], "abc123");
        assert_eq!(json["repository"], "");
        assert_eq!(json["benchmarkSettings"]["resultFormat"], "json");
        assert_eq!(json["benchmarkSettings"]["versions"][1], "v5");
        assert!(Uuid::parse_str(&metadata.run_id).is_ok());
    }

    #[test]
    fn test_benchmark_result_serialization() {
        let result = BenchmarkResult::new(
            "routes1000",
            "v3",
            2,
            ThroughputMetrics::calculate(100, 0, 900, 1_000_000_000),
        )
        .with_metadata("paths", vec!["/routes1000/r999"]);

        let json = serde_json::to_string_pretty(&result).unwrap();
        assert!(json.contains("routes1000"));
        assert!(json.contains("target_version"));
        assert!(json.contains("/routes1000/r999"));
    }
}
