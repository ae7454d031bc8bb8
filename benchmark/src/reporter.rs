// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! JSON report generation for benchmark results.
//!
//! Layout of the output directory:
//!
//! ```text
//! <output>/run-metadata.json
//! <output>/results/<target-version>.json
//! ```

use crate::metrics::{BenchmarkReport, RunMetadata};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the run metadata document.
pub const RUN_METADATA_FILE: &str = "run-metadata.json";

/// Directory holding per-version result files.
pub const RESULTS_DIR: &str = "results";

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Report IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid target version for a file name: {0:?}")]
    InvalidVersion(String),
}

/// JSON reporter for benchmark results.
pub struct JsonReporter {
    /// Output directory for benchmark data
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a new JSON reporter with the specified output directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(output_dir.join(RESULTS_DIR))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save a report as `results/<target-version>.json`, replacing any earlier one.
    ///
    /// Returns the path to the written file.
    pub fn save(&self, report: &BenchmarkReport) -> Result<PathBuf, ReporterError> {
        let version = &report.target_version;
        let valid = !version.is_empty()
            && version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid {
            return Err(ReporterError::InvalidVersion(version.clone()));
        }

        let filepath = self
            .output_dir
            .join(RESULTS_DIR)
            .join(format!("{version}.json"));
        write_json(&filepath, report)?;
        Ok(filepath)
    }

    /// Save the run metadata document.
    pub fn save_metadata(&self, metadata: &RunMetadata) -> Result<PathBuf, ReporterError> {
        let filepath = self.output_dir.join(RUN_METADATA_FILE);
        write_json(&filepath, metadata)?;
        Ok(filepath)
    }

    /// List all existing result files, sorted by name.
    pub fn list_reports(&self) -> Result<Vec<PathBuf>, ReporterError> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(self.output_dir.join(RESULTS_DIR))? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                reports.push(path);
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Load an existing benchmark report from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<BenchmarkReport, ReporterError> {
        read_json(path.as_ref())
    }

    /// Load the run metadata document.
    pub fn load_metadata(&self) -> Result<RunMetadata, ReporterError> {
        read_json(&self.output_dir.join(RUN_METADATA_FILE))
    }
}

/// Markdown table of every result: version, benchmark, ops/s and failures.
pub fn markdown_summary(reports: &[BenchmarkReport]) -> String {
    let mut out = String::new();
    out.push_str("## Benchmark summary\n\n");
    out.push_str("| Version | Benchmark | Throughput | Failures |\n");
    out.push_str("|---|---|---:|---:|\n");
    for report in reports {
        for result in &report.results {
            out.push_str(&format!(
                "| {} | {} | {:.3} ops/s | {} |\n",
                report.target_version,
                result.name,
                result.throughput.ops_per_sec,
                result.throughput.failed_operations
            ));
        }
    }
    out
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReporterError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReporterError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{BenchmarkResult, BenchmarkSettings, SystemInfo, ThroughputMetrics};
    use tempfile::TempDir;

    fn report(version: &str) -> BenchmarkReport {
        let mut report = BenchmarkReport::with_system_info(version, SystemInfo::collect());
        report.add_result(BenchmarkResult::new(
            "hello",
            version,
            2,
            ThroughputMetrics::calculate(100, 0, 1900, 1_000_000_000),
        ));
        report
    }

    #[test]
    fn test_reporter_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();

        let path = reporter.save(&report("v5")).unwrap();
        assert!(path.exists());
        assert!(path.ends_with("results/v5.json"));

        let loaded = JsonReporter::load(&path).unwrap();
        assert_eq!(loaded.target_version, "v5");
        assert_eq!(loaded.results.len(), 1);
        assert_eq!(loaded.results[0].name, "hello");
    }

    #[test]
    fn test_list_reports() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();

        reporter.save(&report("v5")).unwrap();
        reporter.save(&report("v3")).unwrap();
        // Same version replaces the earlier file.
        reporter.save(&report("v5")).unwrap();

        let names: Vec<String> = reporter
            .list_reports()
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["v3.json", "v5.json"]);
    }

    #[test]
    fn test_invalid_version_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();
        assert!(matches!(
            reporter.save(&report("../escape")),
            Err(ReporterError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_markdown_summary() {
        let summary = markdown_summary(&[report("v4"), report("v5")]);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "## Benchmark summary");
        assert_eq!(lines[2], "| Version | Benchmark | Throughput | Failures |");
        assert_eq!(lines[4], "| v4 | hello | 100.000 ops/s | 0 |");
        assert_eq!(lines[5], "| v5 | hello | 100.000 ops/s | 0 |");
    }

    #[test]
    fn test_metadata_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();
        let metadata = RunMetadata::with_lookup(
            BenchmarkSettings {
                versions: vec!["v5".to_string()],
                warmup_ms: 0,
                measurement_ms: 100,
                threads: 1,
                result_format: "json".to_string(),
            },
            |_| None,
        );

        let path = reporter.save_metadata(&metadata).unwrap();
        assert!(path.ends_with(RUN_METADATA_FILE));
        assert_eq!(reporter.load_metadata().unwrap(), metadata);
    }
}
