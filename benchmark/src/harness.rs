// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Measurement harness for running operations under threaded load.
//!
//! A run has a warmup phase and a measurement phase of fixed wall-clock
//! length. Each of `threads` workers calls the operation back to back until
//! the phase deadline. Only the measurement phase is counted. A failed
//! operation is counted as a failure, never dropped; the first one of each
//! phase is logged.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use verbench_core::MeasurementSettings;

/// Upper bound on worker threads.
pub const MAX_THREADS: usize = 1024;

/// Counters from one phase of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Successful operations
    pub operations: u64,
    /// Failed operations
    pub failures: u64,
    /// Bytes reported by successful operations
    pub bytes: u64,
    /// Wall-clock length of the phase
    pub elapsed: Duration,
    /// Message of the first failure, if any
    pub first_failure: Option<String>,
}

impl RunOutcome {
    pub fn attempted(&self) -> u64 {
        self.operations + self.failures
    }
}

/// A threaded harness for measuring operation throughput.
#[derive(Debug, Clone)]
pub struct MeasurementHarness {
    /// Number of concurrent workers
    threads: usize,
    /// Uncounted phase before measurement
    warmup: Duration,
    /// Counted phase
    measurement: Duration,
}

impl MeasurementHarness {
    /// Create a harness with one worker per CPU, 1s warmup and 5s measurement.
    pub fn new() -> Self {
        Self {
            threads: num_cpus::get().clamp(1, MAX_THREADS),
            warmup: Duration::from_secs(1),
            measurement: Duration::from_secs(5),
        }
    }

    /// Create a harness from validated configuration.
    pub fn from_settings(settings: &MeasurementSettings) -> Self {
        let harness = Self::new()
            .warmup(settings.warmup)
            .measurement(settings.measurement);
        match settings.threads {
            Some(threads) => harness.threads(threads),
            None => harness,
        }
    }

    /// Set the number of worker threads.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.clamp(1, MAX_THREADS);
        self
    }

    /// Set the warmup duration.
    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the measurement duration.
    pub fn measurement(mut self, measurement: Duration) -> Self {
        self.measurement = measurement;
        self
    }

    pub fn thread_count(&self) -> usize {
        self.threads
    }

    pub fn warmup_duration(&self) -> Duration {
        self.warmup
    }

    pub fn measurement_duration(&self) -> Duration {
        self.measurement
    }

    /// Run warmup, then measure.
    ///
    /// The operation returns the bytes it transferred, or an error.
    pub fn run<F, E>(&self, operation: F) -> RunOutcome
    where
        F: Fn() -> Result<u64, E> + Sync,
        E: Display,
    {
        if !self.warmup.is_zero() {
            let warmup = self.phase("warmup", self.warmup, &operation);
            tracing::debug!(
                operations = warmup.operations,
                failures = warmup.failures,
                "Warmup finished"
            );
        }
        self.phase("measurement", self.measurement, &operation)
    }

    /// Run the operation `iterations` times on the calling thread.
    pub fn run_iterations<F, E>(&self, iterations: u64, mut operation: F) -> RunOutcome
    where
        F: FnMut() -> Result<u64, E>,
        E: Display,
    {
        let mut outcome = RunOutcome::default();
        let start = Instant::now();
        for _ in 0..iterations {
            match operation() {
                Ok(bytes) => {
                    outcome.operations += 1;
                    outcome.bytes += bytes;
                }
                Err(e) => {
                    outcome.failures += 1;
                    if outcome.first_failure.is_none() {
                        tracing::warn!(error = %e, "Operation failed");
                        outcome.first_failure = Some(e.to_string());
                    }
                }
            }
        }
        outcome.elapsed = start.elapsed();
        outcome
    }

    fn phase<F, E>(&self, name: &'static str, duration: Duration, operation: &F) -> RunOutcome
    where
        F: Fn() -> Result<u64, E> + Sync,
        E: Display,
    {
        let operations = AtomicU64::new(0);
        let failures = AtomicU64::new(0);
        let bytes = AtomicU64::new(0);
        let first_failure = OnceLock::new();

        let start = Instant::now();
        let deadline = start + duration;

        thread::scope(|scope| {
            for _ in 0..self.threads {
                scope.spawn(|| {
                    let (mut ok, mut failed, mut read) = (0u64, 0u64, 0u64);
                    while Instant::now() < deadline {
                        match operation() {
                            Ok(n) => {
                                ok += 1;
                                read += n;
                            }
                            Err(e) => {
                                failed += 1;
                                if first_failure.set(e.to_string()).is_ok() {
                                    tracing::warn!(phase = name, error = %e, "Operation failed");
                                }
                            }
                        }
                    }
                    operations.fetch_add(ok, Ordering::Relaxed);
                    failures.fetch_add(failed, Ordering::Relaxed);
                    bytes.fetch_add(read, Ordering::Relaxed);
                });
            }
        });

        RunOutcome {
            operations: operations.into_inner(),
            failures: failures.into_inner(),
            bytes: bytes.into_inner(),
            elapsed: start.elapsed(),
            first_failure: first_failure.into_inner(),
        }
    }
}

impl Default for MeasurementHarness {
    fn default() -> Self {
        Self::new()
    }
}
