// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark session: setup, per-case invocation and teardown.
//!
//! Setup is single-threaded and completes before any measurement. If any
//! scenario fails to register, the server is stopped and setup fails as a
//! whole; a partially registered catalog is never measured.

use crate::binding::VersionBinding;
use crate::catalog::EndpointCatalog;
use crate::client::{BenchmarkHttpClient, DrainedResponse, FetchedResponse};
use crate::config::ClientSettings;
use crate::error::{LoadError, VerbenchError, VerbenchResult};
use crate::registrar::{CapabilityRegistrar, Resolution};
use crate::types::BenchmarkCase;

/// A running, fully registered target plus a ready client.
pub struct BenchmarkSession {
    binding: Box<dyn VersionBinding>,
    base_url: String,
    client: BenchmarkHttpClient,
    resolutions: Vec<Resolution>,
    torn_down: bool,
}

impl BenchmarkSession {
    /// Start the target, register the whole catalog and set up the client.
    pub fn setup(
        mut binding: Box<dyn VersionBinding>,
        catalog: &EndpointCatalog,
        port: u16,
        client_settings: ClientSettings,
    ) -> VerbenchResult<Self> {
        let version = binding.version().to_string();
        tracing::info!(version = %version, port, "Starting target server");

        let running = match binding.start_server(port) {
            Ok(running) => running,
            Err(e) => {
                // Partial start still needs its resources released.
                release_after_failed_setup(binding.as_mut());
                return Err(e);
            }
        };

        let registrar = CapabilityRegistrar::new();
        let registered = registrar.register_all(&running.surface, catalog.scenarios());
        let resolutions = match registered {
            Ok(resolutions) => resolutions,
            Err(e) => {
                tracing::error!(version = %version, error = %e, "Catalog registration failed");
                release_after_failed_setup(binding.as_mut());
                return Err(VerbenchError::Registration(e));
            }
        };

        let mut client = BenchmarkHttpClient::new(client_settings);
        if let Err(e) = client.setup() {
            release_after_failed_setup(binding.as_mut());
            return Err(VerbenchError::Load(e));
        }

        let base_url = running.base_url();
        tracing::info!(version = %version, url = %base_url, "Session ready");

        Ok(Self {
            binding,
            base_url,
            client,
            resolutions,
            torn_down: false,
        })
    }

    pub fn version(&self) -> &str {
        self.binding.version()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    pub fn client(&self) -> &BenchmarkHttpClient {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Drained GET against `path`.
    pub fn load(&self, path: &str) -> Result<DrainedResponse, LoadError> {
        self.client.load(&self.url(path))
    }

    /// GET against `path` keeping the body.
    pub fn fetch(&self, path: &str) -> Result<FetchedResponse, LoadError> {
        self.client.fetch(&self.url(path))
    }

    /// One invocation of a case: every path once, in order. Returns bytes read.
    pub fn run_case(&self, case: &BenchmarkCase) -> Result<u64, LoadError> {
        case.paths.iter().try_fold(0u64, |total, path| {
            self.load(path).map(|response| total + response.bytes_read)
        })
    }

    /// Stop the server and the client. Later calls do nothing.
    pub fn teardown(&mut self) -> VerbenchResult<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;

        self.client.shutdown();
        let result = self.binding.stop_server();
        tracing::info!(version = %self.binding.version(), "Session torn down");
        result
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

/// Stop a server whose session never came up. The setup error is what the
/// caller sees, so a stop failure is only logged.
fn release_after_failed_setup(binding: &mut dyn VersionBinding) {
    if let Err(e) = binding.stop_server() {
        tracing::warn!(
            version = binding.version(),
            error = %e,
            "Stopping server after failed setup failed"
        );
    }
}

impl Drop for BenchmarkSession {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            tracing::warn!(error = %e, "Teardown on drop failed");
        }
    }
}
