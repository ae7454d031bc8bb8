//! Version binding contract.
//!
//! One binding exists per supported major version of the library under
//! benchmark. It owns server start/stop and hands out the registration
//! surface of the running server; the surface's shape is unconstrained.

use std::net::SocketAddr;

use crate::error::VerbenchResult;
use crate::surface::TargetSurface;

/// A started target server and its registration surface.
#[derive(Debug)]
pub struct RunningServer {
    pub local_addr: SocketAddr,
    pub surface: TargetSurface,
}

impl RunningServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }
}

/// Per-version adapter over the library under benchmark.
pub trait VersionBinding: Send + Sync {
    /// Version label, e.g. `v5`.
    fn version(&self) -> &str;

    /// Start listening on `port` (0 for ephemeral) and expose the surface.
    fn start_server(&mut self, port: u16) -> VerbenchResult<RunningServer>;

    /// Stop the server and release its listener. Idempotent.
    fn stop_server(&mut self) -> VerbenchResult<()>;
}
