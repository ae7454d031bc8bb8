// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Embedded HTTP server.
//!
//! Owns its own tokio runtime so callers stay synchronous. The router has a
//! single fallback that dispatches through the shared [`RouteTable`], which
//! lets routes be registered while the listener is already up.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use verbench_core::VerbenchError;

use crate::engine::{serve_request, RouteTable};

/// How long `stop` waits for in-flight requests to finish.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server already running on {addr}")]
    AlreadyRunning { addr: SocketAddr },

    #[error("failed to start server runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to bind 127.0.0.1:{port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("server task failed: {message}")]
    Task { message: String },
}

impl From<ServerError> for VerbenchError {
    fn from(err: ServerError) -> Self {
        VerbenchError::Server {
            message: err.to_string(),
        }
    }
}

struct Running {
    runtime: Runtime,
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// A start/stop-able server over one route table.
pub struct EmbeddedServer {
    name: &'static str,
    table: Arc<RouteTable>,
    trace_requests: bool,
    running: Option<Running>,
}

impl EmbeddedServer {
    pub fn new(name: &'static str, trace_requests: bool) -> Self {
        Self {
            name,
            table: Arc::new(RouteTable::new()),
            trace_requests,
            running: None,
        }
    }

    pub fn table(&self) -> Arc<RouteTable> {
        Arc::clone(&self.table)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.addr)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Bind `127.0.0.1:port` (0 for ephemeral) and start serving.
    pub fn start(&mut self, port: u16) -> Result<SocketAddr, ServerError> {
        if let Some(running) = &self.running {
            return Err(ServerError::AlreadyRunning { addr: running.addr });
        }

        // A restarted server starts from an empty table.
        self.table = Arc::new(RouteTable::new());

        let runtime = Builder::new_multi_thread()
            .thread_name(format!("verbench-{}", self.name))
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        let listener = runtime
            .block_on(TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))))
            .map_err(|source| ServerError::Bind { port, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { port, source })?;

        let mut app = Router::new()
            .fallback(serve_request)
            .with_state(Arc::clone(&self.table));
        if self.trace_requests {
            app = app.layer(TraceLayer::new_for_http());
        }

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = runtime.spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
        });

        tracing::info!(server = self.name, %addr, "Target server listening");

        self.running = Some(Running {
            runtime,
            addr,
            shutdown,
            task,
        });
        Ok(addr)
    }

    /// Stop serving and release the listener. Does nothing when not running.
    pub fn stop(&mut self) -> Result<(), ServerError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        let Running {
            runtime,
            addr,
            shutdown,
            task,
        } = running;

        let _ = shutdown.send(());
        let joined =
            runtime.block_on(async move { tokio::time::timeout(SHUTDOWN_GRACE, task).await });
        runtime.shutdown_timeout(Duration::from_secs(1));

        tracing::info!(server = self.name, %addr, "Target server stopped");

        match joined {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(ServerError::Task {
                message: e.to_string(),
            }),
            Ok(Err(e)) => Err(ServerError::Task {
                message: e.to_string(),
            }),
            Err(_) => {
                tracing::warn!(server = self.name, "Graceful shutdown timed out");
                Ok(())
            }
        }
    }
}

impl Drop for EmbeddedServer {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(server = self.name, error = %e, "Stop on drop failed");
        }
    }
}
