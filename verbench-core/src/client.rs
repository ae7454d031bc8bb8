// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Bounded-timeout HTTP load client.
//!
//! Every measured request is a single GET whose response body is read to
//! exhaustion before `load` returns, so timings include the full transfer and
//! not only header arrival. The client owns a small tokio runtime and exposes
//! a synchronous API that is safe to call from many worker threads at once.
//!
//! Timeouts:
//! - connect: TCP connect, per attempt
//! - write: sending the request up to the arrival of response headers
//! - read: idle time between body reads
//!
//! A failed or timed-out load is returned to the caller. Only connection
//! establishment is retried here, and only when enabled.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio::runtime::{Builder, Runtime};

use crate::config::ClientSettings;
use crate::error::LoadError;

/// Outcome of a drained measured request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainedResponse {
    pub status: u16,
    pub bytes_read: u64,
}

/// Response kept in memory, for sanity checks outside measurement.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct ClientState {
    runtime: Runtime,
    http: reqwest::Client,
}

/// HTTP client used by every measured scenario.
pub struct BenchmarkHttpClient {
    settings: ClientSettings,
    state: Option<ClientState>,
}

impl BenchmarkHttpClient {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            state: None,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    /// Build the runtime and connection pool. Calling it twice is a no-op.
    pub fn setup(&mut self) -> Result<(), LoadError> {
        if self.state.is_some() {
            return Ok(());
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("verbench-client")
            .enable_all()
            .build()
            .map_err(LoadError::Runtime)?;

        let http = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .read_timeout(self.settings.read_timeout)
            .build()
            .map_err(LoadError::Build)?;

        tracing::info!(
            connect_timeout_ms = self.settings.connect_timeout.as_millis() as u64,
            read_timeout_ms = self.settings.read_timeout.as_millis() as u64,
            write_timeout_ms = self.settings.write_timeout.as_millis() as u64,
            retry = self.settings.retry_on_connection_failure,
            "HTTP client ready"
        );

        self.state = Some(ClientState { runtime, http });
        Ok(())
    }

    /// Release the pool and runtime. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(state) = self.state.take() {
            drop(state.http);
            state.runtime.shutdown_timeout(Duration::from_secs(1));
            tracing::debug!("HTTP client shut down");
        }
    }

    /// One measured GET, body drained and discarded.
    pub fn load(&self, url: &str) -> Result<DrainedResponse, LoadError> {
        let state = self.state.as_ref().ok_or(LoadError::NotStarted)?;
        state.runtime.block_on(async {
            let response = self.send(&state.http, url).await?;
            let status = response.status().as_u16();

            let mut body = response.bytes_stream();
            let mut bytes_read = 0u64;
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|source| self.transfer_error(url, bytes_read, source))?;
                bytes_read += chunk.len() as u64;
            }

            Ok(DrainedResponse { status, bytes_read })
        })
    }

    /// GET that keeps the body.
    pub fn fetch(&self, url: &str) -> Result<FetchedResponse, LoadError> {
        let state = self.state.as_ref().ok_or(LoadError::NotStarted)?;
        state.runtime.block_on(async {
            let response = self.send(&state.http, url).await?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let mut body = response.bytes_stream();
            let mut buffer = BytesMut::new();
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|source| {
                    self.transfer_error(url, buffer.len() as u64, source)
                })?;
                buffer.extend_from_slice(&chunk);
            }

            Ok(FetchedResponse {
                status,
                content_type,
                body: buffer.freeze(),
            })
        })
    }

    async fn send(
        &self,
        http: &reqwest::Client,
        url: &str,
    ) -> Result<reqwest::Response, LoadError> {
        let attempts = self.max_attempts();
        let write_timeout = self.settings.write_timeout;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match tokio::time::timeout(write_timeout, http.get(url).send()).await {
                Err(_) => {
                    return Err(LoadError::Timeout {
                        url: url.to_string(),
                        timeout_ms: write_timeout.as_millis() as u64,
                    })
                }
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) if e.is_connect() && attempt < attempts => {
                    tracing::debug!(url, attempt, error = %e, "Retrying connection");
                }
                Ok(Err(e)) if e.is_timeout() => {
                    let timeout = if e.is_connect() {
                        self.settings.connect_timeout
                    } else {
                        self.settings.read_timeout
                    };
                    return Err(LoadError::Timeout {
                        url: url.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                Ok(Err(source)) => {
                    return Err(LoadError::Connect {
                        url: url.to_string(),
                        source,
                    })
                }
            }
        }
    }

    /// Connection attempts per request, the first one included.
    fn max_attempts(&self) -> u32 {
        if self.settings.retry_on_connection_failure {
            self.settings.connection_retries.saturating_add(1)
        } else {
            1
        }
    }

    fn transfer_error(&self, url: &str, bytes_read: u64, source: reqwest::Error) -> LoadError {
        if source.is_timeout() {
            LoadError::Timeout {
                url: url.to_string(),
                timeout_ms: self.settings.read_timeout.as_millis() as u64,
            }
        } else {
            LoadError::Transfer {
                url: url.to_string(),
                bytes_read,
                source,
            }
        }
    }
}

impl Drop for BenchmarkHttpClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread::{self, JoinHandle};
    use std::time::Instant;

    #[test]
    fn test_load_before_setup_fails() {
        let client = BenchmarkHttpClient::new(ClientSettings::default());
        assert!(matches!(
            client.load("http://127.0.0.1:1/"),
            Err(LoadError::NotStarted)
        ));
    }

    #[test]
    fn test_setup_and_shutdown_are_idempotent() {
        let mut client = BenchmarkHttpClient::new(ClientSettings::default());
        client.setup().unwrap();
        client.setup().unwrap();
        assert!(client.is_running());
        client.shutdown();
        client.shutdown();
        assert!(!client.is_running());
    }

    #[test]
    fn test_connection_refused_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let settings = ClientSettings {
            connect_timeout: Duration::from_millis(500),
            ..ClientSettings::default()
        };
        let mut client = BenchmarkHttpClient::new(settings);
        client.setup().unwrap();

        let result = client.load(&format!("http://127.0.0.1:{port}/hello"));
        assert!(matches!(
            result,
            Err(LoadError::Connect { .. }) | Err(LoadError::Timeout { .. })
        ));
    }

    /// Accept one connection, optionally answer with `response`, then hold
    /// the socket open until the returned sender is dropped.
    fn stalling_server(
        response: Option<&'static [u8]>,
    ) -> (u16, mpsc::Sender<()>, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (release, held) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            if let Some(response) = response {
                stream.write_all(response).unwrap();
                stream.flush().unwrap();
            }
            let _ = held.recv();
        });

        (port, release, handle)
    }

    fn short_timeouts(write_ms: u64, read_ms: u64) -> ClientSettings {
        ClientSettings {
            connect_timeout: Duration::from_millis(1_000),
            read_timeout: Duration::from_millis(read_ms),
            write_timeout: Duration::from_millis(write_ms),
            retry_on_connection_failure: false,
            connection_retries: 0,
        }
    }

    #[test]
    fn test_missing_response_headers_time_out() {
        let (port, release, handle) = stalling_server(None);
        let mut client = BenchmarkHttpClient::new(short_timeouts(300, 120_000));
        client.setup().unwrap();

        let started = Instant::now();
        let result = client.load(&format!("http://127.0.0.1:{port}/hello"));

        assert!(
            matches!(result, Err(LoadError::Timeout { timeout_ms: 300, .. })),
            "{result:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(10));

        drop(release);
        handle.join().unwrap();
    }

    #[test]
    fn test_stalled_body_times_out() {
        let response: &'static [u8] =
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 100\r\n\r\nabc";
        let (port, release, handle) = stalling_server(Some(response));
        let mut client = BenchmarkHttpClient::new(short_timeouts(120_000, 300));
        client.setup().unwrap();

        let started = Instant::now();
        let result = client.load(&format!("http://127.0.0.1:{port}/payload"));

        assert!(
            matches!(result, Err(LoadError::Timeout { timeout_ms: 300, .. })),
            "{result:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(10));

        drop(release);
        handle.join().unwrap();
    }

    #[test]
    fn test_attempts_saturate() {
        let settings = ClientSettings {
            connection_retries: u32::MAX,
            ..ClientSettings::default()
        };
        assert_eq!(BenchmarkHttpClient::new(settings).max_attempts(), u32::MAX);

        let no_retry = ClientSettings {
            retry_on_connection_failure: false,
            ..settings
        };
        assert_eq!(BenchmarkHttpClient::new(no_retry).max_attempts(), 1);
        assert_eq!(BenchmarkHttpClient::new(ClientSettings::default()).max_attempts(), 2);
    }
}
