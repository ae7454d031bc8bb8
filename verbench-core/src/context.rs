// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Per-request handler context shared by every target binding.
//!
//! Handlers in the catalog only ever talk to a [`Context`]; the serving engine
//! turns the finished context into an HTTP response.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

/// Content type used for plain-text bodies.
pub const TEXT_PLAIN: &str = "text/plain";
/// Content type used for JSON bodies.
pub const APPLICATION_JSON: &str = "application/json";
/// Content type used for raw byte streams.
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Route and lifecycle handler.
pub type Handler = Arc<dyn Fn(&mut Context) -> Result<(), HandlerError> + Send + Sync>;

/// Exception handler, invoked with the error a route raised.
pub type ExceptionHandler = Arc<dyn Fn(&HandlerError, &mut Context) + Send + Sync>;

/// Category of a raised handler error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Catch-all category. A handler registered for it sees every error.
    General,
    Runtime,
    InvalidState,
}

impl ErrorCategory {
    /// Whether a handler registered for `self` handles an error of `thrown`.
    pub fn handles(&self, thrown: ErrorCategory) -> bool {
        *self == ErrorCategory::General || *self == thrown
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::General => write!(f, "general"),
            ErrorCategory::Runtime => write!(f, "runtime"),
            ErrorCategory::InvalidState => write!(f, "invalid-state"),
        }
    }
}

/// Error raised by a handler while serving a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category} error: {message}")]
pub struct HandlerError {
    pub category: ErrorCategory,
    pub message: String,
}

impl HandlerError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Runtime,
            message: message.into(),
        }
    }
}

/// Mutable per-request state.
#[derive(Debug)]
pub struct Context {
    path: String,
    status: u16,
    content_type: &'static str,
    body: Vec<Bytes>,
    streamed: bool,
}

impl Context {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: 200,
            content_type: TEXT_PLAIN,
            body: Vec::new(),
            streamed: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn content_type(&mut self, content_type: &'static str) -> &mut Self {
        self.content_type = content_type;
        self
    }

    pub fn content_type_value(&self) -> &'static str {
        self.content_type
    }

    /// Append to the response body.
    pub fn write(&mut self, chunk: Bytes) -> &mut Self {
        if !chunk.is_empty() {
            self.body.push(chunk);
        }
        self
    }

    /// Replace the response body.
    pub fn result(&mut self, body: Bytes) -> &mut Self {
        self.body.clear();
        self.streamed = false;
        self.write(body)
    }

    /// Replace the response body with a pre-serialized JSON document.
    pub fn json(&mut self, document: Bytes) -> &mut Self {
        self.content_type = APPLICATION_JSON;
        self.result(document)
    }

    /// Replace the response body with a raw byte stream.
    pub fn stream(&mut self, data: Bytes) -> &mut Self {
        self.content_type = APPLICATION_OCTET_STREAM;
        self.result(data);
        self.streamed = true;
        self
    }

    pub fn is_streamed(&self) -> bool {
        self.streamed
    }

    pub fn body_len(&self) -> usize {
        self.body.iter().map(Bytes::len).sum()
    }

    /// Consume the body segments. Single-segment bodies are returned without copying.
    pub fn take_body(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_appends_and_result_replaces() {
        let mut ctx = Context::new("/lifecycle");
        ctx.write(Bytes::from_static(b"A"));
        ctx.write(Bytes::from_static(b"B"));
        assert_eq!(ctx.body_len(), 2);

        ctx.result(Bytes::from_static(b"Error"));
        let body = ctx.take_body();
        assert_eq!(body, vec![Bytes::from_static(b"Error")]);
    }

    #[test]
    fn test_stream_sets_octet_stream() {
        let mut ctx = Context::new("/stream/100kb");
        ctx.stream(Bytes::from_static(b"xyz"));
        assert!(ctx.is_streamed());
        assert_eq!(ctx.content_type_value(), APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn test_general_category_handles_everything() {
        assert!(ErrorCategory::General.handles(ErrorCategory::Runtime));
        assert!(ErrorCategory::Runtime.handles(ErrorCategory::Runtime));
        assert!(!ErrorCategory::InvalidState.handles(ErrorCategory::Runtime));
    }
}
