// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Request dispatch for the embedded engine.
//!
//! Routes are registered after the listener is already accepting, so the
//! table is shared behind an `Arc` and mutated through `&self`. A request is
//! served in this order:
//!
//! 1. before filters matching the path, in registration order
//! 2. the matched GET route, or 404
//! 3. exception mapping for an error raised by 1 or 2
//! 4. the error handler keyed by the resulting status
//! 5. after filters matching the path, in registration order

use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, Response, StatusCode},
};
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use futures_util::stream;
use verbench_core::context::{Context, ErrorCategory, ExceptionHandler, Handler, HandlerError};

/// Filter path matching every request.
pub const ANY_PATH: &str = "*";

/// Slice size for streamed bodies.
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

const NOT_FOUND_BODY: &str = "Not Found";
const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

struct Filter {
    path: String,
    handler: Handler,
}

impl Filter {
    fn matches(&self, path: &str) -> bool {
        self.path == ANY_PATH || self.path == path
    }
}

/// Runtime-registered routes, filters and handlers of one server.
#[derive(Default)]
pub struct RouteTable {
    routes: DashMap<String, Handler>,
    before: RwLock<Vec<Filter>>,
    after: RwLock<Vec<Filter>>,
    exceptions: RwLock<Vec<(ErrorCategory, ExceptionHandler)>>,
    errors: DashMap<u16, Handler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a GET route. Returns false if the path is already taken.
    pub fn add_route(&self, path: &str, handler: Handler) -> bool {
        match self.routes.entry(path.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(handler);
                true
            }
        }
    }

    pub fn add_before(&self, path: &str, handler: Handler) {
        push_filter(&self.before, path, handler);
    }

    pub fn add_after(&self, path: &str, handler: Handler) {
        push_filter(&self.after, path, handler);
    }

    pub fn add_exception(&self, category: ErrorCategory, handler: ExceptionHandler) {
        let mut exceptions = self.exceptions.write().unwrap_or_else(|e| e.into_inner());
        exceptions.push((category, handler));
    }

    /// Register the handler for a response status, replacing any earlier one.
    pub fn add_error(&self, status: u16, handler: Handler) {
        self.errors.insert(status, handler);
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn has_route(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Serve one GET request into a finished context.
    pub fn dispatch(&self, path: &str) -> Context {
        let mut ctx = Context::new(path);

        let outcome = self
            .run_filters(&self.before, &mut ctx)
            .and_then(|()| match self.route(path) {
                Some(handler) => handler(&mut ctx),
                None => {
                    ctx.status(404).result(Bytes::from_static(NOT_FOUND_BODY.as_bytes()));
                    Ok(())
                }
            });

        if let Err(err) = outcome {
            self.map_exception(&err, &mut ctx);
        }

        if let Some(handler) = self.error_handler(ctx.status_code()) {
            if let Err(err) = handler(&mut ctx) {
                tracing::warn!(path, error = %err, "Error handler failed");
            }
        }

        if let Err(err) = self.run_filters(&self.after, &mut ctx) {
            tracing::warn!(path, error = %err, "After filter failed");
        }

        ctx
    }

    fn route(&self, path: &str) -> Option<Handler> {
        self.routes.get(path).map(|entry| entry.value().clone())
    }

    fn error_handler(&self, status: u16) -> Option<Handler> {
        self.errors.get(&status).map(|entry| entry.value().clone())
    }

    fn run_filters(
        &self,
        filters: &RwLock<Vec<Filter>>,
        ctx: &mut Context,
    ) -> Result<(), HandlerError> {
        let matching: Vec<Handler> = {
            let filters = filters.read().unwrap_or_else(|e| e.into_inner());
            filters
                .iter()
                .filter(|f| f.matches(ctx.path()))
                .map(|f| f.handler.clone())
                .collect()
        };
        matching.iter().try_for_each(|handler| handler(ctx))
    }

    fn map_exception(&self, err: &HandlerError, ctx: &mut Context) {
        let handler = {
            let exceptions = self.exceptions.read().unwrap_or_else(|e| e.into_inner());
            exceptions
                .iter()
                .find(|(category, _)| category.handles(err.category))
                .map(|(_, handler)| handler.clone())
        };

        match handler {
            Some(handler) => handler(err, ctx),
            None => {
                tracing::debug!(path = ctx.path(), error = %err, "Unhandled handler error");
                ctx.status(500)
                    .result(Bytes::from_static(INTERNAL_ERROR_BODY.as_bytes()));
            }
        }
    }
}

fn push_filter(filters: &RwLock<Vec<Filter>>, path: &str, handler: Handler) {
    let mut filters = filters.write().unwrap_or_else(|e| e.into_inner());
    filters.push(Filter {
        path: path.to_string(),
        handler,
    });
}

/// Axum fallback serving every request from the table.
pub async fn serve_request(
    State(table): State<Arc<RouteTable>>,
    request: Request<Body>,
) -> Response<Body> {
    if request.method() != Method::GET {
        return plain(StatusCode::METHOD_NOT_ALLOWED, Body::empty());
    }
    let ctx = table.dispatch(request.uri().path());
    into_response(ctx)
}

/// Turn a finished context into an HTTP response.
pub fn into_response(mut ctx: Context) -> Response<Body> {
    let status =
        StatusCode::from_u16(ctx.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = ctx.content_type_value();
    let streamed = ctx.is_streamed();
    let segments = ctx.take_body();

    let body = if streamed {
        let chunks: Vec<Result<Bytes, Infallible>> = segments
            .into_iter()
            .flat_map(|segment| chunked(segment, STREAM_CHUNK_SIZE))
            .map(Ok)
            .collect();
        Body::from_stream(stream::iter(chunks))
    } else {
        Body::from(concat(segments))
    };

    let mut response = plain(status, body);
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn plain(status: StatusCode, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
}

fn concat(mut segments: Vec<Bytes>) -> Bytes {
    match segments.len() {
        0 => Bytes::new(),
        1 => segments.remove(0),
        _ => {
            let total = segments.iter().map(Bytes::len).sum();
            let mut buffer = BytesMut::with_capacity(total);
            for segment in &segments {
                buffer.extend_from_slice(segment);
            }
            buffer.freeze()
        }
    }
}

/// Zero-copy slices of at most `size` bytes.
fn chunked(data: Bytes, size: usize) -> Vec<Bytes> {
    (0..data.len())
        .step_by(size)
        .map(|start| data.slice(start..(start + size).min(data.len())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use verbench_core::context::APPLICATION_OCTET_STREAM;

    fn marker(text: &'static str) -> Handler {
        Arc::new(move |ctx: &mut Context| {
            ctx.write(Bytes::from_static(text.as_bytes()));
            Ok(())
        })
    }

    fn body_of(mut ctx: Context) -> Vec<u8> {
        ctx.take_body().concat()
    }

    #[test]
    fn test_filters_wrap_route() {
        let table = RouteTable::new();
        // Registration order does not change execution order.
        table.add_after("/lifecycle", marker("C"));
        table.add_route("/lifecycle", marker("B"));
        table.add_before("/lifecycle", marker("A"));
        table.add_before("/other", marker("X"));

        let ctx = table.dispatch("/lifecycle");
        assert_eq!(ctx.status_code(), 200);
        assert_eq!(body_of(ctx), b"ABC");
    }

    #[test]
    fn test_wildcard_filter_matches_everything() {
        let table = RouteTable::new();
        table.add_before(ANY_PATH, marker(">"));
        table.add_route("/a", marker("a"));
        assert_eq!(body_of(table.dispatch("/a")), b">a");
    }

    #[test]
    fn test_unknown_path_is_404() {
        let table = RouteTable::new();
        let ctx = table.dispatch("/missing");
        assert_eq!(ctx.status_code(), 404);
    }

    #[test]
    fn test_exception_then_error_handler() {
        let table = RouteTable::new();
        table.add_route(
            "/exception",
            Arc::new(|_ctx: &mut Context| Err(HandlerError::runtime("boom"))),
        );
        table.add_exception(
            ErrorCategory::General,
            Arc::new(|_err: &HandlerError, ctx: &mut Context| {
                ctx.status(500);
            }),
        );
        table.add_error(
            500,
            Arc::new(|ctx: &mut Context| {
                ctx.result(Bytes::from_static(b"Error"));
                Ok(())
            }),
        );

        let ctx = table.dispatch("/exception");
        assert_eq!(ctx.status_code(), 500);
        assert_eq!(body_of(ctx), b"Error");
    }

    #[test]
    fn test_unmatched_category_falls_back_to_500() {
        let table = RouteTable::new();
        table.add_route(
            "/fail",
            Arc::new(|_ctx: &mut Context| Err(HandlerError::runtime("boom"))),
        );
        table.add_exception(
            ErrorCategory::InvalidState,
            Arc::new(|_err: &HandlerError, ctx: &mut Context| {
                ctx.status(409);
            }),
        );

        let ctx = table.dispatch("/fail");
        assert_eq!(ctx.status_code(), 500);
        assert_eq!(body_of(ctx), INTERNAL_ERROR_BODY.as_bytes());
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let table = RouteTable::new();
        assert!(table.add_route("/a", marker("1")));
        assert!(!table.add_route("/a", marker("2")));
        assert_eq!(table.route_count(), 1);
        assert_eq!(body_of(table.dispatch("/a")), b"1");
    }

    #[test]
    fn test_chunked_slices() {
        let data = Bytes::from(vec![0u8; STREAM_CHUNK_SIZE * 2 + 10]);
        let chunks = chunked(data, STREAM_CHUNK_SIZE);
        let sizes: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![STREAM_CHUNK_SIZE, STREAM_CHUNK_SIZE, 10]);
    }

    #[test]
    fn test_streamed_response_headers() {
        let mut ctx = Context::new("/stream");
        ctx.stream(Bytes::from_static(b"zz"));
        let response = into_response(ctx);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], APPLICATION_OCTET_STREAM);
    }
}
