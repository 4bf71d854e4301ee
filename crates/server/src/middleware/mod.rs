//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (one span per request)
//! 3. Request ID (assigned inside the span so it is recorded on it)
//! 4. Timeout (bounds hung storage or mail calls)
//! 5. CORS

pub mod request_id;

use std::time::Duration;

use axum::http::{HeaderValue, Method, Request, Response, header};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, MakeSpan, OnResponse, TraceLayer};
use tracing::Span;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

/// CORS for the JSON API.
///
/// With no configured origin any origin is allowed.
#[must_use]
pub fn cors_layer(origin: Option<&HeaderValue>) -> CorsLayer {
    let allow_origin = origin.map_or_else(
        || AllowOrigin::from(Any),
        |o| AllowOrigin::exact(o.clone()),
    );

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

/// Span factory recording method, path, status, latency and request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri().path(),
            request_id = tracing::field::Empty,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    }
}

/// Response hook filling in status and latency on the request span.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordResponse;

impl<B> OnResponse<B> for RecordResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        span.record("status", response.status().as_u16());
        span.record(
            "latency_ms",
            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
        );
        DefaultOnResponse::default().on_response(response, latency, span);
    }
}

/// The configured request tracing layer.
pub type RequestTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    RequestSpan,
    DefaultOnRequest,
    RecordResponse,
>;

/// Request tracing layer.
#[must_use]
pub fn trace_layer() -> RequestTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_response(RecordResponse)
}
