//! Request correlation: every request carries an `x-request-id` (client supplied or
//! generated) and is traced inside an `http_request` span tagged with it, so log
//! lines emitted by handlers carry the id.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderName, Request, Response};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::request_id::{MakeRequestId, RequestId};
use tower_http::trace::{DefaultOnRequest, TraceLayer};
use tracing::field::Empty;
use tracing::Span;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn header() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

/// Generates a nanoid for requests arriving without an id.
#[derive(Clone, Copy, Default)]
pub struct NanoRequestId;

impl MakeRequestId for NanoRequestId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let value = nanoid::nanoid!().parse().ok()?;
        Some(RequestId::new(value))
    }
}

/// Id carried by the request; present once `SetRequestIdLayer` has run.
pub fn request_id_of<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

type SpanFn = fn(&Request<Body>) -> Span;
type ResponseFn = fn(&Response<Body>, Duration, &Span);

pub type HttpTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, SpanFn, DefaultOnRequest, ResponseFn>;

fn request_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        request_id = %request_id_of(req),
        method = %req.method(),
        path = %req.uri().path(),
        status = Empty,
        latency_ms = Empty,
    )
}

fn record_response(res: &Response<Body>, latency: Duration, span: &Span) {
    span.record("status", res.status().as_u16());
    span.record("latency_ms", latency.as_millis() as u64);
    tracing::debug!(parent: span, "request finished");
}

/// One span per request; status and latency are filled in when the response leaves.
pub fn trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(request_span as SpanFn)
        .on_response(record_response as ResponseFn)
}
