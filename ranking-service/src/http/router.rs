use axum::extract::Request;
use axum::http::{header, HeaderName, Method};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers;
use crate::service::RankingService;

/// Distributed-tracing headers that browsers must be allowed to send cross-origin.
pub const TRACE_REQUEST_HEADERS: [&str; 7] = [
    "x-datadog-trace-id",
    "x-datadog-parent-id",
    "x-datadog-origin",
    "x-datadog-sampling-priority",
    "traceparent",
    "tracestate",
    "b3",
];

/// Tracing headers exposed back to browser scripts.
pub const TRACE_EXPOSED_HEADERS: [&str; 4] = [
    "x-datadog-trace-id",
    "x-datadog-parent-id",
    "traceparent",
    "tracestate",
];

#[derive(Clone)]
pub struct AppState {
    pub rankings: Arc<RankingService>,
    pub service_name: Arc<str>,
}

impl AppState {
    pub fn new(rankings: RankingService, service_name: impl Into<Arc<str>>) -> Self {
        Self {
            rankings: Arc::new(rankings),
            service_name: service_name.into(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/rankings/top", get(handlers::top_rankings))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(cors_layer())
}

pub fn cors_layer() -> CorsLayer {
    let mut allowed = vec![header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION];
    allowed.extend(TRACE_REQUEST_HEADERS.map(HeaderName::from_static));

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(allowed)
        .expose_headers(TRACE_EXPOSED_HEADERS.map(HeaderName::from_static))
        .max_age(Duration::from_secs(3600))
}

fn make_request_span(request: &Request) -> Span {
    let header_value = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned()
    };

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        traceparent = %header_value("traceparent"),
        dd_trace_id = %header_value("x-datadog-trace-id"),
    )
}
