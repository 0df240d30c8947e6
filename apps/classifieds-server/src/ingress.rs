//! HTTP ingress: service routes plus health/OpenAPI endpoints, wrapped in
//! request-id, tracing, timeout and body-limit middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::field::Empty;

use classifieds::domain::service::Service;
use runtime::ServerConfig;

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

fn request_span(req: &Request<Body>) -> tracing::Span {
    let rid = req
        .headers()
        .get(request_id_header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a");
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        uri = %req.uri().path(),
        request_id = %rid,
        status = Empty,
        latency_ms = Empty
    )
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(classifieds::api::rest::routes::openapi())
}

/// Build the full application router.
pub fn build_router(service: Arc<Service>, cfg: &ServerConfig) -> Router {
    let mut router = classifieds::api::rest::routes::register_routes(Router::new(), service)
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi_json));

    if cfg.timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(cfg.timeout_sec)));
    }

    // Outermost first: the id is set before it is propagated and traced.
    let x_request_id = request_id_header();
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeReqId))
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes)),
    )
}
