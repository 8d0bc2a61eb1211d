//! HTTP middleware

use axum::{
    extract::{ConnectInfo, Request},
    http::{Method, Uri, header},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};

use crate::utils::url::redact_request_target;

/// Request logging middleware
///
/// Logs all incoming requests with timing information
pub async fn request_logging_middleware(
    method: Method,
    uri: Uri,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    // Preview targets embed origin URLs that may carry credentials
    let target = redact_request_target(
        uri.path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path()),
    );

    // Generate request ID for tracing
    let request_id = uuid::Uuid::new_v4().to_string();

    // Absent when the router is driven without a real listener, e.g. in tests
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();

    info!(
        method = %method,
        uri = %target,
        request_id = %request_id,
        remote_addr = %remote_addr,
        user_agent = %user_agent,
        "HTTP request started"
    );

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let duration = start.elapsed();

    if status >= 400 {
        warn!(
            method = %method,
            uri = %target,
            status = status,
            request_id = %request_id,
            duration_ms = duration.as_millis(),
            "HTTP request completed with error"
        );
    } else {
        info!(
            method = %method,
            uri = %target,
            status = status,
            request_id = %request_id,
            duration_ms = duration.as_millis(),
            "HTTP request completed"
        );
    }

    response
}
