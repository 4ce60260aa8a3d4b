//! Request guard middleware.
//!
//! Runs before authentication and handlers:
//! 1. Count the request against the client's fixed window; 429 when over
//! 2. Buffer the body (bounded) so it can be inspected and replayed
//! 3. Scan body, query, URL and user agent for suspicious content (log only)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, Query, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::config::{RateLimitConfig, SecurityConfig};
use crate::error::ErrorBody;
use crate::observability::metrics;
use crate::security::inspect::{ContentInspector, RequestSample};
use crate::security::limits::buffer_body;
use crate::security::rate_limit::{FixedWindowLimiter, RateLimitStatus};

/// Message sent with every 429.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Key used when the peer address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Shared state for [`request_guard`].
#[derive(Clone)]
pub struct GuardState {
    pub limiter: Arc<FixedWindowLimiter>,
    pub inspector: ContentInspector,
    pub rate_limit_enabled: bool,
    pub max_body_size: usize,
}

impl GuardState {
    pub fn new(limiter: Arc<FixedWindowLimiter>, rate_limit: &RateLimitConfig, security: &SecurityConfig) -> Self {
        Self {
            limiter,
            inspector: ContentInspector::new(),
            rate_limit_enabled: rate_limit.enabled,
            max_body_size: security.max_body_size,
        }
    }
}

/// Client key: the peer IP, or `"unknown"` without connection info.
pub fn client_key<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Query parameters re-encoded as JSON so percent-encoded payloads are decoded.
fn query_text<B>(request: &Request<B>) -> String {
    match Query::<Vec<(String, String)>>::try_from_uri(request.uri()) {
        Ok(Query(pairs)) if !pairs.is_empty() => serde_json::to_string(&pairs).unwrap_or_default(),
        Ok(_) => String::new(),
        Err(_) => request.uri().query().unwrap_or_default().to_string(),
    }
}

pub async fn request_guard(
    State(guard): State<GuardState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&request);

    let status = if guard.rate_limit_enabled {
        let status = guard.limiter.check(&client);
        if !status.allowed {
            tracing::warn!(
                client = %client,
                count = status.count,
                limit = status.limit,
                reset_at = %status.reset_at,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited();
            return rate_limited(&status);
        }
        Some(status)
    } else {
        None
    };

    let mut response = inspect_and_run(&guard, &client, request, next).await;
    if let Some(status) = status {
        status.apply_headers(response.headers_mut());
    }
    response
}

/// Buffer and scan the body, then hand the rebuilt request to `next`.
async fn inspect_and_run(guard: &GuardState, client: &str, request: Request<Body>, next: Next) -> Response {
    let query = query_text(&request);

    let (parts, body) = request.into_parts();
    let bytes = match buffer_body(body, guard.max_body_size).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let url = parts.uri.to_string();
    let body_text = String::from_utf8_lossy(&bytes);

    let findings = guard.inspector.inspect(&RequestSample {
        url: &url,
        query: &query,
        body: &body_text,
        user_agent,
    });
    if !findings.is_empty() {
        for pattern in findings.iter().copied() {
            metrics::record_suspicious(pattern);
        }
        tracing::warn!(
            method = %parts.method,
            url = %url,
            client = %client,
            user_agent = %user_agent,
            patterns = ?findings,
            "Suspicious request content"
        );
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// The 429 response, with rate-limit headers.
pub fn rate_limited(status: &RateLimitStatus) -> Response {
    let body = ErrorBody::new(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE);
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    status.apply_headers(response.headers_mut());
    response
}
