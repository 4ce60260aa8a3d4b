//! Security response headers.
//!
//! # Responsibilities
//! - Add content-type sniffing, framing, XSS, referrer and CSP headers
//! - Apply them to every response, including guard rejections
//!
//! # Design Decisions
//! - Headers override anything a handler set
//! - Layered outside the request guard so 429s carry them too

use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::schema::DEFAULT_CONTENT_SECURITY_POLICY;
use crate::config::SecurityConfig;

/// The fixed header set, with the configured CSP.
pub fn security_headers(config: &SecurityConfig) -> Vec<(HeaderName, HeaderValue)> {
    let csp = HeaderValue::from_str(&config.content_security_policy).unwrap_or_else(|_| {
        tracing::error!("Invalid content_security_policy, using default");
        HeaderValue::from_static(DEFAULT_CONTENT_SECURITY_POLICY)
    });

    vec![
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
        (header::CONTENT_SECURITY_POLICY, csp),
    ]
}

/// Wrap `router` so every response carries the security headers.
pub fn apply_security_headers<S>(router: Router<S>, config: &SecurityConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if !config.enable_headers {
        return router;
    }
    security_headers(config)
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(name, value))
        })
}
