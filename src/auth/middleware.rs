//! Authentication and per-route authorization middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Json,
};

use crate::auth::authorizer::{Decision, RoleAuthorizer};
use crate::auth::principal::Authenticated;
use crate::auth::roles::RequiredRoles;
use crate::auth::token::TokenCodec;
use crate::error::ErrorBody;
use crate::observability::metrics;

/// Verify a bearer token and attach the principal id.
///
/// Requests without a valid token continue unauthenticated; routes that
/// need a principal are refused later by the authorizer.
pub async fn authenticate(
    State(tokens): State<Arc<TokenCodec>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if let Some(value) = header {
        match tokens.verify_header(value) {
            Ok(id) => {
                request.extensions_mut().insert(Authenticated(id));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable bearer token");
            }
        }
    }

    next.run(request).await
}

/// Route-scoped authorization state: the shared authorizer plus this route's roles.
#[derive(Clone)]
pub struct RouteAccess {
    authorizer: RoleAuthorizer,
    required: RequiredRoles,
}

/// Attaches role requirements to routes at registration time.
#[derive(Clone)]
pub struct AccessControl {
    authorizer: RoleAuthorizer,
}

impl AccessControl {
    pub fn new(authorizer: RoleAuthorizer) -> Self {
        Self { authorizer }
    }

    /// Guard `route` so only principals holding one of `required` reach it.
    pub fn restrict<S>(&self, route: MethodRouter<S>, required: RequiredRoles) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let access = RouteAccess {
            authorizer: self.authorizer.clone(),
            required,
        };
        route.route_layer(middleware::from_fn_with_state(access, require_roles))
    }
}

async fn require_roles(
    State(access): State<RouteAccess>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let principal = request
        .extensions()
        .get::<Authenticated>()
        .map(|Authenticated(id)| id.clone());

    match access.authorizer.authorize(&access.required, principal.as_ref()).await {
        Decision::Allow(loaded) => {
            metrics::record_authorization("allow");
            if let Some(loaded) = loaded {
                request.extensions_mut().insert(loaded);
            }
            next.run(request).await
        }
        Decision::Deny(reason) => {
            metrics::record_authorization(reason.label());
            tracing::warn!(
                principal = principal.as_ref().map(|p| p.as_str()).unwrap_or("-"),
                required = %access.required,
                reason = reason.label(),
                path = %request.uri().path(),
                "Authorization denied"
            );
            let status = reason.status();
            (status, Json(ErrorBody::new(status, reason.message()))).into_response()
        }
    }
}
