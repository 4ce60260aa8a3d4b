//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers and their role requirements
//! - Wire up middleware (tracing, request ID, security headers, timeout,
//!   metrics, request guard, authentication)
//! - Bind server to listener and drain on shutdown
//!
//! # Layer order (outermost first)
//! ```text
//! set request id → trace span → propagate request id → security headers
//!     → timeout → metrics → request guard → authenticate
//!     → [route_layer: require roles] → handler
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{authenticate, AccessControl, RequiredRoles, RoleAuthorizer, RoleCode, TokenCodec};
use crate::config::AppConfig;
use crate::http::handlers::{health, pantry, products, recipes, users};
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::models::{PantryItem, Product, Recipe};
use crate::observability::metrics;
use crate::security::{apply_security_headers, request_guard, Clock, FixedWindowLimiter, GuardState, SystemClock};
use crate::store::{Collection, PrincipalStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub principals: Arc<dyn PrincipalStore>,
    pub recipes: Collection<Recipe>,
    pub products: Collection<Product>,
    pub pantry: Collection<PantryItem>,
}

impl AppState {
    pub fn new(principals: Arc<dyn PrincipalStore>) -> Self {
        Self {
            principals,
            recipes: Collection::new(),
            products: Collection::new(),
            pantry: Collection::new(),
        }
    }
}

/// Any signed-in user.
pub fn members() -> RequiredRoles {
    RequiredRoles::any_of([RoleCode::Admin, RoleCode::Moderator, RoleCode::Client])
}

/// Content moderation.
pub fn staff() -> RequiredRoles {
    RequiredRoles::any_of([RoleCode::Admin, RoleCode::Moderator])
}

pub fn admins() -> RequiredRoles {
    RequiredRoles::any_of([RoleCode::Admin])
}

/// HTTP server for the recipe API.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    limiter: Arc<FixedWindowLimiter>,
    tokens: Arc<TokenCodec>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, principals: Arc<dyn PrincipalStore>) -> Self {
        Self::with_clock(config, principals, Arc::new(SystemClock))
    }

    /// Like [`HttpServer::new`], with the rate limiter reading `clock`.
    pub fn with_clock(config: AppConfig, principals: Arc<dyn PrincipalStore>, clock: Arc<dyn Clock>) -> Self {
        let limiter = Arc::new(FixedWindowLimiter::with_clock(&config.rate_limit, clock));
        let guard = GuardState::new(limiter.clone(), &config.rate_limit, &config.security);
        let tokens = Arc::new(TokenCodec::new(&config.auth));
        let authorizer = RoleAuthorizer::new(
            principals.clone(),
            Duration::from_millis(config.auth.lookup_timeout_ms),
        );
        let access = AccessControl::new(authorizer);
        let state = AppState::new(principals);

        let router = Self::build_router(&config, state, guard, tokens.clone(), &access);
        Self {
            router,
            config,
            limiter,
            tokens,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &AppConfig,
        state: AppState,
        guard: GuardState,
        tokens: Arc<TokenCodec>,
        access: &AccessControl,
    ) -> Router {
        let routes = Router::new()
            .route("/health", get(health::health))
            .route(
                "/recipes",
                get(recipes::list_recipes).merge(access.restrict(post(recipes::create_recipe), members())),
            )
            .route(
                "/recipes/{id}",
                get(recipes::get_recipe).merge(access.restrict(delete(recipes::delete_recipe), staff())),
            )
            .route(
                "/products",
                get(products::list_products).merge(access.restrict(post(products::create_product), admins())),
            )
            .route(
                "/pantry",
                access.restrict(get(pantry::list_pantry).post(pantry::add_pantry_item), members()),
            )
            .route(
                "/pantry/{id}",
                access.restrict(delete(pantry::remove_pantry_item), members()),
            )
            .route(
                "/users",
                post(users::register_user).merge(access.restrict(get(users::list_users), admins())),
            )
            .route("/users/me", access.restrict(get(users::current_user), members()))
            .route("/users/{id}/role", access.restrict(put(users::assign_role), admins()))
            .with_state(state)
            .layer(middleware::from_fn_with_state(tokens, authenticate))
            .layer(middleware::from_fn_with_state(guard, request_guard))
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        apply_security_headers(routes, &config.security)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn limiter(&self) -> &Arc<FixedWindowLimiter> {
        &self.limiter
    }

    pub fn tokens(&self) -> &Arc<TokenCodec> {
        &self.tokens
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit = self.config.rate_limit.max_requests,
            window_secs = self.config.rate_limit.window_secs,
            "HTTP server starting"
        );

        let sweeper = if self.config.rate_limit.enabled && self.config.rate_limit.sweep_interval_secs > 0 {
            Some(self.limiter.clone().spawn_sweeper(
                Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
                shutdown.subscribe(),
            ))
        } else {
            None
        };

        let mut stop = shutdown.subscribe();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        // Serve with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        if let Some(handle) = sweeper {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Rate limit sweeper ended abnormally");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
