//! Recipe and marketplace API.
//!
//! Every request passes the request guard (security headers, suspicious
//! content logging, per-IP fixed-window rate limit) and, on restricted
//! routes, the role authorizer.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod security;
pub mod store;
pub mod validation;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
