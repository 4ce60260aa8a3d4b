//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges, addresses and
//! seed data. All errors are collected rather than stopping at the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::auth::RoleCode;
use crate::config::schema::{AppConfig, PLACEHOLDER_JWT_SECRET};
use crate::security::rate_limit::MAX_WINDOW_SECS;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
    } else if config.rate_limit.window_secs > MAX_WINDOW_SECS {
        errors.push(ValidationError::new(
            "rate_limit.window_secs",
            format!("must be at most {MAX_WINDOW_SECS}"),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }
    if HeaderValue::from_str(&config.security.content_security_policy).is_err() {
        errors.push(ValidationError::new(
            "security.content_security_policy",
            "is not a valid header value",
        ));
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::new("auth.jwt_secret", "must not be empty"));
    } else if config.auth.jwt_secret == PLACEHOLDER_JWT_SECRET && !config.principals.is_empty() {
        errors.push(ValidationError::new(
            "auth.jwt_secret",
            "must be set when principals are configured",
        ));
    }
    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError::new("auth.token_ttl_secs", "must be greater than 0"));
    }
    if config.auth.lookup_timeout_ms == 0 {
        errors.push(ValidationError::new("auth.lookup_timeout_ms", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    let mut seen = HashSet::new();
    for (i, seed) in config.principals.iter().enumerate() {
        if seed.id.is_empty() {
            errors.push(ValidationError::new(format!("principals[{i}].id"), "must not be empty"));
        } else if !seen.insert(seed.id.as_str()) {
            errors.push(ValidationError::new(
                format!("principals[{i}].id"),
                format!("duplicate id '{}'", seed.id),
            ));
        }
        if let Some(role) = &seed.role {
            if role.parse::<RoleCode>().is_err() {
                errors.push(ValidationError::new(
                    format!("principals[{i}].role"),
                    format!("unknown role code '{role}'"),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
