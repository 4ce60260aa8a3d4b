//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Seed the principal store from `[[principals]]`
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::path::Path;

use chrono::Utc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::auth::{Principal, PrincipalId, Role, RoleCode};
use crate::config::{load_config, AppConfig, ConfigError, PrincipalSeed};
use crate::store::{PrincipalStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("principal '{id}' has an unknown role '{code}'")]
    UnknownRole { id: String, code: String },

    #[error("failed to seed principal '{id}': {source}")]
    Seed {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load the config file, or defaults when no path is given.
pub fn resolve_config(path: Option<&Path>) -> Result<AppConfig, StartupError> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(AppConfig::default()),
    }
}

/// Build the store record for a configured seed.
pub fn principal_from_seed(seed: &PrincipalSeed) -> Result<Principal, StartupError> {
    let role = match seed.role.as_deref() {
        Some(code) => Some(Role::from(code.parse::<RoleCode>().map_err(|_| {
            StartupError::UnknownRole {
                id: seed.id.clone(),
                code: code.to_string(),
            }
        })?)),
        None => None,
    };

    Ok(Principal {
        id: PrincipalId::new(seed.id.clone()),
        name: seed.name.clone(),
        email: seed.email.clone(),
        role,
        created_at: Utc::now(),
    })
}

/// Insert every seed into `store`. Returns how many were inserted.
pub async fn seed_principals(store: &dyn PrincipalStore, seeds: &[PrincipalSeed]) -> Result<usize, StartupError> {
    for seed in seeds {
        let principal = principal_from_seed(seed)?;
        store
            .insert(principal)
            .await
            .map_err(|source| StartupError::Seed {
                id: seed.id.clone(),
                source,
            })?;
        tracing::debug!(principal = %seed.id, role = seed.role.as_deref().unwrap_or("-"), "Seeded principal");
    }
    Ok(seeds.len())
}

pub async fn bind_listener(config: &AppConfig) -> Result<TcpListener, StartupError> {
    let address = config.listener.bind_address.clone();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}
