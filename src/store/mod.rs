//! Storage subsystem.
//!
//! # Design Decisions
//! - The authorizer depends only on the `PrincipalStore` trait
//! - The bundled implementations are process-local (`DashMap`)
//! - "Not found" is `Ok(None)`; `Err` always means the store failed

pub mod collection;
pub mod principals;

use thiserror::Error;

pub use collection::Collection;
pub use principals::{InMemoryPrincipalStore, PrincipalStore};

/// Errors from a backing store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Conflict(String),
}
