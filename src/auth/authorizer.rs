//! Role authorization.
//!
//! # Responsibilities
//! - Compare a route's required roles against the caller's stored role
//! - Load the principal fresh from the store on every check
//! - Bound the store lookup with a timeout
//!
//! # Design Decisions
//! - Unrestricted routes never touch the store
//! - Fail closed: store errors and timeouts deny
//! - Role codes compare exactly (case-sensitive), any-of semantics

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

use crate::auth::principal::{Principal, PrincipalId};
use crate::auth::roles::RequiredRoles;
use crate::store::PrincipalStore;

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No verified principal on the request.
    Unauthenticated,
    /// The principal id is not in the store.
    UnknownPrincipal,
    /// The principal exists but carries no role.
    MissingRole,
    /// The principal's role is not in the required set.
    RoleMismatch { actual: String },
    /// The store returned an error.
    StoreUnavailable,
    /// The store did not answer in time.
    LookupTimedOut,
}

impl DenyReason {
    pub fn status(&self) -> StatusCode {
        match self {
            DenyReason::Unauthenticated => StatusCode::UNAUTHORIZED,
            _ => StatusCode::FORBIDDEN,
        }
    }

    /// Message returned to the caller.
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "Authentication required",
            _ => "Insufficient role for this resource",
        }
    }

    /// Label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::UnknownPrincipal => "unknown_principal",
            DenyReason::MissingRole => "missing_role",
            DenyReason::RoleMismatch { .. } => "role_mismatch",
            DenyReason::StoreUnavailable => "store_unavailable",
            DenyReason::LookupTimedOut => "lookup_timeout",
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Allowed. Carries the loaded principal when the route was restricted.
    Allow(Option<Principal>),
    Deny(DenyReason),
}

/// Checks principals against route role requirements.
#[derive(Clone)]
pub struct RoleAuthorizer {
    store: Arc<dyn PrincipalStore>,
    lookup_timeout: Duration,
}

impl RoleAuthorizer {
    pub fn new(store: Arc<dyn PrincipalStore>, lookup_timeout: Duration) -> Self {
        Self {
            store,
            lookup_timeout,
        }
    }

    pub async fn authorize(&self, required: &RequiredRoles, principal: Option<&PrincipalId>) -> Decision {
        if required.is_unrestricted() {
            return Decision::Allow(None);
        }

        let Some(id) = principal else {
            return Decision::Deny(DenyReason::Unauthenticated);
        };

        let record = match tokio::time::timeout(self.lookup_timeout, self.store.find_with_role(id)).await {
            Ok(Ok(Some(record))) => record,
            Ok(Ok(None)) => return Decision::Deny(DenyReason::UnknownPrincipal),
            Ok(Err(e)) => {
                tracing::error!(principal = %id, error = %e, "Principal lookup failed");
                return Decision::Deny(DenyReason::StoreUnavailable);
            }
            Err(_) => {
                tracing::error!(
                    principal = %id,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "Principal lookup timed out"
                );
                return Decision::Deny(DenyReason::LookupTimedOut);
            }
        };

        let Some(role) = &record.role else {
            return Decision::Deny(DenyReason::MissingRole);
        };

        if required.permits(&role.code) {
            Decision::Allow(Some(record))
        } else {
            Decision::Deny(DenyReason::RoleMismatch {
                actual: role.code.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::RoleCode;
    use crate::store::{InMemoryPrincipalStore, StoreError};
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::auth::principal::Role;

    struct FailingStore;

    #[async_trait]
    impl PrincipalStore for FailingStore {
        async fn find_with_role(&self, _id: &PrincipalId) -> Result<Option<Principal>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn insert(&self, _principal: Principal) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn set_role(&self, _id: &PrincipalId, _role: Role) -> Result<Option<Principal>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn list(&self) -> Result<Vec<Principal>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    struct StalledStore;

    #[async_trait]
    impl PrincipalStore for StalledStore {
        async fn find_with_role(&self, _id: &PrincipalId) -> Result<Option<Principal>, StoreError> {
            std::future::pending().await
        }
        async fn insert(&self, _principal: Principal) -> Result<(), StoreError> {
            std::future::pending().await
        }
        async fn set_role(&self, _id: &PrincipalId, _role: Role) -> Result<Option<Principal>, StoreError> {
            std::future::pending().await
        }
        async fn list(&self) -> Result<Vec<Principal>, StoreError> {
            std::future::pending().await
        }
    }

    async fn store_with(users: &[(&str, Option<RoleCode>)]) -> Arc<dyn PrincipalStore> {
        let store = InMemoryPrincipalStore::new();
        for (id, role) in users {
            store
                .insert(Principal {
                    id: PrincipalId::new(*id),
                    name: id.to_string(),
                    email: format!("{id}@example.com"),
                    role: role.map(Role::from),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    fn staff() -> RequiredRoles {
        RequiredRoles::any_of([RoleCode::Admin, RoleCode::Moderator])
    }

    #[tokio::test]
    async fn test_unrestricted_allows_anyone() {
        // A store that would fail proves no lookup happens.
        let authorizer = RoleAuthorizer::new(Arc::new(FailingStore), Duration::from_secs(1));
        let anonymous = authorizer.authorize(&RequiredRoles::none(), None).await;
        assert_eq!(anonymous, Decision::Allow(None));

        let id = PrincipalId::new("u-1");
        let known = authorizer.authorize(&RequiredRoles::none(), Some(&id)).await;
        assert_eq!(known, Decision::Allow(None));
    }

    #[tokio::test]
    async fn test_missing_principal_denied() {
        let authorizer = RoleAuthorizer::new(store_with(&[]).await, Duration::from_secs(1));
        let decision = authorizer.authorize(&staff(), None).await;
        assert_eq!(decision, Decision::Deny(DenyReason::Unauthenticated));
        if let Decision::Deny(reason) = decision {
            assert_eq!(reason.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_role_membership() {
        let store = store_with(&[
            ("admin", Some(RoleCode::Admin)),
            ("client", Some(RoleCode::Client)),
            ("nobody", None),
        ])
        .await;
        let authorizer = RoleAuthorizer::new(store, Duration::from_secs(1));

        let admin = authorizer.authorize(&staff(), Some(&PrincipalId::new("admin"))).await;
        match admin {
            Decision::Allow(Some(p)) => assert_eq!(p.id.as_str(), "admin"),
            other => panic!("expected allow, got {other:?}"),
        }

        let client = authorizer.authorize(&staff(), Some(&PrincipalId::new("client"))).await;
        assert_eq!(
            client,
            Decision::Deny(DenyReason::RoleMismatch {
                actual: "CLIENT".into()
            })
        );

        let roleless = authorizer.authorize(&staff(), Some(&PrincipalId::new("nobody"))).await;
        assert_eq!(roleless, Decision::Deny(DenyReason::MissingRole));

        let unknown = authorizer.authorize(&staff(), Some(&PrincipalId::new("ghost"))).await;
        assert_eq!(unknown, Decision::Deny(DenyReason::UnknownPrincipal));
    }

    #[tokio::test]
    async fn test_store_failure_denies() {
        let authorizer = RoleAuthorizer::new(Arc::new(FailingStore), Duration::from_secs(1));
        let decision = authorizer.authorize(&staff(), Some(&PrincipalId::new("admin"))).await;
        assert_eq!(decision, Decision::Deny(DenyReason::StoreUnavailable));
    }

    #[tokio::test]
    async fn test_lookup_timeout_denies() {
        let authorizer = RoleAuthorizer::new(Arc::new(StalledStore), Duration::from_millis(20));
        let decision = authorizer.authorize(&staff(), Some(&PrincipalId::new("admin"))).await;
        assert_eq!(decision, Decision::Deny(DenyReason::LookupTimedOut));
        if let Decision::Deny(reason) = decision {
            assert_eq!(reason.status(), StatusCode::FORBIDDEN);
        }
    }
}
