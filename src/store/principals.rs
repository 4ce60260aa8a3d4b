//! User/role store consumed by the authorizer.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::auth::{Principal, PrincipalId, Role};
use crate::store::StoreError;

/// Persistent user store.
///
/// `find_with_role` returns `Ok(None)` for an unknown id; `Err` is reserved
/// for the store itself failing.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_with_role(&self, id: &PrincipalId) -> Result<Option<Principal>, StoreError>;

    /// Insert a new principal. Fails with `Conflict` on a duplicate id or email.
    async fn insert(&self, principal: Principal) -> Result<(), StoreError>;

    /// Replace the role of an existing principal.
    async fn set_role(&self, id: &PrincipalId, role: Role) -> Result<Option<Principal>, StoreError>;

    async fn list(&self) -> Result<Vec<Principal>, StoreError>;
}

/// Process-local store backed by a concurrent map.
#[derive(Clone, Default)]
pub struct InMemoryPrincipalStore {
    inner: Arc<DashMap<PrincipalId, Principal>>,
    /// Lowercased email -> owner, claimed before the record is inserted.
    emails: Arc<DashMap<String, PrincipalId>>,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn find_with_role(&self, id: &PrincipalId) -> Result<Option<Principal>, StoreError> {
        Ok(self.inner.get(id).map(|r| r.value().clone()))
    }

    async fn insert(&self, principal: Principal) -> Result<(), StoreError> {
        let email_key = principal.email.to_lowercase();
        match self.emails.entry(email_key.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict(format!(
                    "email '{}' is already registered",
                    principal.email
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(principal.id.clone());
            }
        }

        match self.inner.entry(principal.id.clone()) {
            Entry::Occupied(_) => {
                // Release the email claim taken above.
                self.emails.remove(&email_key);
                Err(StoreError::Conflict(format!(
                    "principal '{}' already exists",
                    principal.id
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(principal);
                Ok(())
            }
        }
    }

    async fn set_role(&self, id: &PrincipalId, role: Role) -> Result<Option<Principal>, StoreError> {
        Ok(self.inner.get_mut(id).map(|mut r| {
            r.role = Some(role);
            r.value().clone()
        }))
    }

    async fn list(&self) -> Result<Vec<Principal>, StoreError> {
        let mut all: Vec<Principal> = self.inner.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.as_str().cmp(b.id.as_str())));
        Ok(all)
    }
}
