//! Authenticated identities.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::roles::RoleCode;

/// Opaque user identifier carried in the token subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role relation as stored with the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub code: String,
    pub name: String,
}

impl From<RoleCode> for Role {
    fn from(code: RoleCode) -> Self {
        Self {
            code: code.as_str().to_string(),
            name: code.display_name().to_string(),
        }
    }
}

/// A user record with its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: PrincipalId,
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
}

/// Request extension set once a bearer token has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated(pub PrincipalId);
