//! Role codes and per-route role requirements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permission tier of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleCode {
    Admin,
    Moderator,
    Client,
}

impl RoleCode {
    pub const ALL: [RoleCode; 3] = [RoleCode::Admin, RoleCode::Moderator, RoleCode::Client];

    /// Code as stored on the role record.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCode::Admin => "ADMIN",
            RoleCode::Moderator => "MODERATOR",
            RoleCode::Client => "CLIENT",
        }
    }

    /// Human-readable role name.
    pub fn display_name(&self) -> &'static str {
        match self {
            RoleCode::Admin => "Administrator",
            RoleCode::Moderator => "Moderator",
            RoleCode::Client => "Client",
        }
    }
}

impl fmt::Display for RoleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role code '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for RoleCode {
    type Err = UnknownRole;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Set of role codes a route accepts. Empty means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredRoles(Vec<RoleCode>);

impl RequiredRoles {
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn any_of(codes: impl IntoIterator<Item = RoleCode>) -> Self {
        let mut roles: Vec<RoleCode> = Vec::new();
        for code in codes {
            if !roles.contains(&code) {
                roles.push(code);
            }
        }
        Self(roles)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `code` matches one of the required codes exactly.
    pub fn permits(&self, code: &str) -> bool {
        self.0.iter().any(|required| required.as_str() == code)
    }
}

impl fmt::Display for RequiredRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.0.iter().map(RoleCode::as_str).collect();
        write!(f, "[{}]", codes.join(", "))
    }
}
