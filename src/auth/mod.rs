//! Authentication and role authorization.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → middleware::authenticate (verify bearer token, attach principal id)
//!     → route_layer require_roles (only on restricted routes)
//!         → authorizer.rs (load principal + role, compare to required set)
//!     → handler (receives the loaded Principal as an extension)
//! ```

pub mod authorizer;
pub mod middleware;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorizer::{Decision, DenyReason, RoleAuthorizer};
pub use middleware::{authenticate, AccessControl};
pub use principal::{Authenticated, Principal, PrincipalId, Role};
pub use roles::{RequiredRoles, RoleCode};
pub use token::{Claims, TokenCodec, TokenError};
