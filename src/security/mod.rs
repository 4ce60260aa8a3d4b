//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (security headers on the way out, every response)
//!     → guard.rs
//!         → limits.rs (bounded body buffering, 413 when too large)
//!         → inspect.rs (suspicious content, log only)
//!         → rate_limit.rs (per-IP fixed window, 429 when exceeded)
//!     → authentication / authorization / handler
//! ```
//!
//! # Design Decisions
//! - The guard never fails the pipeline: every path ends in continue or a response
//! - Detection is observational; only the rate limit and body cap reject
//! - No trust in client input

pub mod guard;
pub mod headers;
pub mod inspect;
pub mod limits;
pub mod rate_limit;

pub use guard::{request_guard, GuardState};
pub use headers::apply_security_headers;
pub use inspect::ContentInspector;
pub use rate_limit::{Clock, FixedWindowLimiter, RateLimitStatus, SystemClock};
