//! Access Guard: route-level role gating and row ownership checks.

pub mod guard;
pub mod ownership;
pub mod policy;

pub use guard::{AccessDecision, GuardState, authorize, require};

/// Where anonymous callers and failed logins are sent.
pub const LOGIN_ROUTE: &str = "/login";
/// Where authenticated callers without the required role are sent.
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";
