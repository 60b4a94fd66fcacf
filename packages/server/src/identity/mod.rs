//! Who is calling: roles, the identity collaborator, and role resolution.

pub mod provider;
pub mod resolver;
pub mod role;

pub use provider::{
    AuthError, DbIdentityProvider, IdentityProvider, SessionGrant, SessionInfo, normalize_email,
};
pub use resolver::{Identity, Profile, RoleResolution, resolve_profile, resolve_role};
pub use role::Role;
