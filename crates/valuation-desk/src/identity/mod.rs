//! Staff, clients, roles, and permission resolution.

pub mod domain;
pub mod permissions;
pub mod provider;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Client, ClientId, ClientKind, NewClient, NewUser, Permission, PermissionId, PermissionSpec,
    ResolvedRole, Role, RoleId, RoleInput, User, UserId,
};
pub use permissions::{can_manage, Caller, PermissionSet, DEFAULT_PERMISSIONS, DEFAULT_ROLES};
pub use provider::TokenTable;
pub use repository::{IdentityRepository, PermissionGroup, RoleStats, RoleView, UserAccessView};
pub use router::identity_router;
pub use service::{IdentityError, IdentityService, SeedSummary};
