use serde::Serialize;

use super::domain::{
    Client, ClientId, ClientKind, NewClient, NewUser, Permission, PermissionId, PermissionSpec,
    Role, RoleId, RoleInput, User, UserId,
};
use crate::store::RepositoryError;

/// Storage abstraction for users, clients, roles, and permissions.
///
/// Uniqueness rules (user email, client email and phone, permission name, role slug and
/// level) are enforced by the store and surface as [`RepositoryError::Conflict`].
pub trait IdentityRepository: Send + Sync {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn users(&self) -> Result<Vec<User>, RepositoryError>;
    fn set_user_active(&self, id: UserId, active: bool) -> Result<User, RepositoryError>;
    fn set_user_roles(&self, id: UserId, roles: &[RoleId]) -> Result<User, RepositoryError>;

    fn insert_client(&self, client: NewClient) -> Result<Client, RepositoryError>;
    fn client(&self, id: ClientId) -> Result<Option<Client>, RepositoryError>;
    fn clients(&self, kind: Option<ClientKind>) -> Result<Vec<Client>, RepositoryError>;

    /// Returns the existing permission when the name is already registered.
    fn ensure_permission(&self, spec: &PermissionSpec) -> Result<Permission, RepositoryError>;
    fn permissions(&self) -> Result<Vec<Permission>, RepositoryError>;
    fn permissions_by_id(&self, ids: &[PermissionId]) -> Result<Vec<Permission>, RepositoryError>;

    /// Role plus permission links are written as one unit.
    fn insert_role(&self, role: RoleInput) -> Result<Role, RepositoryError>;
    fn update_role(&self, id: RoleId, role: RoleInput) -> Result<Role, RepositoryError>;
    fn delete_role(&self, id: RoleId) -> Result<(), RepositoryError>;
    fn role(&self, id: RoleId) -> Result<Option<Role>, RepositoryError>;
    fn role_by_slug(&self, slug: &str) -> Result<Option<Role>, RepositoryError>;
    /// Ordered by level, most senior first.
    fn roles(&self) -> Result<Vec<Role>, RepositoryError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub users_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionGroup {
    pub module: String,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAccessView {
    pub user: User,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub permission_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleStats {
    pub total_roles: usize,
    pub total_permissions: usize,
    pub roles_with_users: usize,
    pub users_with_roles: usize,
    pub role_distribution: Vec<RoleDistributionEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleDistributionEntry {
    pub role: String,
    pub level: u8,
    pub users_count: usize,
}
