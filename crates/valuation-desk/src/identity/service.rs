use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::domain::{
    Client, ClientId, ClientKind, NewClient, NewUser, Permission, ResolvedRole, Role, RoleId,
    RoleInput, User, UserId,
};
use super::permissions::{
    can_manage, max_role_level, Caller, PermissionSet, DEFAULT_PERMISSIONS, DEFAULT_ROLES,
};
use super::repository::{
    IdentityRepository, PermissionGroup, RoleDistributionEntry, RoleStats, RoleView,
    UserAccessView,
};
use crate::api::ApiError;
use crate::store::RepositoryError;
use crate::validation::ValidationErrors;

pub const MIN_ROLE_LEVEL: u8 = 1;
pub const MAX_ROLE_LEVEL: u8 = 10;

/// Users, clients, roles, and permission resolution.
pub struct IdentityService<R> {
    repository: Arc<R>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub permissions: usize,
    pub roles: usize,
}

impl<R> IdentityService<R>
where
    R: IdentityRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Loads the user, every assigned role, and every role's permissions.
    pub fn resolve_caller(&self, id: UserId) -> Result<Option<Caller>, RepositoryError> {
        let Some(user) = self.repository.user(id)? else {
            return Ok(None);
        };
        let roles = self.resolve_roles(&user)?;
        Ok(Some(Caller {
            id: user.id,
            name: user.name,
            is_active: user.is_active,
            roles,
        }))
    }

    fn resolve_roles(&self, user: &User) -> Result<Vec<ResolvedRole>, RepositoryError> {
        let mut resolved = Vec::with_capacity(user.role_ids.len());
        for role_id in &user.role_ids {
            if let Some(role) = self.repository.role(*role_id)? {
                let permissions = self.repository.permissions_by_id(&role.permission_ids)?;
                resolved.push(ResolvedRole { role, permissions });
            }
        }
        Ok(resolved)
    }

    fn access_view(&self, user: User) -> Result<UserAccessView, RepositoryError> {
        let resolved = self.resolve_roles(&user)?;
        let set = PermissionSet::from_roles(&resolved);
        Ok(UserAccessView {
            permission_names: set.names(),
            permissions: set.into_permissions(),
            roles: resolved.into_iter().map(|entry| entry.role).collect(),
            user,
        })
    }

    pub fn current_access(&self, caller: &Caller) -> Result<UserAccessView, IdentityError> {
        let user = self
            .repository
            .user(caller.id)?
            .ok_or(RepositoryError::NotFound("user"))?;
        Ok(self.access_view(user)?)
    }

    /// Another user's roles and effective permissions.
    pub fn user_access(
        &self,
        caller: &Caller,
        user_id: UserId,
    ) -> Result<UserAccessView, IdentityError> {
        if caller.id != user_id && !caller.has_permission("users.read") {
            return Err(IdentityError::Forbidden(
                "you cannot view another user's permissions",
            ));
        }
        let user = self
            .repository
            .user(user_id)?
            .ok_or(RepositoryError::NotFound("user"))?;
        Ok(self.access_view(user)?)
    }

    pub fn roles(&self) -> Result<Vec<RoleView>, IdentityError> {
        let users = self.repository.users()?;
        let mut views = Vec::new();
        for role in self.repository.roles()? {
            let permissions = self.repository.permissions_by_id(&role.permission_ids)?;
            let users_count = users
                .iter()
                .filter(|user| user.role_ids.contains(&role.id))
                .count();
            views.push(RoleView {
                role,
                permissions,
                users_count,
            });
        }
        Ok(views)
    }

    pub fn permissions_by_module(&self) -> Result<Vec<PermissionGroup>, IdentityError> {
        let mut grouped: BTreeMap<String, Vec<Permission>> = BTreeMap::new();
        for permission in self.repository.permissions()? {
            grouped
                .entry(permission.module.clone())
                .or_default()
                .push(permission);
        }
        Ok(grouped
            .into_iter()
            .map(|(module, permissions)| PermissionGroup {
                module,
                permissions,
            })
            .collect())
    }

    pub fn create_role(&self, input: RoleInput) -> Result<RoleView, IdentityError> {
        self.validate_role(None, &input)?;
        let role = self.repository.insert_role(input)?;
        info!(role = %role.slug, level = role.level, "role created");
        self.role_view(role)
    }

    pub fn update_role(&self, id: RoleId, input: RoleInput) -> Result<RoleView, IdentityError> {
        if self.repository.role(id)?.is_none() {
            return Err(RepositoryError::NotFound("role").into());
        }
        self.validate_role(Some(id), &input)?;
        let role = self.repository.update_role(id, input)?;
        self.role_view(role)
    }

    pub fn delete_role(&self, id: RoleId) -> Result<(), IdentityError> {
        let role = self
            .repository
            .role(id)?
            .ok_or(RepositoryError::NotFound("role"))?;
        let assigned = self
            .repository
            .users()?
            .iter()
            .any(|user| user.role_ids.contains(&id));
        if assigned {
            return Err(IdentityError::Conflict(
                "the role is assigned to users and cannot be deleted",
            ));
        }
        self.repository.delete_role(id)?;
        info!(role = %role.slug, "role deleted");
        Ok(())
    }

    fn role_view(&self, role: Role) -> Result<RoleView, IdentityError> {
        let permissions = self.repository.permissions_by_id(&role.permission_ids)?;
        let users_count = self
            .repository
            .users()?
            .iter()
            .filter(|user| user.role_ids.contains(&role.id))
            .count();
        Ok(RoleView {
            role,
            permissions,
            users_count,
        })
    }

    fn validate_role(&self, id: Option<RoleId>, input: &RoleInput) -> Result<(), IdentityError> {
        let mut errors = ValidationErrors::new();
        errors.length("slug", &input.slug, 1, 255);
        errors.length("name_en", &input.name_en, 1, 255);
        errors.max_length("name_ar", input.name_ar.as_deref(), 255);
        errors.range("level", input.level, MIN_ROLE_LEVEL, MAX_ROLE_LEVEL);

        for existing in self.repository.roles()? {
            if Some(existing.id) == id {
                continue;
            }
            if existing.level == input.level {
                errors.add("level", "the level has already been taken");
            }
            if existing.slug == input.slug.trim() {
                errors.add("slug", "the slug has already been taken");
            }
        }

        let known = self.repository.permissions_by_id(&input.permission_ids)?;
        if known.len() != input.permission_ids.len() {
            errors.add("permission_ids", "one or more permissions do not exist");
        }

        Ok(errors.into_result()?)
    }

    /// Replaces the target's roles; the caller must outrank the target.
    pub fn assign_roles(
        &self,
        caller: &Caller,
        user_id: UserId,
        role_ids: Vec<RoleId>,
    ) -> Result<UserAccessView, IdentityError> {
        let target = self
            .repository
            .user(user_id)?
            .ok_or(RepositoryError::NotFound("user"))?;
        let target_roles = self.resolve_roles(&target)?;
        if !can_manage(caller.max_role_level(), max_role_level(&target_roles)) {
            return Err(IdentityError::Forbidden(
                "you cannot manage this user's roles",
            ));
        }

        for role_id in &role_ids {
            if self.repository.role(*role_id)?.is_none() {
                return Err(
                    ValidationErrors::single("role_ids", format!("role {role_id} does not exist"))
                        .into(),
                );
            }
        }

        let updated = self.repository.set_user_roles(user_id, &role_ids)?;
        info!(manager = %caller.id, user = %user_id, roles = role_ids.len(), "roles assigned");
        Ok(self.access_view(updated)?)
    }

    pub fn role_stats(&self) -> Result<RoleStats, IdentityError> {
        let roles = self.roles()?;
        let users = self.repository.users()?;
        Ok(RoleStats {
            total_roles: roles.len(),
            total_permissions: self.repository.permissions()?.len(),
            roles_with_users: roles.iter().filter(|view| view.users_count > 0).count(),
            users_with_roles: users.iter().filter(|user| !user.role_ids.is_empty()).count(),
            role_distribution: roles
                .into_iter()
                .map(|view| RoleDistributionEntry {
                    role: view.role.name_en,
                    level: view.role.level,
                    users_count: view.users_count,
                })
                .collect(),
        })
    }

    /// Registers the default permission catalogue and roles. Safe to run repeatedly.
    pub fn seed_defaults(&self) -> Result<SeedSummary, IdentityError> {
        let mut permissions = Vec::with_capacity(DEFAULT_PERMISSIONS.len());
        for spec in DEFAULT_PERMISSIONS {
            permissions.push(self.repository.ensure_permission(spec)?);
        }

        for default in DEFAULT_ROLES {
            let input = RoleInput {
                slug: default.slug.to_string(),
                name_en: default.name_en.to_string(),
                name_ar: Some(default.name_ar.to_string()),
                description: None,
                level: default.level,
                is_active: true,
                permission_ids: permissions
                    .iter()
                    .filter(|permission| default.grants.includes(&permission.name))
                    .map(|permission| permission.id)
                    .collect(),
            };
            match self.repository.role_by_slug(default.slug)? {
                Some(existing) => {
                    let input = RoleInput {
                        description: existing.description.clone(),
                        ..input
                    };
                    self.repository.update_role(existing.id, input)?;
                }
                None => {
                    self.repository.insert_role(input)?;
                }
            }
        }

        let summary = SeedSummary {
            permissions: permissions.len(),
            roles: DEFAULT_ROLES.len(),
        };
        info!(
            permissions = summary.permissions,
            roles = summary.roles,
            "default roles and permissions seeded"
        );
        Ok(summary)
    }

    pub fn create_employee(&self, new_user: NewUser) -> Result<User, IdentityError> {
        let mut errors = ValidationErrors::new();
        errors.length("name", &new_user.name, 1, 255);
        validate_email(&mut errors, Some(&new_user.email), true);
        errors.max_length("phone", new_user.phone.as_deref(), 20);
        let email = new_user.email.trim().to_ascii_lowercase();
        if self
            .repository
            .users()?
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(&email))
        {
            errors.add("email", "the email has already been taken");
        }
        for role_id in &new_user.role_ids {
            if self.repository.role(*role_id)?.is_none() {
                errors.add("role_ids", format!("role {role_id} does not exist"));
            }
        }
        errors.into_result()?;

        let user = self.repository.insert_user(NewUser { email, ..new_user })?;
        info!(user = %user.id, "employee created");
        Ok(user)
    }

    pub fn employees(&self) -> Result<Vec<User>, IdentityError> {
        Ok(self.repository.users()?)
    }

    pub fn toggle_employee_status(
        &self,
        caller: &Caller,
        user_id: UserId,
    ) -> Result<User, IdentityError> {
        if caller.id == user_id {
            return Err(IdentityError::Forbidden(
                "you cannot change your own account status",
            ));
        }
        let user = self
            .repository
            .user(user_id)?
            .ok_or(RepositoryError::NotFound("user"))?;
        let updated = self.repository.set_user_active(user_id, !user.is_active)?;
        info!(user = %user_id, active = updated.is_active, "employee status toggled");
        Ok(updated)
    }

    pub fn create_client(&self, new_client: NewClient) -> Result<Client, IdentityError> {
        let mut errors = ValidationErrors::new();
        errors.length("name", &new_client.name, 1, 255);
        validate_email(&mut errors, new_client.email.as_deref(), false);
        errors.max_length("phone", new_client.phone.as_deref(), 20);
        errors.max_length("address", new_client.address.as_deref(), 500);

        let email = new_client
            .email
            .as_deref()
            .map(|email| email.trim().to_ascii_lowercase());
        let phone = new_client.phone.as_deref().map(|phone| phone.trim().to_string());
        for existing in self.repository.clients(None)? {
            if email.is_some() && existing.email == email {
                errors.add("email", "the email has already been taken");
            }
            if phone.is_some() && existing.phone == phone {
                errors.add("phone", "the phone has already been taken");
            }
        }
        errors.into_result()?;

        let client = self.repository.insert_client(NewClient {
            email,
            phone,
            ..new_client
        })?;
        info!(client = %client.id, kind = client.kind.label(), "client created");
        Ok(client)
    }

    pub fn clients(&self, kind: Option<ClientKind>) -> Result<Vec<Client>, IdentityError> {
        Ok(self.repository.clients(kind)?)
    }

    pub fn client(&self, id: ClientId) -> Result<Client, IdentityError> {
        Ok(self
            .repository
            .client(id)?
            .ok_or(RepositoryError::NotFound("client"))?)
    }
}

fn validate_email(errors: &mut ValidationErrors, email: Option<&str>, required: bool) {
    match email.map(str::trim) {
        None | Some("") if required => errors.add("email", "the email field is required"),
        None | Some("") => {}
        Some(email) => {
            let valid = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !valid {
                errors.add("email", "the email must be a valid email address");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<IdentityError> for ApiError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Validation(errors) => ApiError::validation(errors),
            IdentityError::Forbidden(reason) => ApiError::forbidden(reason),
            IdentityError::Conflict(reason) => ApiError::conflict(reason),
            IdentityError::Repository(err) => err.into(),
        }
    }
}
