use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};

use super::domain::{Client, ClientId, ClientKind, NewClient, NewUser, RoleId, RoleInput, User, UserId};
use super::permissions::Caller;
use super::repository::{IdentityRepository, PermissionGroup, RoleStats, RoleView, UserAccessView};
use super::service::{IdentityService, SeedSummary};
use crate::api::{ApiJson, ApiPath, ApiQuery, ApiResult, Envelope};

/// Router builder for roles, permissions, employees, and clients.
pub fn identity_router<R>(service: Arc<IdentityService<R>>) -> Router
where
    R: IdentityRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/roles",
            get(list_roles_handler::<R>).post(create_role_handler::<R>),
        )
        .route("/api/v1/roles/stats", get(role_stats_handler::<R>))
        .route("/api/v1/roles/initialize", post(seed_handler::<R>))
        .route(
            "/api/v1/roles/:role_id",
            put(update_role_handler::<R>).delete(delete_role_handler::<R>),
        )
        .route("/api/v1/permissions", get(permissions_handler::<R>))
        .route("/api/v1/me/permissions", get(my_permissions_handler::<R>))
        .route(
            "/api/v1/me/permissions/check",
            post(check_permission_handler),
        )
        .route(
            "/api/v1/users/:user_id/access",
            get(user_access_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/roles",
            put(assign_roles_handler::<R>),
        )
        .route(
            "/api/v1/employees",
            get(list_employees_handler::<R>).post(create_employee_handler::<R>),
        )
        .route(
            "/api/v1/employees/:user_id/toggle-status",
            post(toggle_employee_handler::<R>),
        )
        .route(
            "/api/v1/clients",
            get(list_clients_handler::<R>).post(create_client_handler::<R>),
        )
        .route("/api/v1/clients/:client_id", get(show_client_handler::<R>))
        .with_state(service)
}

pub(crate) async fn list_roles_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<RoleView>>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.read")?;
    Ok(Envelope::ok(service.roles()?))
}

pub(crate) async fn create_role_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiJson(input): ApiJson<RoleInput>,
) -> ApiResult<RoleView>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.assign_roles")?;
    let view = service.create_role(input)?;
    Ok(Envelope::created(view).with_message("role created"))
}

pub(crate) async fn update_role_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(role_id): ApiPath<u64>,
    ApiJson(input): ApiJson<RoleInput>,
) -> ApiResult<RoleView>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.assign_roles")?;
    let view = service.update_role(RoleId(role_id), input)?;
    Ok(Envelope::ok(view).with_message("role updated"))
}

pub(crate) async fn delete_role_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(role_id): ApiPath<u64>,
) -> ApiResult<()>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.assign_roles")?;
    service.delete_role(RoleId(role_id))?;
    Ok(Envelope::ok(()).with_message("role deleted"))
}

pub(crate) async fn role_stats_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<RoleStats>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.read")?;
    Ok(Envelope::ok(service.role_stats()?))
}

pub(crate) async fn seed_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<SeedSummary>
where
    R: IdentityRepository + 'static,
{
    caller.require("settings.update")?;
    let summary = service.seed_defaults()?;
    Ok(Envelope::ok(summary).with_message("default roles and permissions initialized"))
}

pub(crate) async fn permissions_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<PermissionGroup>>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.read")?;
    Ok(Envelope::ok(service.permissions_by_module()?))
}

pub(crate) async fn my_permissions_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<UserAccessView>
where
    R: IdentityRepository + 'static,
{
    Ok(Envelope::ok(service.current_access(&caller)?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PermissionCheck {
    permission: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PermissionCheckView {
    permission: String,
    has_permission: bool,
}

pub(crate) async fn check_permission_handler(
    Extension(caller): Extension<Caller>,
    ApiJson(check): ApiJson<PermissionCheck>,
) -> ApiResult<PermissionCheckView> {
    let has_permission = caller.has_permission(&check.permission);
    Ok(Envelope::ok(PermissionCheckView {
        permission: check.permission,
        has_permission,
    }))
}

pub(crate) async fn user_access_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(user_id): ApiPath<u64>,
) -> ApiResult<UserAccessView>
where
    R: IdentityRepository + 'static,
{
    Ok(Envelope::ok(service.user_access(&caller, UserId(user_id))?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleAssignment {
    role_ids: Vec<RoleId>,
}

pub(crate) async fn assign_roles_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(user_id): ApiPath<u64>,
    ApiJson(assignment): ApiJson<RoleAssignment>,
) -> ApiResult<UserAccessView>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.assign_roles")?;
    let view = service.assign_roles(&caller, UserId(user_id), assignment.role_ids)?;
    Ok(Envelope::ok(view).with_message("roles assigned"))
}

pub(crate) async fn list_employees_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<User>>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.read")?;
    Ok(Envelope::ok(service.employees()?))
}

pub(crate) async fn create_employee_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<User>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.create")?;
    let user = service.create_employee(new_user)?;
    Ok(Envelope::created(user).with_message("employee created"))
}

pub(crate) async fn toggle_employee_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(user_id): ApiPath<u64>,
) -> ApiResult<User>
where
    R: IdentityRepository + 'static,
{
    caller.require("users.update")?;
    let user = service.toggle_employee_status(&caller, UserId(user_id))?;
    Ok(Envelope::ok(user))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClientQuery {
    #[serde(default)]
    kind: Option<ClientKind>,
}

pub(crate) async fn list_clients_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(query): ApiQuery<ClientQuery>,
) -> ApiResult<Vec<Client>>
where
    R: IdentityRepository + 'static,
{
    caller.require("clients.read")?;
    Ok(Envelope::ok(service.clients(query.kind)?))
}

pub(crate) async fn create_client_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiJson(new_client): ApiJson<NewClient>,
) -> ApiResult<Client>
where
    R: IdentityRepository + 'static,
{
    caller.require("clients.create")?;
    let client = service.create_client(new_client)?;
    Ok(Envelope::created(client).with_message("client created"))
}

pub(crate) async fn show_client_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(client_id): ApiPath<u64>,
) -> ApiResult<Client>
where
    R: IdentityRepository + 'static,
{
    caller.require("clients.read")?;
    Ok(Envelope::ok(service.client(ClientId(client_id))?))
}
