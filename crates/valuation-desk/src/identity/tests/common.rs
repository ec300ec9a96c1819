use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use crate::identity::{
    Caller, IdentityRepository, IdentityService, NewUser, RoleId, User,
};
use crate::store::MemoryStore;

pub(super) fn build_service() -> (IdentityService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = IdentityService::new(store.clone());
    service.seed_defaults().expect("defaults seeded");
    (service, store)
}

pub(super) fn role_id(store: &MemoryStore, slug: &str) -> RoleId {
    store
        .role_by_slug(slug)
        .expect("store available")
        .unwrap_or_else(|| panic!("role {slug} seeded"))
        .id
}

pub(super) fn new_user(name: &str, email: &str, role_ids: Vec<RoleId>) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        job_title: None,
        role_ids,
    }
}

/// Creates a staff member holding the seeded role `slug`, or no role when `slug` is `None`.
pub(super) fn employee(
    service: &IdentityService<MemoryStore>,
    store: &MemoryStore,
    name: &str,
    slug: Option<&str>,
) -> User {
    let role_ids = slug.map(|slug| vec![role_id(store, slug)]).unwrap_or_default();
    let email = format!("{}@valuation.test", name.to_ascii_lowercase().replace(' ', "."));
    service
        .create_employee(new_user(name, &email, role_ids))
        .expect("employee created")
}

pub(super) fn caller_for(service: &IdentityService<MemoryStore>, user: &User) -> Caller {
    service
        .resolve_caller(user.id)
        .expect("store available")
        .expect("caller resolves")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
