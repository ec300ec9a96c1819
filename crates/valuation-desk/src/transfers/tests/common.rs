use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::geo::GeoPoint;
use crate::identity::{
    Caller, Client, ClientId, ClientKind, IdentityRepository, NewClient, NewUser, Permission,
    PermissionId, PermissionSpec, ResolvedRole, Role, RoleId, RoleInput, User, UserId,
};
use crate::store::{MemoryStore, RepositoryError};
use crate::transfers::{
    NotifyError, TransferFilter, TransferId, TransferNotice, TransferNotifier,
    TransferRepository, TransferService, TransferUnitOfWork, ValuationTransfer,
};
use crate::valuations::{
    PropertyDetails, ReportDetails, Valuation, ValuationFilter, ValuationId,
    ValuationRepository, ValuationResults, ValuationStatus,
};

pub(super) const OWNER: UserId = UserId(1);
pub(super) const RECEIVER: UserId = UserId(7);
pub(super) const VALUATION: ValuationId = ValuationId(42);

pub(super) fn user(id: UserId, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
        email: format!("user{}@valuation.test", id.0),
        phone: None,
        job_title: Some("Valuer".to_string()),
        is_active: true,
        role_ids: Vec::new(),
        created_at: Utc::now(),
    }
}

pub(super) fn valuation(id: ValuationId, preparer: UserId, status: ValuationStatus) -> Valuation {
    let now = Utc::now();
    Valuation {
        id,
        valuation_number: format!("VAL-20250301-{:016}", id.0),
        status,
        prepared_by: preparer,
        inspected_by: None,
        client_id: None,
        to_whom_type_id: None,
        property: PropertyDetails {
            property_type: Some("villa".to_string()),
            city: Some("Riyadh".to_string()),
            ..PropertyDetails::default()
        },
        results: ValuationResults::default(),
        report: ReportDetails::default(),
        location: Some(GeoPoint::new(24.7136, 46.6753)),
        is_active: true,
        transferred_at: None,
        transfer_notes: None,
        created_at: now,
        updated_at: now,
    }
}

pub(super) fn caller(id: UserId, permissions: &[&str]) -> Caller {
    let role = Role {
        id: RoleId(3),
        slug: "senior_valuator".to_string(),
        name_en: "Senior Valuator".to_string(),
        name_ar: "مقيم أول".to_string(),
        description: None,
        level: 3,
        is_active: true,
        permission_ids: Vec::new(),
    };
    let permissions = permissions
        .iter()
        .enumerate()
        .map(|(index, name)| Permission {
            id: PermissionId(index as u64 + 1),
            name: name.to_string(),
            display_name_en: name.to_string(),
            display_name_ar: name.to_string(),
            module: name.split('.').next().unwrap_or_default().to_string(),
            action: name.split('.').nth(1).unwrap_or_default().to_string(),
            resource: name.split('.').next().unwrap_or_default().to_string(),
        })
        .collect();
    Caller {
        id,
        name: format!("user {}", id.0),
        is_active: true,
        roles: vec![ResolvedRole { role, permissions }],
    }
}

pub(super) fn owner() -> Caller {
    caller(OWNER, &["valuations.read", "valuations.transfer"])
}

pub(super) fn receiver() -> Caller {
    caller(RECEIVER, &["valuations.read", "valuations.transfer"])
}

/// Store holding users 1 and 7 and valuation 42 prepared by user 1.
pub(super) fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .import_user(user(OWNER, "Sara Haddad"))
        .expect("owner imported");
    store
        .import_user(user(RECEIVER, "Omar Khalil"))
        .expect("receiver imported");
    store
        .import_valuation(valuation(VALUATION, OWNER, ValuationStatus::InProgress))
        .expect("valuation imported");
    store
}

pub(super) fn build_service() -> (
    TransferService<MemoryStore, RecordingNotifier>,
    Arc<MemoryStore>,
    Arc<RecordingNotifier>,
) {
    let store = seeded_store();
    let notifier = Arc::new(RecordingNotifier::default());
    let service = TransferService::new(store.clone(), notifier.clone());
    (service, store, notifier)
}

pub(super) fn stored_valuation(store: &MemoryStore, id: ValuationId) -> Valuation {
    ValuationRepository::valuation(store, id)
        .expect("store available")
        .expect("valuation present")
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    notices: Mutex<Vec<TransferNotice>>,
}

impl RecordingNotifier {
    pub(super) fn notices(&self) -> Vec<TransferNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl TransferNotifier for RecordingNotifier {
    fn notify(&self, notice: TransferNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl TransferNotifier for FailingNotifier {
    fn notify(&self, _notice: TransferNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay refused connection".to_string()))
    }
}

/// Delegates to a [`MemoryStore`] but refuses every transfer commit.
pub(super) struct FlakyCommitStore {
    pub(super) inner: Arc<MemoryStore>,
}

impl TransferRepository for FlakyCommitStore {
    fn transfer(&self, id: TransferId) -> Result<Option<ValuationTransfer>, RepositoryError> {
        self.inner.transfer(id)
    }

    fn transfers(
        &self,
        filter: &TransferFilter,
    ) -> Result<Vec<ValuationTransfer>, RepositoryError> {
        self.inner.transfers(filter)
    }

    fn commit_transfer(
        &self,
        _unit: TransferUnitOfWork,
    ) -> Result<ValuationTransfer, RepositoryError> {
        Err(RepositoryError::Unavailable("connection reset during commit".to_string()))
    }
}

impl ValuationRepository for FlakyCommitStore {
    fn insert_valuation(&self, valuation: Valuation) -> Result<Valuation, RepositoryError> {
        self.inner.insert_valuation(valuation)
    }

    fn update_valuation(&self, valuation: Valuation) -> Result<Valuation, RepositoryError> {
        self.inner.update_valuation(valuation)
    }

    fn valuation(&self, id: ValuationId) -> Result<Option<Valuation>, RepositoryError> {
        ValuationRepository::valuation(self.inner.as_ref(), id)
    }

    fn valuations(&self, filter: &ValuationFilter) -> Result<Vec<Valuation>, RepositoryError> {
        self.inner.valuations(filter)
    }
}

impl IdentityRepository for FlakyCommitStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.inner.insert_user(user)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.user(id)
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        self.inner.users()
    }

    fn set_user_active(&self, id: UserId, active: bool) -> Result<User, RepositoryError> {
        self.inner.set_user_active(id, active)
    }

    fn set_user_roles(&self, id: UserId, roles: &[RoleId]) -> Result<User, RepositoryError> {
        self.inner.set_user_roles(id, roles)
    }

    fn insert_client(&self, client: NewClient) -> Result<Client, RepositoryError> {
        self.inner.insert_client(client)
    }

    fn client(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        self.inner.client(id)
    }

    fn clients(&self, kind: Option<ClientKind>) -> Result<Vec<Client>, RepositoryError> {
        self.inner.clients(kind)
    }

    fn ensure_permission(&self, spec: &PermissionSpec) -> Result<Permission, RepositoryError> {
        self.inner.ensure_permission(spec)
    }

    fn permissions(&self) -> Result<Vec<Permission>, RepositoryError> {
        self.inner.permissions()
    }

    fn permissions_by_id(&self, ids: &[PermissionId]) -> Result<Vec<Permission>, RepositoryError> {
        self.inner.permissions_by_id(ids)
    }

    fn insert_role(&self, role: RoleInput) -> Result<Role, RepositoryError> {
        self.inner.insert_role(role)
    }

    fn update_role(&self, id: RoleId, role: RoleInput) -> Result<Role, RepositoryError> {
        self.inner.update_role(id, role)
    }

    fn delete_role(&self, id: RoleId) -> Result<(), RepositoryError> {
        self.inner.delete_role(id)
    }

    fn role(&self, id: RoleId) -> Result<Option<Role>, RepositoryError> {
        self.inner.role(id)
    }

    fn role_by_slug(&self, slug: &str) -> Result<Option<Role>, RepositoryError> {
        self.inner.role_by_slug(slug)
    }

    fn roles(&self) -> Result<Vec<Role>, RepositoryError> {
        self.inner.roles()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
