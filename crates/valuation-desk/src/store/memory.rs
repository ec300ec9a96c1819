use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::RepositoryError;
use crate::identity::{
    Client, ClientId, ClientKind, IdentityRepository, NewClient, NewUser, Permission,
    PermissionId, PermissionSpec, Role, RoleId, RoleInput, User, UserId,
};
use crate::reports::{
    NewReportTemplate, NewToWhomType, ReportTemplate, ReportTemplateId, TemplateRepository,
    ToWhomType, ToWhomTypeId,
};
use crate::sketches::{Annotation, DisplaySettings, SketchLayout, SketchRepository, ValuationSketch};
use crate::transfers::{
    TransferFilter, TransferId, TransferRepository, TransferStatus, TransferUnitOfWork,
    TransferWrite, ValuationTransfer,
};
use crate::valuations::{Valuation, ValuationFilter, ValuationId, ValuationRepository};

#[derive(Debug, Default)]
struct Sequences {
    user: u64,
    client: u64,
    permission: u64,
    role: u64,
    valuation: u64,
    transfer: u64,
    template: u64,
    to_whom: u64,
}

fn bump(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct StoreState {
    seq: Sequences,
    users: BTreeMap<UserId, User>,
    clients: BTreeMap<ClientId, Client>,
    permissions: BTreeMap<PermissionId, Permission>,
    roles: BTreeMap<RoleId, Role>,
    valuations: BTreeMap<ValuationId, Valuation>,
    transfers: BTreeMap<TransferId, ValuationTransfer>,
    sketches: BTreeMap<ValuationId, ValuationSketch>,
    templates: BTreeMap<ReportTemplateId, ReportTemplate>,
    to_whom_types: BTreeMap<ToWhomTypeId, ToWhomType>,
}

impl StoreState {
    fn check_role(&self, input: &RoleInput, existing: Option<RoleId>) -> Result<(), RepositoryError> {
        for role in self.roles.values().filter(|role| Some(role.id) != existing) {
            if role.slug == input.slug {
                return Err(RepositoryError::Conflict(format!(
                    "role slug '{}' already exists",
                    input.slug
                )));
            }
            if role.level == input.level {
                return Err(RepositoryError::Conflict(format!(
                    "role level {} already taken",
                    input.level
                )));
            }
        }
        if input
            .permission_ids
            .iter()
            .any(|id| !self.permissions.contains_key(id))
        {
            return Err(RepositoryError::NotFound("permission"));
        }
        Ok(())
    }

    fn sketch_mut(&mut self, valuation: ValuationId) -> Result<&mut ValuationSketch, RepositoryError> {
        self.sketches
            .get_mut(&valuation)
            .ok_or(RepositoryError::NotFound("sketch"))
    }
}

fn role_from(id: RoleId, input: RoleInput) -> Role {
    let mut permission_ids = input.permission_ids;
    permission_ids.sort();
    permission_ids.dedup();
    Role {
        id,
        name_ar: input.name_ar.unwrap_or_else(|| input.name_en.clone()),
        slug: input.slug,
        name_en: input.name_en,
        description: input.description,
        level: input.level,
        is_active: input.is_active,
        permission_ids,
    }
}

/// Process-local store behind a single lock. Every trait method is one critical section, so
/// a transfer commit or an annotation append is never observed half-applied.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }

    /// Loads a user with its existing identifier, e.g. from a fixture or an import.
    pub fn import_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        if state.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict(format!("user {} already exists", user.id)));
        }
        state.seq.user = state.seq.user.max(user.id.0);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Loads a valuation with its existing identifier.
    pub fn import_valuation(&self, valuation: Valuation) -> Result<Valuation, RepositoryError> {
        let mut state = self.lock()?;
        if state.valuations.contains_key(&valuation.id) {
            return Err(RepositoryError::Conflict(format!(
                "valuation {} already exists",
                valuation.id
            )));
        }
        state.seq.valuation = state.seq.valuation.max(valuation.id.0);
        state.valuations.insert(valuation.id, valuation.clone());
        Ok(valuation)
    }
}

impl IdentityRepository for MemoryStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        if state
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::Conflict("user email already registered".to_string()));
        }
        if user.role_ids.iter().any(|id| !state.roles.contains_key(id)) {
            return Err(RepositoryError::NotFound("role"));
        }
        let id = UserId(bump(&mut state.seq.user));
        let record = User {
            id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            job_title: user.job_title,
            is_active: true,
            role_ids: user.role_ids,
            created_at: Utc::now(),
        };
        state.users.insert(id, record.clone());
        Ok(record)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    fn set_user_active(&self, id: UserId, active: bool) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        let user = state
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("user"))?;
        user.is_active = active;
        Ok(user.clone())
    }

    fn set_user_roles(&self, id: UserId, roles: &[RoleId]) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        if roles.iter().any(|role| !state.roles.contains_key(role)) {
            return Err(RepositoryError::NotFound("role"));
        }
        let user = state
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("user"))?;
        let mut role_ids = roles.to_vec();
        role_ids.sort();
        role_ids.dedup();
        user.role_ids = role_ids;
        Ok(user.clone())
    }

    fn insert_client(&self, client: NewClient) -> Result<Client, RepositoryError> {
        let mut state = self.lock()?;
        for existing in state.clients.values() {
            if client.email.is_some() && existing.email == client.email {
                return Err(RepositoryError::Conflict("client email already registered".to_string()));
            }
            if client.phone.is_some() && existing.phone == client.phone {
                return Err(RepositoryError::Conflict("client phone already registered".to_string()));
            }
        }
        let id = ClientId(bump(&mut state.seq.client));
        let record = Client {
            id,
            name: client.name,
            email: client.email,
            phone: client.phone,
            kind: client.kind,
            address: client.address,
            is_active: true,
            created_at: Utc::now(),
        };
        state.clients.insert(id, record.clone());
        Ok(record)
    }

    fn client(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        Ok(self.lock()?.clients.get(&id).cloned())
    }

    fn clients(&self, kind: Option<ClientKind>) -> Result<Vec<Client>, RepositoryError> {
        Ok(self
            .lock()?
            .clients
            .values()
            .filter(|client| kind.map_or(true, |kind| client.kind == kind))
            .cloned()
            .collect())
    }

    fn ensure_permission(&self, spec: &PermissionSpec) -> Result<Permission, RepositoryError> {
        let mut state = self.lock()?;
        if let Some(existing) = state
            .permissions
            .values()
            .find(|permission| permission.name == spec.name)
        {
            return Ok(existing.clone());
        }
        let id = PermissionId(bump(&mut state.seq.permission));
        let permission = Permission {
            id,
            name: spec.name.to_string(),
            display_name_en: spec.display_name_en.to_string(),
            display_name_ar: spec.display_name_ar.to_string(),
            module: spec.module().to_string(),
            action: spec.action().to_string(),
            resource: spec.module().to_string(),
        };
        state.permissions.insert(id, permission.clone());
        Ok(permission)
    }

    fn permissions(&self) -> Result<Vec<Permission>, RepositoryError> {
        Ok(self.lock()?.permissions.values().cloned().collect())
    }

    fn permissions_by_id(&self, ids: &[PermissionId]) -> Result<Vec<Permission>, RepositoryError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.permissions.get(id).cloned())
            .collect())
    }

    fn insert_role(&self, role: RoleInput) -> Result<Role, RepositoryError> {
        let mut state = self.lock()?;
        state.check_role(&role, None)?;
        let id = RoleId(bump(&mut state.seq.role));
        let record = role_from(id, role);
        state.roles.insert(id, record.clone());
        Ok(record)
    }

    fn update_role(&self, id: RoleId, role: RoleInput) -> Result<Role, RepositoryError> {
        let mut state = self.lock()?;
        if !state.roles.contains_key(&id) {
            return Err(RepositoryError::NotFound("role"));
        }
        state.check_role(&role, Some(id))?;
        let record = role_from(id, role);
        state.roles.insert(id, record.clone());
        Ok(record)
    }

    fn delete_role(&self, id: RoleId) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.roles.contains_key(&id) {
            return Err(RepositoryError::NotFound("role"));
        }
        if state.users.values().any(|user| user.role_ids.contains(&id)) {
            return Err(RepositoryError::Conflict("role is assigned to users".to_string()));
        }
        state.roles.remove(&id);
        Ok(())
    }

    fn role(&self, id: RoleId) -> Result<Option<Role>, RepositoryError> {
        Ok(self.lock()?.roles.get(&id).cloned())
    }

    fn role_by_slug(&self, slug: &str) -> Result<Option<Role>, RepositoryError> {
        Ok(self
            .lock()?
            .roles
            .values()
            .find(|role| role.slug == slug)
            .cloned())
    }

    fn roles(&self) -> Result<Vec<Role>, RepositoryError> {
        let mut roles: Vec<Role> = self.lock()?.roles.values().cloned().collect();
        roles.sort_by_key(|role| role.level);
        Ok(roles)
    }
}

impl ValuationRepository for MemoryStore {
    fn insert_valuation(&self, valuation: Valuation) -> Result<Valuation, RepositoryError> {
        let mut state = self.lock()?;
        if state
            .valuations
            .values()
            .any(|existing| existing.valuation_number == valuation.valuation_number)
        {
            return Err(RepositoryError::Conflict(format!(
                "valuation number {} already exists",
                valuation.valuation_number
            )));
        }
        let id = ValuationId(bump(&mut state.seq.valuation));
        let record = Valuation { id, ..valuation };
        state.valuations.insert(id, record.clone());
        Ok(record)
    }

    fn update_valuation(&self, valuation: Valuation) -> Result<Valuation, RepositoryError> {
        let mut state = self.lock()?;
        let slot = state
            .valuations
            .get_mut(&valuation.id)
            .ok_or(RepositoryError::NotFound("valuation"))?;
        *slot = valuation.clone();
        Ok(valuation)
    }

    fn valuation(&self, id: ValuationId) -> Result<Option<Valuation>, RepositoryError> {
        Ok(self.lock()?.valuations.get(&id).cloned())
    }

    fn valuations(&self, filter: &ValuationFilter) -> Result<Vec<Valuation>, RepositoryError> {
        let mut found: Vec<Valuation> = self
            .lock()?
            .valuations
            .values()
            .filter(|valuation| filter.matches(valuation))
            .cloned()
            .collect();
        found.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(found)
    }

    fn count_valuations(&self, filter: &ValuationFilter) -> Result<usize, RepositoryError> {
        Ok(self
            .lock()?
            .valuations
            .values()
            .filter(|valuation| filter.matches(valuation))
            .count())
    }
}

impl TransferRepository for MemoryStore {
    fn transfer(&self, id: TransferId) -> Result<Option<ValuationTransfer>, RepositoryError> {
        Ok(self.lock()?.transfers.get(&id).cloned())
    }

    fn transfers(
        &self,
        filter: &TransferFilter,
    ) -> Result<Vec<ValuationTransfer>, RepositoryError> {
        let mut found: Vec<ValuationTransfer> = self
            .lock()?
            .transfers
            .values()
            .filter(|transfer| filter.matches(transfer))
            .cloned()
            .collect();
        found.sort_by(|a, b| (b.requested_at, b.id).cmp(&(a.requested_at, a.id)));
        Ok(found)
    }

    fn commit_transfer(
        &self,
        unit: TransferUnitOfWork,
    ) -> Result<ValuationTransfer, RepositoryError> {
        let mut state = self.lock()?;

        // Validate everything before the first write.
        match &unit.transfer {
            TransferWrite::Insert(record) => {
                let duplicate = record.status == TransferStatus::Pending
                    && state.transfers.values().any(|existing| {
                        existing.valuation_id == record.valuation_id
                            && existing.status == TransferStatus::Pending
                    });
                if duplicate {
                    return Err(RepositoryError::Conflict(
                        "a pending transfer already exists for this valuation".to_string(),
                    ));
                }
            }
            TransferWrite::Update(record) => {
                let stored = state
                    .transfers
                    .get(&record.id)
                    .ok_or(RepositoryError::NotFound("transfer"))?;
                if stored.status != TransferStatus::Pending {
                    return Err(RepositoryError::Conflict(
                        "this transfer has already been handled".to_string(),
                    ));
                }
            }
        }
        if let Some(reassignment) = &unit.reassignment {
            if !state.valuations.contains_key(&reassignment.valuation_id) {
                return Err(RepositoryError::NotFound("valuation"));
            }
        }

        let record = match unit.transfer {
            TransferWrite::Insert(record) => ValuationTransfer {
                id: TransferId(bump(&mut state.seq.transfer)),
                ..record
            },
            TransferWrite::Update(record) => record,
        };
        if let Some(reassignment) = unit.reassignment {
            if let Some(valuation) = state.valuations.get_mut(&reassignment.valuation_id) {
                valuation.prepared_by = reassignment.to_user;
                valuation.transferred_at = Some(reassignment.transferred_at);
                valuation.transfer_notes = reassignment.notes;
                valuation.updated_at = reassignment.transferred_at;
            }
        }
        state.transfers.insert(record.id, record.clone());
        Ok(record)
    }
}

impl SketchRepository for MemoryStore {
    fn sketch(&self, valuation: ValuationId) -> Result<Option<ValuationSketch>, RepositoryError> {
        Ok(self.lock()?.sketches.get(&valuation).cloned())
    }

    fn save_sketch(
        &self,
        valuation: ValuationId,
        layout: SketchLayout,
        editor: UserId,
    ) -> Result<ValuationSketch, RepositoryError> {
        let mut state = self.lock()?;
        if !state.valuations.contains_key(&valuation) {
            return Err(RepositoryError::NotFound("valuation"));
        }
        let sketch = match state.sketches.get_mut(&valuation) {
            Some(sketch) => {
                sketch.layout = layout;
                sketch.updated_by = editor;
                sketch.updated_at = Utc::now();
                sketch.clone()
            }
            None => {
                let sketch = ValuationSketch::new(valuation, layout, editor);
                state.sketches.insert(valuation, sketch.clone());
                sketch
            }
        };
        Ok(sketch)
    }

    fn append_annotation(
        &self,
        valuation: ValuationId,
        annotation: Annotation,
        editor: UserId,
    ) -> Result<ValuationSketch, RepositoryError> {
        let mut state = self.lock()?;
        let sketch = state.sketch_mut(valuation)?;
        sketch.push(annotation);
        sketch.updated_by = editor;
        sketch.updated_at = Utc::now();
        Ok(sketch.clone())
    }

    fn refresh_sketch_bounds(
        &self,
        valuation: ValuationId,
    ) -> Result<ValuationSketch, RepositoryError> {
        let mut state = self.lock()?;
        let sketch = state.sketch_mut(valuation)?;
        if let Some(bounds) = sketch.computed_bounds() {
            sketch.bounds = Some(bounds);
            sketch.updated_at = Utc::now();
        }
        Ok(sketch.clone())
    }

    fn update_sketch_display(
        &self,
        valuation: ValuationId,
        display: DisplaySettings,
        editor: UserId,
    ) -> Result<ValuationSketch, RepositoryError> {
        let mut state = self.lock()?;
        let sketch = state.sketch_mut(valuation)?;
        sketch.display = display;
        sketch.updated_by = editor;
        sketch.updated_at = Utc::now();
        Ok(sketch.clone())
    }

    fn delete_sketch(&self, valuation: ValuationId) -> Result<(), RepositoryError> {
        self.lock()?
            .sketches
            .remove(&valuation)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound("sketch"))
    }
}

impl TemplateRepository for MemoryStore {
    fn insert_template(
        &self,
        template: NewReportTemplate,
    ) -> Result<ReportTemplate, RepositoryError> {
        let mut state = self.lock()?;
        let id = ReportTemplateId(bump(&mut state.seq.template));
        let record = ReportTemplate {
            id,
            name_en: template.name_en,
            name_ar: template.name_ar,
            template_type: template.template_type,
            to_whom_type_id: template.to_whom_type_id,
            description: template.description,
            styling: template.styling,
            is_active: template.is_active,
        };
        state.templates.insert(id, record.clone());
        Ok(record)
    }

    fn template(&self, id: ReportTemplateId) -> Result<Option<ReportTemplate>, RepositoryError> {
        Ok(self.lock()?.templates.get(&id).cloned())
    }

    fn templates(&self, active_only: bool) -> Result<Vec<ReportTemplate>, RepositoryError> {
        Ok(self
            .lock()?
            .templates
            .values()
            .filter(|template| !active_only || template.is_active)
            .cloned()
            .collect())
    }

    fn insert_to_whom_type(&self, to_whom: NewToWhomType) -> Result<ToWhomType, RepositoryError> {
        let mut state = self.lock()?;
        let id = ToWhomTypeId(bump(&mut state.seq.to_whom));
        let record = ToWhomType {
            id,
            name_en: to_whom.name_en,
            name_ar: to_whom.name_ar,
            kind: to_whom.kind,
            template_id: to_whom.template_id,
            description: to_whom.description,
            is_active: true,
        };
        state.to_whom_types.insert(id, record.clone());
        Ok(record)
    }

    fn to_whom_type(&self, id: ToWhomTypeId) -> Result<Option<ToWhomType>, RepositoryError> {
        Ok(self.lock()?.to_whom_types.get(&id).cloned())
    }

    fn to_whom_types(&self) -> Result<Vec<ToWhomType>, RepositoryError> {
        Ok(self.lock()?.to_whom_types.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::sketches::{AnnotationId, Landmark, LandmarkType, SketchType};
    use crate::transfers::{Reassignment, TransferPriority, TransferType};
    use crate::valuations::{PropertyDetails, ReportDetails, ValuationResults, ValuationStatus};

    fn valuation(id: u64, preparer: u64) -> Valuation {
        let now = Utc::now();
        Valuation {
            id: ValuationId(id),
            valuation_number: format!("VAL-20250101-{id:016}"),
            status: ValuationStatus::InProgress,
            prepared_by: UserId(preparer),
            inspected_by: None,
            client_id: None,
            to_whom_type_id: None,
            property: PropertyDetails::default(),
            results: ValuationResults::default(),
            report: ReportDetails::default(),
            location: Some(GeoPoint::new(24.7, 46.7)),
            is_active: true,
            transferred_at: None,
            transfer_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn pending(valuation: u64, to: u64) -> ValuationTransfer {
        ValuationTransfer {
            id: TransferId(0),
            valuation_id: ValuationId(valuation),
            from_user_id: UserId(1),
            to_user_id: UserId(to),
            reason: "moved to new team".to_string(),
            priority: TransferPriority::Medium,
            due_date: None,
            notes: Some("handover".to_string()),
            transfer_type: TransferType::Permanent,
            status: TransferStatus::Pending,
            requires_approval: true,
            approved_by: None,
            approval_notes: None,
            rejection_reason: None,
            requested_at: Utc::now(),
            approved_at: None,
            cancelled_at: None,
            processed_at: None,
        }
    }

    #[test]
    fn second_pending_insert_on_same_valuation_conflicts() {
        let store = MemoryStore::new();
        store.import_valuation(valuation(42, 1)).expect("imported");

        let first = store
            .commit_transfer(TransferUnitOfWork {
                transfer: TransferWrite::Insert(pending(42, 7)),
                reassignment: None,
            })
            .expect("first pending transfer");
        assert_eq!(first.id, TransferId(1));

        let err = store
            .commit_transfer(TransferUnitOfWork {
                transfer: TransferWrite::Insert(pending(42, 8)),
                reassignment: None,
            })
            .expect_err("second pending transfer rejected");
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[test]
    fn failed_reassignment_leaves_transfer_untouched() {
        let store = MemoryStore::new();
        store.import_valuation(valuation(42, 1)).expect("imported");
        let stored = store
            .commit_transfer(TransferUnitOfWork {
                transfer: TransferWrite::Insert(pending(42, 7)),
                reassignment: None,
            })
            .expect("pending transfer");

        let approved = ValuationTransfer {
            status: TransferStatus::Approved,
            ..stored.clone()
        };
        let err = store
            .commit_transfer(TransferUnitOfWork {
                transfer: TransferWrite::Update(approved),
                reassignment: Some(Reassignment {
                    valuation_id: ValuationId(404),
                    to_user: UserId(7),
                    transferred_at: Utc::now(),
                    notes: None,
                }),
            })
            .expect_err("missing valuation aborts the unit");
        assert_eq!(err, RepositoryError::NotFound("valuation"));

        let current = store
            .transfer(stored.id)
            .expect("store available")
            .expect("transfer kept");
        assert_eq!(current.status, TransferStatus::Pending);
    }

    #[test]
    fn updates_to_handled_transfers_conflict() {
        let store = MemoryStore::new();
        store.import_valuation(valuation(42, 1)).expect("imported");
        let stored = store
            .commit_transfer(TransferUnitOfWork {
                transfer: TransferWrite::Insert(pending(42, 7)),
                reassignment: None,
            })
            .expect("pending transfer");
        let cancelled = ValuationTransfer {
            status: TransferStatus::Cancelled,
            ..stored
        };
        store
            .commit_transfer(TransferUnitOfWork {
                transfer: TransferWrite::Update(cancelled.clone()),
                reassignment: None,
            })
            .expect("cancel applied");
        let err = store
            .commit_transfer(TransferUnitOfWork {
                transfer: TransferWrite::Update(cancelled),
                reassignment: None,
            })
            .expect_err("second update rejected");
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[test]
    fn role_slug_and_level_are_unique() {
        let store = MemoryStore::new();
        let input = |slug: &str, level: u8| RoleInput {
            slug: slug.to_string(),
            name_en: slug.to_string(),
            name_ar: None,
            description: None,
            level,
            is_active: true,
            permission_ids: Vec::new(),
        };
        let role = store.insert_role(input("auditor", 4)).expect("role created");
        assert_eq!(role.name_ar, "auditor");
        assert!(matches!(
            store.insert_role(input("auditor", 5)),
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            store.insert_role(input("reviewer", 4)),
            Err(RepositoryError::Conflict(_))
        ));
        store
            .update_role(role.id, input("auditor", 6))
            .expect("a role may keep its own slug");
    }

    #[test]
    fn annotations_append_to_existing_sketch_only() {
        let store = MemoryStore::new();
        store.import_valuation(valuation(3, 1)).expect("imported");
        let landmark = Annotation::Landmark(Landmark {
            id: AnnotationId("lmk-000009".to_string()),
            latitude: 24.71,
            longitude: 46.68,
            name: "School".to_string(),
            landmark_type: LandmarkType::School,
            icon: LandmarkType::School.icon().to_string(),
            description: None,
        });
        assert_eq!(
            store
                .append_annotation(ValuationId(3), landmark.clone(), UserId(1))
                .expect_err("no sketch yet"),
            RepositoryError::NotFound("sketch")
        );

        let layout = SketchLayout {
            title: Some("Site".to_string()),
            description: None,
            sketch_type: SketchType::DigitalMap,
            image_path: None,
            center: None,
            zoom_level: 15,
            notes: None,
        };
        store
            .save_sketch(ValuationId(3), layout.clone(), UserId(1))
            .expect("sketch created");
        let sketch = store
            .append_annotation(ValuationId(3), landmark, UserId(2))
            .expect("appended");
        assert_eq!(sketch.landmarks.len(), 1);
        assert_eq!(sketch.updated_by, UserId(2));

        let saved = store
            .save_sketch(ValuationId(3), layout, UserId(1))
            .expect("layout replaced");
        assert_eq!(saved.landmarks.len(), 1, "saving keeps annotations");
    }
}
