use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::geo::GeoPoint;
use crate::identity::{
    Caller, ClientKind, IdentityRepository, NewClient, Permission, PermissionId, ResolvedRole,
    Role, RoleId, User, UserId,
};
use crate::reports::{
    DocumentRenderer, NewReportTemplate, NewToWhomType, Orientation, RecipientKind, RenderError,
    RenderRequest, RenderedDocument, ReportService, TemplateRepository, TemplateStyling,
    TemplateType,
};
use crate::store::MemoryStore;
use crate::valuations::{
    PropertyDetails, ReportDetails, Valuation, ValuationId, ValuationResults, ValuationStatus,
};

pub(super) const BANK_VALUATION: ValuationId = ValuationId(42);
pub(super) const PLAIN_VALUATION: ValuationId = ValuationId(43);

/// Captures every request and answers with a tiny PDF.
#[derive(Debug, Default)]
pub(super) struct RecordingRenderer {
    requests: Mutex<Vec<RenderRequest>>,
}

impl RecordingRenderer {
    pub(super) fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().expect("renderer lock").clone()
    }
}

impl DocumentRenderer for RecordingRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderedDocument, RenderError> {
        self.requests
            .lock()
            .expect("renderer lock")
            .push(request.clone());
        Ok(RenderedDocument::pdf(b"%PDF-1.7 test".to_vec()))
    }
}

#[derive(Debug, Default)]
pub(super) struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderedDocument, RenderError> {
        Err(RenderError::View {
            view: request.view.clone(),
            reason: "font missing".to_string(),
        })
    }
}

pub(super) fn template(name: &str, template_type: TemplateType) -> NewReportTemplate {
    NewReportTemplate {
        name_en: name.to_string(),
        name_ar: name.to_string(),
        template_type,
        to_whom_type_id: None,
        description: None,
        styling: TemplateStyling::default(),
        is_active: true,
    }
}

fn valuation(id: ValuationId) -> Valuation {
    let now = Utc::now();
    Valuation {
        id,
        valuation_number: format!("VAL-20250512-{:016}", id.0),
        status: ValuationStatus::Completed,
        prepared_by: UserId(1),
        inspected_by: None,
        client_id: None,
        to_whom_type_id: None,
        property: PropertyDetails {
            property_type: Some("villa".to_string()),
            city: Some("Jeddah".to_string()),
            district: Some("Al Rawdah".to_string()),
            street_name: Some("Prince Sultan Rd".to_string()),
            land_area: Some(600.0),
            building_area: Some(300.0),
            basement_area: Some(120.0),
            attachments_area: Some(30.0),
            ..PropertyDetails::default()
        },
        results: ValuationResults {
            final_value: Some(2_400_000.0),
            ..ValuationResults::default()
        },
        report: ReportDetails::default(),
        location: Some(GeoPoint::new(21.5433, 39.1728)),
        is_active: true,
        transferred_at: None,
        transfer_notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// Store holding a general template (1), a landscape bank template (2), an inactive court
/// template (3), and a bank recipient type pointing at template 2.
///
/// Valuation 42 is addressed to the bank and has a client; valuation 43 has neither and no
/// reference number.
pub(super) fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .import_user(User {
            id: UserId(1),
            name: "Sara Haddad".to_string(),
            email: "sara@valuation.test".to_string(),
            phone: None,
            job_title: Some("Certified Valuator".to_string()),
            is_active: true,
            role_ids: Vec::new(),
            created_at: Utc::now(),
        })
        .expect("user imported");
    let client = store
        .insert_client(NewClient {
            name: "Nasser Al Harbi".to_string(),
            email: None,
            phone: Some("0559876543".to_string()),
            kind: ClientKind::Client,
            address: None,
        })
        .expect("client inserted");

    store
        .insert_template(template("Standard Report", TemplateType::General))
        .expect("general template");
    let bank_template = store
        .insert_template(NewReportTemplate {
            styling: TemplateStyling {
                orientation: Some(Orientation::Landscape),
                margin_top: Some(25),
                ..TemplateStyling::default()
            },
            ..template("Bank Report", TemplateType::Bank)
        })
        .expect("bank template");
    store
        .insert_template(NewReportTemplate {
            is_active: false,
            ..template("Court Report", TemplateType::Court)
        })
        .expect("court template");
    let bank = store
        .insert_to_whom_type(NewToWhomType {
            name_en: "Al Rajhi Bank".to_string(),
            name_ar: "مصرف الراجحي".to_string(),
            kind: RecipientKind::Bank,
            template_id: Some(bank_template.id),
            description: None,
        })
        .expect("recipient type");

    let mut addressed = valuation(BANK_VALUATION);
    addressed.client_id = Some(client.id);
    addressed.to_whom_type_id = Some(bank.id);
    addressed.report.reference_number = Some("RPT/2025 07".to_string());
    addressed.report.specific_entity = Some("Mortgage Department".to_string());
    store.import_valuation(addressed).expect("valuation imported");
    store
        .import_valuation(valuation(PLAIN_VALUATION))
        .expect("valuation imported");
    store
}

pub(super) fn build_service() -> (
    ReportService<MemoryStore, RecordingRenderer>,
    Arc<MemoryStore>,
    Arc<RecordingRenderer>,
) {
    let store = seeded_store();
    let renderer = Arc::new(RecordingRenderer::default());
    (
        ReportService::new(store.clone(), renderer.clone()),
        store,
        renderer,
    )
}

pub(super) fn caller(permissions: &[&str]) -> Caller {
    Caller {
        id: UserId(1),
        name: "Sara Haddad".to_string(),
        is_active: true,
        roles: vec![ResolvedRole {
            role: Role {
                id: RoleId(5),
                slug: "certified-valuator".to_string(),
                name_en: "Certified Valuator".to_string(),
                name_ar: "مقيم معتمد".to_string(),
                description: None,
                level: 5,
                is_active: true,
                permission_ids: Vec::new(),
            },
            permissions: permissions
                .iter()
                .enumerate()
                .map(|(index, name)| {
                    let (module, action) = name.split_once('.').unwrap_or((name, ""));
                    Permission {
                        id: PermissionId(index as u64 + 1),
                        name: name.to_string(),
                        display_name_en: name.to_string(),
                        display_name_ar: name.to_string(),
                        module: module.to_string(),
                        action: action.to_string(),
                        resource: module.to_string(),
                    }
                })
                .collect(),
        }],
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
