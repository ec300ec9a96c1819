use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::geo::GeoPoint;
use crate::identity::{Caller, Permission, PermissionId, ResolvedRole, Role, RoleId, UserId};
use crate::sketches::{SaveSketchRequest, SketchService};
use crate::store::MemoryStore;
use crate::valuations::{
    PropertyDetails, ReportDetails, Valuation, ValuationId, ValuationResults, ValuationStatus,
};

pub(super) const SUBJECT: ValuationId = ValuationId(10);
pub(super) const NEAR: ValuationId = ValuationId(11);
pub(super) const MIDDLE: ValuationId = ValuationId(12);
pub(super) const FAR: ValuationId = ValuationId(13);
pub(super) const UNLOCATED: ValuationId = ValuationId(14);
pub(super) const ARCHIVED: ValuationId = ValuationId(15);

pub(super) const CENTER: GeoPoint = GeoPoint {
    latitude: 24.7136,
    longitude: 46.6753,
};

pub(super) fn valuation(id: ValuationId, location: Option<GeoPoint>) -> Valuation {
    let now = Utc::now();
    Valuation {
        id,
        valuation_number: format!("VAL-20250410-{:016}", id.0),
        status: ValuationStatus::InProgress,
        prepared_by: UserId(1),
        inspected_by: None,
        client_id: None,
        to_whom_type_id: None,
        property: PropertyDetails {
            property_type: Some("apartment".to_string()),
            city: Some("Riyadh".to_string()),
            district: Some("Al Olaya".to_string()),
            ..PropertyDetails::default()
        },
        results: ValuationResults {
            final_value: Some(850_000.0 + id.0 as f64),
            ..ValuationResults::default()
        },
        report: ReportDetails {
            reference_number: Some(format!("REF-{}", id.0)),
            ..ReportDetails::default()
        },
        location,
        is_active: true,
        transferred_at: None,
        transfer_notes: None,
        created_at: now,
        updated_at: now,
    }
}

fn offset(north: f64, east: f64) -> Option<GeoPoint> {
    Some(GeoPoint::new(CENTER.latitude + north, CENTER.longitude + east))
}

/// Subject valuation plus neighbours at roughly 100 m, 220 m, 560 m, and 2.2 km.
pub(super) fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let mut archived = valuation(ARCHIVED, offset(0.0, 0.001));
    archived.is_active = false;
    for record in [
        valuation(SUBJECT, Some(CENTER)),
        valuation(NEAR, offset(0.002, 0.0)),
        valuation(MIDDLE, offset(0.005, 0.0)),
        valuation(FAR, offset(0.02, 0.0)),
        valuation(UNLOCATED, None),
        archived,
    ] {
        store.import_valuation(record).expect("valuation imported");
    }
    store
}

pub(super) fn build_service() -> (SketchService<MemoryStore>, Arc<MemoryStore>) {
    let store = seeded_store();
    (SketchService::new(store.clone()), store)
}

pub(super) fn editor() -> Caller {
    caller(&["valuations.read", "valuations.update"])
}

pub(super) fn caller(permissions: &[&str]) -> Caller {
    Caller {
        id: UserId(1),
        name: "Sara Haddad".to_string(),
        is_active: true,
        roles: vec![ResolvedRole {
            role: Role {
                id: RoleId(4),
                slug: "senior-valuator".to_string(),
                name_en: "Senior Valuator".to_string(),
                name_ar: "مقيم أول".to_string(),
                description: None,
                level: 4,
                is_active: true,
                permission_ids: Vec::new(),
            },
            permissions: permissions
                .iter()
                .enumerate()
                .map(|(index, name)| Permission {
                    id: PermissionId(index as u64 + 1),
                    name: name.to_string(),
                    display_name_en: name.to_string(),
                    display_name_ar: name.to_string(),
                    module: "valuations".to_string(),
                    action: name.trim_start_matches("valuations.").to_string(),
                    resource: "valuations".to_string(),
                })
                .collect(),
        }],
    }
}

pub(super) fn titled(title: &str) -> SaveSketchRequest {
    SaveSketchRequest {
        title: Some(title.to_string()),
        ..SaveSketchRequest::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
