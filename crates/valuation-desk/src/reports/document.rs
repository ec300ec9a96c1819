use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::domain::{ReportTemplate, ToWhomType};
use crate::identity::{Client, User};
use crate::sketches::ValuationSketch;
use crate::valuations::Valuation;

/// Flat key/value payload handed to the renderer. Keys are dotted section paths such as
/// `property_info.location` or `areas.total_building_area`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReportDocument {
    entries: BTreeMap<String, Value>,
}

impl ReportDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// Everything the report shows about one valuation, loaded up front.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub valuation: &'a Valuation,
    pub preparer: Option<&'a User>,
    pub client: Option<&'a Client>,
    pub to_whom: Option<&'a ToWhomType>,
    pub sketch: Option<&'a ValuationSketch>,
    pub template: Option<&'a ReportTemplate>,
    pub generated_at: DateTime<Utc>,
}

impl ReportContext<'_> {
    pub fn assemble(&self) -> ReportDocument {
        let valuation = self.valuation;
        let property = &valuation.property;
        let report = &valuation.report;
        let mut doc = ReportDocument::new();

        doc.insert("report.date", self.generated_at.format("%Y-%m-%d").to_string());
        doc.insert("report.time", self.generated_at.format("%H:%M:%S").to_string());
        doc.insert(
            "report.template_id",
            self.template.map(|template| template.id.0),
        );

        doc.insert("basic_info.valuation_number", valuation.valuation_number.as_str());
        doc.insert("basic_info.status", valuation.status.label());
        doc.insert("basic_info.reference_number", report.reference_number.clone());
        doc.insert("basic_info.valuation_purpose", report.valuation_purpose.clone());
        doc.insert(
            "basic_info.valuator_name",
            report
                .valuator_name
                .clone()
                .or_else(|| self.preparer.map(|user| user.name.clone())),
        );
        doc.insert(
            "basic_info.valuator_license",
            report.valuator_license_number.clone(),
        );
        doc.insert(
            "basic_info.client_name",
            self.client.map(|client| client.name.clone()),
        );
        doc.insert(
            "basic_info.client_phone",
            self.client.and_then(|client| client.phone.clone()),
        );
        doc.insert(
            "basic_info.inspection_date",
            report.inspection_date.map(|date| date.to_string()),
        );

        doc.insert(
            "to_whom_info.type",
            self.to_whom.map(|to_whom| to_whom.display_name().to_string()),
        );
        doc.insert("to_whom_info.entity", report.specific_entity.clone());
        doc.insert("to_whom_info.branch_details", report.branch_details.clone());
        doc.insert("to_whom_info.urgency_level", report.urgency_level.clone());

        doc.insert("property_info.type", property.property_type.clone());
        doc.insert("property_info.usage", property.current_usage.clone());
        doc.insert("property_info.condition", property.property_condition.clone());
        doc.insert("property_info.location", property.location_label());
        doc.insert(
            "property_info.latitude",
            valuation.location.map(|point| point.latitude),
        );
        doc.insert(
            "property_info.longitude",
            valuation.location.map(|point| point.longitude),
        );
        doc.insert("property_info.plot_number", property.plot_number.clone());
        doc.insert("property_info.plan_number", property.plan_number.clone());
        doc.insert("property_info.deed_number", property.deed_number.clone());
        doc.insert("property_info.owner_name", property.owner_name.clone());
        doc.insert("property_info.building_age", property.building_age);
        doc.insert("property_info.total_floors", property.total_floors);

        doc.insert("areas.land_area", property.land_area);
        doc.insert("areas.building_area", property.building_area);
        doc.insert("areas.basement_area", property.basement_area);
        doc.insert("areas.attachments_area", property.attachments_area);
        doc.insert("areas.total_building_area", property.total_building_area());

        let results = &valuation.results;
        doc.insert("results.market_value", results.market_value);
        doc.insert("results.land_value", results.land_value);
        doc.insert("results.building_value", results.building_value);
        doc.insert("results.final_value", results.final_value);
        doc.insert("results.value_in_words", results.value_in_words.clone());

        doc.insert("additional_info.work_scope", report.work_scope.clone());
        doc.insert(
            "additional_info.special_assumptions",
            report.special_assumptions.clone(),
        );

        doc.insert("sketch.present", self.sketch.is_some());
        if let Some(sketch) = self.sketch {
            doc.insert("sketch.image_path", sketch.layout.image_path.clone());
            doc.insert("sketch.valuation_points", sketch.valuation_points.len());
            doc.insert("sketch.comparable_points", sketch.comparable_points.len());
            doc.insert("sketch.landmarks", sketch.landmarks.len());
        }

        doc
    }
}
