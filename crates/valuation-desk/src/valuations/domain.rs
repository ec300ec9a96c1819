use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::identity::{ClientId, UserId};
use crate::reports::ToWhomTypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValuationId(pub u64);

impl fmt::Display for ValuationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationStatus {
    Draft,
    Pending,
    InProgress,
    Submitted,
    Completed,
    Approved,
    Rejected,
}

impl ValuationStatus {
    pub const ALL: [ValuationStatus; 7] = [
        ValuationStatus::Draft,
        ValuationStatus::Pending,
        ValuationStatus::InProgress,
        ValuationStatus::Submitted,
        ValuationStatus::Completed,
        ValuationStatus::Approved,
        ValuationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ValuationStatus::Draft => "draft",
            ValuationStatus::Pending => "pending",
            ValuationStatus::InProgress => "in_progress",
            ValuationStatus::Submitted => "submitted",
            ValuationStatus::Completed => "completed",
            ValuationStatus::Approved => "approved",
            ValuationStatus::Rejected => "rejected",
        }
    }

    /// Finished work that can no longer change hands.
    pub const fn is_locked(self) -> bool {
        matches!(self, ValuationStatus::Completed | ValuationStatus::Approved)
    }

    /// Statuses that occupy a preparer's workload slot.
    pub const fn counts_toward_workload(self) -> bool {
        matches!(self, ValuationStatus::Draft | ValuationStatus::InProgress)
    }

    pub const fn is_intake(self) -> bool {
        matches!(self, ValuationStatus::Draft | ValuationStatus::Pending)
    }
}

/// Physical and locational attributes of the appraised property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDetails {
    pub property_type: Option<String>,
    pub current_usage: Option<String>,
    pub property_condition: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub street_name: Option<String>,
    pub location_name: Option<String>,
    pub plot_number: Option<String>,
    pub plan_number: Option<String>,
    pub deed_number: Option<String>,
    pub owner_name: Option<String>,
    pub land_area: Option<f64>,
    pub building_area: Option<f64>,
    pub basement_area: Option<f64>,
    pub attachments_area: Option<f64>,
    pub building_age: Option<u32>,
    pub total_floors: Option<u32>,
}

impl PropertyDetails {
    pub fn total_building_area(&self) -> f64 {
        [self.building_area, self.basement_area, self.attachments_area]
            .into_iter()
            .flatten()
            .sum()
    }

    /// City, district, street, and location name joined with " - ", skipping blanks.
    pub fn location_label(&self) -> String {
        [
            &self.city,
            &self.district,
            &self.street_name,
            &self.location_name,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" - ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationResults {
    pub market_value: Option<f64>,
    pub land_value: Option<f64>,
    pub building_value: Option<f64>,
    pub final_value: Option<f64>,
    pub value_in_words: Option<String>,
}

/// Engagement metadata printed on the exported report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportDetails {
    pub reference_number: Option<String>,
    pub valuation_purpose: Option<String>,
    pub valuator_name: Option<String>,
    pub valuator_license_number: Option<String>,
    pub specific_entity: Option<String>,
    pub branch_details: Option<String>,
    pub urgency_level: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub work_scope: Option<String>,
    pub special_assumptions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub id: ValuationId,
    pub valuation_number: String,
    pub status: ValuationStatus,
    pub prepared_by: UserId,
    pub inspected_by: Option<UserId>,
    pub client_id: Option<ClientId>,
    pub to_whom_type_id: Option<ToWhomTypeId>,
    pub property: PropertyDetails,
    pub results: ValuationResults,
    pub report: ReportDetails,
    pub location: Option<GeoPoint>,
    pub is_active: bool,
    pub transferred_at: Option<DateTime<Utc>>,
    pub transfer_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Valuation {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.prepared_by == user || self.inspected_by == Some(user)
    }
}

/// Intake payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewValuation {
    #[serde(default)]
    pub status: Option<ValuationStatus>,
    #[serde(default)]
    pub prepared_by: Option<UserId>,
    #[serde(default)]
    pub inspected_by: Option<UserId>,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub to_whom_type_id: Option<ToWhomTypeId>,
    #[serde(default)]
    pub property: PropertyDetails,
    #[serde(default)]
    pub results: ValuationResults,
    #[serde(default)]
    pub report: ReportDetails,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Partial update; ownership only changes through a transfer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValuationUpdate {
    #[serde(default)]
    pub status: Option<ValuationStatus>,
    #[serde(default)]
    pub inspected_by: Option<UserId>,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub to_whom_type_id: Option<ToWhomTypeId>,
    #[serde(default)]
    pub property: Option<PropertyDetails>,
    #[serde(default)]
    pub results: Option<ValuationResults>,
    #[serde(default)]
    pub report: Option<ReportDetails>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}
