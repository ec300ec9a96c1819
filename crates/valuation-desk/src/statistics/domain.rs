use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::transfers::{TransferId, TransferStatus};
use crate::valuations::ValuationStatus;

/// Statuses shown on the dashboard breakdown, in display order.
pub const DASHBOARD_STATUSES: [ValuationStatus; 5] = [
    ValuationStatus::Draft,
    ValuationStatus::Pending,
    ValuationStatus::InProgress,
    ValuationStatus::Completed,
    ValuationStatus::Rejected,
];

pub const RECENT_TRANSFERS_LIMIT: usize = 10;
pub const RECENT_ACTIVITY_PER_SOURCE: usize = 5;
pub const RECENT_ACTIVITY_LIMIT: usize = 10;
pub const MONTHLY_WINDOW: u32 = 12;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_valuations: usize,
    pub active_users: usize,
    pub pending_valuations: usize,
    pub pending_transfers: usize,
    pub completed_valuations: usize,
    pub rejected_valuations: usize,
    pub monthly_valuations: Vec<MonthlyCount>,
    pub property_types: Vec<PropertyTypeCount>,
    pub users_by_role: Vec<RoleUsers>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyTypeCount {
    #[serde(rename = "type")]
    pub property_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleUsers {
    pub role: String,
    pub level: u8,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: ValuationStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSummary {
    pub id: TransferId,
    pub valuation_title: String,
    pub from_user_name: String,
    pub to_user_name: String,
    pub status: TransferStatus,
    pub reason: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ValuationCreated,
    TransferCreated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub user: String,
    pub occurred_at: DateTime<Utc>,
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
