//! Dashboard aggregates and tabular exports. Nothing here writes to the store.

pub mod domain;
pub mod export;
pub mod router;
pub mod service;

pub use domain::{
    ActivityEntry, ActivityKind, DashboardStats, MonthlyCount, PropertyTypeCount, RoleUsers,
    StatusCount, TransferSummary, DASHBOARD_STATUSES,
};
pub use export::ExportError;
pub use router::statistics_router;
pub use service::{monthly_counts, property_type_counts, StatisticsError, StatisticsService};
