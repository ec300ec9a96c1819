use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use chrono::Utc;
use serde::Deserialize;

use super::domain::{ActivityEntry, DashboardStats, RoleUsers, StatusCount, TransferSummary};
use super::service::StatisticsService;
use crate::api::{ApiError, ApiQuery, ApiResult, Envelope};
use crate::identity::{Caller, IdentityRepository};
use crate::transfers::TransferRepository;
use crate::valuations::{ValuationRepository, ValuationStatus};

/// Router builder exposing dashboard aggregates and the CSV export.
pub fn statistics_router<S>(service: Arc<StatisticsService<S>>) -> Router
where
    S: ValuationRepository + TransferRepository + IdentityRepository + 'static,
{
    Router::new()
        .route("/api/v1/dashboard/stats", get(dashboard_handler::<S>))
        .route(
            "/api/v1/dashboard/valuations-by-status",
            get(by_status_handler::<S>),
        )
        .route(
            "/api/v1/dashboard/recent-transfers",
            get(recent_transfers_handler::<S>),
        )
        .route(
            "/api/v1/dashboard/recent-activity",
            get(recent_activity_handler::<S>),
        )
        .route("/api/v1/dashboard/roles", get(roles_handler::<S>))
        .route(
            "/api/v1/reports/valuations.csv",
            get(export_csv_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn dashboard_handler<S>(
    State(service): State<Arc<StatisticsService<S>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<DashboardStats>
where
    S: ValuationRepository + TransferRepository + IdentityRepository + 'static,
{
    caller.require("reports.view")?;
    Ok(Envelope::ok(service.dashboard()?))
}

pub(crate) async fn by_status_handler<S>(
    State(service): State<Arc<StatisticsService<S>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<StatusCount>>
where
    S: ValuationRepository + TransferRepository + IdentityRepository + 'static,
{
    caller.require("reports.view")?;
    Ok(Envelope::ok(service.by_status()?))
}

pub(crate) async fn recent_transfers_handler<S>(
    State(service): State<Arc<StatisticsService<S>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<TransferSummary>>
where
    S: ValuationRepository + TransferRepository + IdentityRepository + 'static,
{
    caller.require("reports.view")?;
    Ok(Envelope::ok(service.recent_transfers()?))
}

pub(crate) async fn recent_activity_handler<S>(
    State(service): State<Arc<StatisticsService<S>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<ActivityEntry>>
where
    S: ValuationRepository + TransferRepository + IdentityRepository + 'static,
{
    caller.require("reports.view")?;
    Ok(Envelope::ok(service.recent_activity()?))
}

pub(crate) async fn roles_handler<S>(
    State(service): State<Arc<StatisticsService<S>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<RoleUsers>>
where
    S: ValuationRepository + TransferRepository + IdentityRepository + 'static,
{
    caller.require("reports.view")?;
    Ok(Envelope::ok(service.users_by_role()?))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportParams {
    #[serde(default)]
    status: Option<ValuationStatus>,
}

pub(crate) async fn export_csv_handler<S>(
    State(service): State<Arc<StatisticsService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(params): ApiQuery<ExportParams>,
) -> Result<Response, ApiError>
where
    S: ValuationRepository + TransferRepository + IdentityRepository + 'static,
{
    caller.require("reports.export")?;
    let bytes = service.export_csv(params.status)?;
    let disposition = format!(
        "attachment; filename=\"valuations_{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
