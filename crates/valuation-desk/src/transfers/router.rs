use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{
    ApprovalRequest, RejectionRequest, TransferId, TransferRequest, TransferStats,
    TransferStatus, TransferType, ValuationTransfer,
};
use super::notify::TransferNotifier;
use super::repository::TransferRepository;
use super::service::{HistoryQuery, TransferService};
use crate::api::{ApiJson, ApiPath, ApiQuery, ApiResult, Envelope};
use crate::identity::{Caller, IdentityRepository};
use crate::pagination::{Page, PageRequest};
use crate::valuations::{ValuationId, ValuationRepository};

/// Router builder exposing the transfer workflow.
pub fn transfer_router<S, N>(service: Arc<TransferService<S, N>>) -> Router
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/valuations/:valuation_id/transfers",
            get(valuation_transfers_handler::<S, N>).post(request_handler::<S, N>),
        )
        .route("/api/v1/transfers/pending", get(pending_handler::<S, N>))
        .route("/api/v1/transfers/history", get(history_handler::<S, N>))
        .route("/api/v1/transfers/stats", get(stats_handler::<S, N>))
        .route(
            "/api/v1/transfers/:transfer_id/approve",
            post(approve_handler::<S, N>),
        )
        .route(
            "/api/v1/transfers/:transfer_id/reject",
            post(reject_handler::<S, N>),
        )
        .route(
            "/api/v1/transfers/:transfer_id/cancel",
            post(cancel_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn request_handler<S, N>(
    State(service): State<Arc<TransferService<S, N>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiJson(request): ApiJson<TransferRequest>,
) -> ApiResult<ValuationTransfer>
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    let transfer = service.request(&caller, ValuationId(valuation_id), request)?;
    let message = if transfer.status == TransferStatus::Pending {
        "transfer request submitted and awaiting approval"
    } else {
        "valuation transferred"
    };
    Ok(Envelope::created(transfer).with_message(message))
}

pub(crate) async fn valuation_transfers_handler<S, N>(
    State(service): State<Arc<TransferService<S, N>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
) -> ApiResult<Vec<ValuationTransfer>>
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    caller.require("valuations.read")?;
    Ok(Envelope::ok(
        service.for_valuation(ValuationId(valuation_id))?,
    ))
}

pub(crate) async fn approve_handler<S, N>(
    State(service): State<Arc<TransferService<S, N>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(transfer_id): ApiPath<u64>,
    body: Option<ApiJson<ApprovalRequest>>,
) -> ApiResult<ValuationTransfer>
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    let request = body.map(|ApiJson(request)| request).unwrap_or_default();
    let transfer = service.approve(&caller, TransferId(transfer_id), request)?;
    Ok(Envelope::ok(transfer).with_message("transfer approved"))
}

pub(crate) async fn reject_handler<S, N>(
    State(service): State<Arc<TransferService<S, N>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(transfer_id): ApiPath<u64>,
    ApiJson(request): ApiJson<RejectionRequest>,
) -> ApiResult<ValuationTransfer>
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    let transfer = service.reject(&caller, TransferId(transfer_id), request)?;
    Ok(Envelope::ok(transfer).with_message("transfer rejected"))
}

pub(crate) async fn cancel_handler<S, N>(
    State(service): State<Arc<TransferService<S, N>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(transfer_id): ApiPath<u64>,
) -> ApiResult<ValuationTransfer>
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    let transfer = service.cancel(&caller, TransferId(transfer_id))?;
    Ok(Envelope::ok(transfer).with_message("transfer cancelled"))
}

pub(crate) async fn pending_handler<S, N>(
    State(service): State<Arc<TransferService<S, N>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<ValuationTransfer>>
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    Ok(Envelope::ok(service.pending_for(&caller)?))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryParams {
    #[serde(default)]
    status: Option<TransferStatus>,
    #[serde(default)]
    transfer_type: Option<TransferType>,
    #[serde(default)]
    date_from: Option<NaiveDate>,
    #[serde(default)]
    date_to: Option<NaiveDate>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    per_page: Option<usize>,
}

pub(crate) async fn history_handler<S, N>(
    State(service): State<Arc<TransferService<S, N>>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> ApiResult<Page<ValuationTransfer>>
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    let query = HistoryQuery {
        status: params.status,
        transfer_type: params.transfer_type,
        date_from: params.date_from,
        date_to: params.date_to,
    };
    let page = PageRequest::new(params.page, params.per_page);
    Ok(Envelope::ok(service.history(&caller, query, page)?))
}

pub(crate) async fn stats_handler<S, N>(
    State(service): State<Arc<TransferService<S, N>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<TransferStats>
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    Ok(Envelope::ok(service.stats(&caller)?))
}
