use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;

use super::domain::{NewValuation, Valuation, ValuationId, ValuationStatus, ValuationUpdate};
use super::repository::ValuationRepository;
use super::service::ValuationService;
use crate::api::{ApiJson, ApiPath, ApiQuery, ApiResult, Envelope};
use crate::identity::{Caller, IdentityRepository};
use crate::pagination::{Page, PageRequest};
use crate::reports::TemplateRepository;

/// Router builder for valuation records.
pub fn valuation_router<S>(service: Arc<ValuationService<S>>) -> Router
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/valuations",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/v1/valuations/:valuation_id",
            get(show_handler::<S>)
                .put(update_handler::<S>)
                .delete(deactivate_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ValuationQuery {
    #[serde(default)]
    status: Option<ValuationStatus>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    per_page: Option<usize>,
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<ValuationService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(query): ApiQuery<ValuationQuery>,
) -> ApiResult<Page<Valuation>>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + 'static,
{
    caller.require("valuations.read")?;
    let page = PageRequest::new(query.page, query.per_page);
    Ok(Envelope::ok(service.list(query.status, page)?))
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<ValuationService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<NewValuation>,
) -> ApiResult<Valuation>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + 'static,
{
    caller.require("valuations.create")?;
    let valuation = service.create(&caller, request)?;
    Ok(Envelope::created(valuation).with_message("valuation created"))
}

pub(crate) async fn show_handler<S>(
    State(service): State<Arc<ValuationService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
) -> ApiResult<Valuation>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + 'static,
{
    caller.require("valuations.read")?;
    Ok(Envelope::ok(service.get(ValuationId(valuation_id))?))
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<ValuationService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiJson(update): ApiJson<ValuationUpdate>,
) -> ApiResult<Valuation>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + 'static,
{
    caller.require("valuations.update")?;
    let valuation = service.update(ValuationId(valuation_id), update)?;
    Ok(Envelope::ok(valuation).with_message("valuation updated"))
}

pub(crate) async fn deactivate_handler<S>(
    State(service): State<Arc<ValuationService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
) -> ApiResult<Valuation>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + 'static,
{
    caller.require("valuations.delete")?;
    let valuation = service.deactivate(ValuationId(valuation_id))?;
    Ok(Envelope::ok(valuation).with_message("valuation deactivated"))
}
