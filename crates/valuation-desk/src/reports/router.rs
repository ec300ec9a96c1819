use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use serde::Deserialize;

use super::domain::{
    AvailableTemplates, NewReportTemplate, NewToWhomType, ReportTemplate, ReportTemplateId,
    ToWhomType,
};
use super::render::DocumentRenderer;
use super::repository::TemplateRepository;
use super::service::{ReportPreview, ReportService};
use crate::api::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult, Envelope, ErrorCode};
use crate::identity::{Caller, IdentityRepository};
use crate::sketches::SketchRepository;
use crate::valuations::{ValuationId, ValuationRepository};

/// Router builder exposing report export and template administration.
pub fn report_router<S, D>(service: Arc<ReportService<S, D>>) -> Router
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + SketchRepository + 'static,
    D: DocumentRenderer + 'static,
{
    Router::new()
        .route(
            "/api/v1/valuations/:valuation_id/report",
            get(export_handler::<S, D>),
        )
        .route(
            "/api/v1/valuations/:valuation_id/report/preview",
            get(preview_handler::<S, D>),
        )
        .route(
            "/api/v1/valuations/:valuation_id/report/templates",
            get(available_templates_handler::<S, D>),
        )
        .route(
            "/api/v1/report-templates",
            get(list_templates_handler::<S, D>).post(create_template_handler::<S, D>),
        )
        .route(
            "/api/v1/to-whom-types",
            get(list_to_whom_handler::<S, D>).post(create_to_whom_handler::<S, D>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TemplateParams {
    #[serde(default)]
    template_id: Option<u64>,
}

pub(crate) async fn export_handler<S, D>(
    State(service): State<Arc<ReportService<S, D>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiQuery(params): ApiQuery<TemplateParams>,
) -> Result<Response, ApiError>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + SketchRepository + 'static,
    D: DocumentRenderer + 'static,
{
    caller.require("valuations.export_pdf")?;
    let report = service.export(
        ValuationId(valuation_id),
        params.template_id.map(ReportTemplateId),
    )?;

    let content_type = HeaderValue::from_str(report.content_type.as_ref())
        .map_err(|err| ApiError::internal(ErrorCode::RenderFailed, &err))?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        report.filename
    ))
    .map_err(|err| ApiError::internal(ErrorCode::RenderFailed, &err))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response())
}

pub(crate) async fn preview_handler<S, D>(
    State(service): State<Arc<ReportService<S, D>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiQuery(params): ApiQuery<TemplateParams>,
) -> ApiResult<ReportPreview>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + SketchRepository + 'static,
    D: DocumentRenderer + 'static,
{
    caller.require("valuations.export_pdf")?;
    Ok(Envelope::ok(service.preview(
        ValuationId(valuation_id),
        params.template_id.map(ReportTemplateId),
    )?))
}

pub(crate) async fn available_templates_handler<S, D>(
    State(service): State<Arc<ReportService<S, D>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
) -> ApiResult<AvailableTemplates>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + SketchRepository + 'static,
    D: DocumentRenderer + 'static,
{
    caller.require("valuations.export_pdf")?;
    Ok(Envelope::ok(
        service.available_templates(ValuationId(valuation_id))?,
    ))
}

pub(crate) async fn list_templates_handler<S, D>(
    State(service): State<Arc<ReportService<S, D>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<ReportTemplate>>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + SketchRepository + 'static,
    D: DocumentRenderer + 'static,
{
    caller.require("templates.read")?;
    Ok(Envelope::ok(service.templates()?))
}

pub(crate) async fn create_template_handler<S, D>(
    State(service): State<Arc<ReportService<S, D>>>,
    Extension(caller): Extension<Caller>,
    ApiJson(template): ApiJson<NewReportTemplate>,
) -> ApiResult<ReportTemplate>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + SketchRepository + 'static,
    D: DocumentRenderer + 'static,
{
    caller.require("templates.create")?;
    let created = service.create_template(template)?;
    Ok(Envelope::created(created).with_message("report template created"))
}

pub(crate) async fn list_to_whom_handler<S, D>(
    State(service): State<Arc<ReportService<S, D>>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<ToWhomType>>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + SketchRepository + 'static,
    D: DocumentRenderer + 'static,
{
    caller.require("templates.read")?;
    Ok(Envelope::ok(service.to_whom_types()?))
}

pub(crate) async fn create_to_whom_handler<S, D>(
    State(service): State<Arc<ReportService<S, D>>>,
    Extension(caller): Extension<Caller>,
    ApiJson(to_whom): ApiJson<NewToWhomType>,
) -> ApiResult<ToWhomType>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + SketchRepository + 'static,
    D: DocumentRenderer + 'static,
{
    caller.require("templates.create")?;
    let created = service.create_to_whom_type(to_whom)?;
    Ok(Envelope::created(created).with_message("recipient type created"))
}
