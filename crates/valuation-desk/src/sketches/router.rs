use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;

use super::domain::{
    AddComparablePoint, AddLandmark, AddValuationPoint, DisplaySettings, DisplayUpdate,
    LandmarkTypeEntry, NearbyValuation, SaveSketchRequest, ValuationSketch,
};
use super::repository::SketchRepository;
use super::service::SketchService;
use crate::api::{ApiJson, ApiPath, ApiQuery, ApiResult, Envelope};
use crate::geo::GeoPoint;
use crate::identity::Caller;
use crate::validation::ValidationErrors;
use crate::valuations::{ValuationId, ValuationRepository};

/// Router builder exposing sketch reads and annotation writes.
pub fn sketch_router<S>(service: Arc<SketchService<S>>) -> Router
where
    S: SketchRepository + ValuationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/sketches/landmark-types",
            get(landmark_types_handler::<S>),
        )
        .route(
            "/api/v1/sketches/default-display",
            get(default_display_handler::<S>),
        )
        .route("/api/v1/sketches/nearby", get(nearby_handler::<S>))
        .route(
            "/api/v1/valuations/:valuation_id/sketch",
            get(show_handler::<S>)
                .post(save_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route(
            "/api/v1/valuations/:valuation_id/sketch/valuation-points",
            post(add_valuation_point_handler::<S>),
        )
        .route(
            "/api/v1/valuations/:valuation_id/sketch/comparable-points",
            post(add_comparable_point_handler::<S>),
        )
        .route(
            "/api/v1/valuations/:valuation_id/sketch/landmarks",
            post(add_landmark_handler::<S>),
        )
        .route(
            "/api/v1/valuations/:valuation_id/sketch/bounds",
            post(update_bounds_handler::<S>),
        )
        .route(
            "/api/v1/valuations/:valuation_id/sketch/display",
            put(update_display_handler::<S>),
        )
        .route(
            "/api/v1/valuations/:valuation_id/sketch/nearby",
            get(sketch_nearby_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn show_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
) -> ApiResult<ValuationSketch>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.read")?;
    Ok(Envelope::ok(service.show(ValuationId(valuation_id))?))
}

pub(crate) async fn save_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiJson(request): ApiJson<SaveSketchRequest>,
) -> ApiResult<ValuationSketch>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.update")?;
    let sketch = service.save(&caller, ValuationId(valuation_id), request)?;
    Ok(Envelope::ok(sketch).with_message("sketch saved"))
}

pub(crate) async fn delete_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
) -> ApiResult<()>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.update")?;
    service.delete(ValuationId(valuation_id))?;
    Ok(Envelope::ok(()).with_message("sketch deleted"))
}

pub(crate) async fn add_valuation_point_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiJson(request): ApiJson<AddValuationPoint>,
) -> ApiResult<ValuationSketch>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.update")?;
    let sketch = service.add_valuation_point(&caller, ValuationId(valuation_id), request)?;
    Ok(Envelope::ok(sketch).with_message("valuation point added"))
}

pub(crate) async fn add_comparable_point_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiJson(request): ApiJson<AddComparablePoint>,
) -> ApiResult<ValuationSketch>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.update")?;
    let sketch = service.add_comparable_point(&caller, ValuationId(valuation_id), request)?;
    Ok(Envelope::ok(sketch).with_message("comparable point added"))
}

pub(crate) async fn add_landmark_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiJson(request): ApiJson<AddLandmark>,
) -> ApiResult<ValuationSketch>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.update")?;
    let sketch = service.add_landmark(&caller, ValuationId(valuation_id), request)?;
    Ok(Envelope::ok(sketch).with_message("landmark added"))
}

pub(crate) async fn update_bounds_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
) -> ApiResult<ValuationSketch>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.update")?;
    Ok(Envelope::ok(service.update_bounds(ValuationId(valuation_id))?))
}

pub(crate) async fn update_display_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiJson(update): ApiJson<DisplayUpdate>,
) -> ApiResult<ValuationSketch>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.update")?;
    let sketch = service.update_display(&caller, ValuationId(valuation_id), update)?;
    Ok(Envelope::ok(sketch).with_message("display settings updated"))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NearbyParams {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    radius: Option<u32>,
    #[serde(default)]
    exclude: Option<u64>,
}

pub(crate) async fn nearby_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(params): ApiQuery<NearbyParams>,
) -> ApiResult<Vec<NearbyValuation>>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.read")?;
    let (Some(latitude), Some(longitude)) = (params.latitude, params.longitude) else {
        let mut errors = ValidationErrors::new();
        if params.latitude.is_none() {
            errors.add("latitude", "the latitude field is required");
        }
        if params.longitude.is_none() {
            errors.add("longitude", "the longitude field is required");
        }
        return Err(errors.into());
    };
    let found = service.nearby(
        GeoPoint::new(latitude, longitude),
        params.radius,
        params.exclude.map(ValuationId),
    )?;
    Ok(Envelope::ok(found))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RadiusParams {
    #[serde(default)]
    radius: Option<u32>,
}

pub(crate) async fn sketch_nearby_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(valuation_id): ApiPath<u64>,
    ApiQuery(params): ApiQuery<RadiusParams>,
) -> ApiResult<Vec<NearbyValuation>>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    caller.require("valuations.read")?;
    Ok(Envelope::ok(
        service.nearby_for(ValuationId(valuation_id), params.radius)?,
    ))
}

pub(crate) async fn landmark_types_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
) -> ApiResult<Vec<LandmarkTypeEntry>>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    Ok(Envelope::ok(service.landmark_types()))
}

pub(crate) async fn default_display_handler<S>(
    State(service): State<Arc<SketchService<S>>>,
) -> ApiResult<DisplaySettings>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    Ok(Envelope::ok(service.default_display()))
}
