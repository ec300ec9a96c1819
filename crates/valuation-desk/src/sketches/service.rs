use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use super::domain::{
    AddComparablePoint, AddLandmark, AddValuationPoint, Annotation, AnnotationId, ComparablePoint,
    DisplaySettings, DisplayUpdate, Landmark, LandmarkType, LandmarkTypeEntry, NearbyValuation,
    SaveSketchRequest, SketchLayout, SketchType, ValuationPoint, ValuationSketch,
    DEFAULT_ZOOM_LEVEL, MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL,
};
use super::repository::SketchRepository;
use crate::api::ApiError;
use crate::geo::GeoPoint;
use crate::identity::Caller;
use crate::store::RepositoryError;
use crate::validation::ValidationErrors;
use crate::valuations::{Valuation, ValuationFilter, ValuationId, ValuationRepository};

pub const DEFAULT_NEARBY_RADIUS: u32 = 1000;
pub const MIN_NEARBY_RADIUS: u32 = 100;
pub const MAX_NEARBY_RADIUS: u32 = 10_000;

static ANNOTATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_annotation_id(prefix: &str) -> AnnotationId {
    let seq = ANNOTATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AnnotationId(format!("{prefix}-{seq:06}"))
}

/// Map sketches attached to valuations.
pub struct SketchService<S> {
    store: Arc<S>,
}

impl<S> SketchService<S>
where
    S: SketchRepository + ValuationRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn show(&self, valuation_id: ValuationId) -> Result<ValuationSketch, SketchError> {
        Ok(self
            .store
            .sketch(valuation_id)?
            .ok_or(RepositoryError::NotFound("sketch"))?)
    }

    /// Create-or-update. The center falls back to the valuation's own coordinates.
    pub fn save(
        &self,
        caller: &Caller,
        valuation_id: ValuationId,
        request: SaveSketchRequest,
    ) -> Result<ValuationSketch, SketchError> {
        let valuation = self.valuation(valuation_id)?;
        let existing = self.store.sketch(valuation_id)?;

        let mut errors = ValidationErrors::new();
        errors.max_length("title", request.title.as_deref(), 255);
        let zoom_level = request.zoom_level.unwrap_or(DEFAULT_ZOOM_LEVEL);
        errors.range("zoom_level", zoom_level, MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL);
        let radius = request.nearby_radius.unwrap_or(DEFAULT_NEARBY_RADIUS);
        if request.auto_populate_nearby {
            errors.range("nearby_radius", radius, MIN_NEARBY_RADIUS, MAX_NEARBY_RADIUS);
        }
        let center = match (request.center_latitude, request.center_longitude) {
            (Some(latitude), Some(longitude)) => {
                errors.range("center_latitude", latitude, -90.0, 90.0);
                errors.range("center_longitude", longitude, -180.0, 180.0);
                Some(GeoPoint::new(latitude, longitude))
            }
            (None, None) => valuation.location,
            (Some(_), None) => {
                errors.add(
                    "center_longitude",
                    "the center_longitude is required with a center_latitude",
                );
                None
            }
            (None, Some(_)) => {
                errors.add(
                    "center_latitude",
                    "the center_latitude is required with a center_longitude",
                );
                None
            }
        };
        errors.into_result()?;

        let sketch_type = request
            .sketch_type
            .or(existing.as_ref().map(|sketch| sketch.layout.sketch_type))
            .unwrap_or(SketchType::default());
        let layout = SketchLayout {
            title: request.title,
            description: request.description,
            sketch_type,
            image_path: request.image_path,
            center,
            zoom_level,
            notes: request.notes,
        };
        let mut sketch = self.store.save_sketch(valuation_id, layout, caller.id)?;
        info!(
            valuation = %valuation_id,
            created = existing.is_none(),
            editor = %caller.id,
            "sketch saved"
        );

        if request.auto_populate_nearby {
            sketch = self.populate_nearby(caller, &sketch, radius)?;
        }
        Ok(sketch)
    }

    /// Appends one valuation point whose id is the source valuation's id.
    pub fn add_valuation_point(
        &self,
        caller: &Caller,
        valuation_id: ValuationId,
        request: AddValuationPoint,
    ) -> Result<ValuationSketch, SketchError> {
        let target = request.target_valuation_id.ok_or_else(|| {
            ValidationErrors::single(
                "target_valuation_id",
                "the target_valuation_id field is required",
            )
        })?;
        let source = self.store.valuation(target)?.ok_or_else(|| {
            ValidationErrors::single(
                "target_valuation_id",
                format!("valuation {target} does not exist"),
            )
        })?;
        let point = valuation_point(&source, request.custom_data).ok_or_else(|| {
            ValidationErrors::single(
                "target_valuation_id",
                format!("valuation {target} has no coordinates"),
            )
        })?;

        let sketch = self.store.append_annotation(
            valuation_id,
            Annotation::ValuationPoint(point),
            caller.id,
        )?;
        debug!(valuation = %valuation_id, point = %target, "valuation point added");
        Ok(sketch)
    }

    pub fn add_comparable_point(
        &self,
        caller: &Caller,
        valuation_id: ValuationId,
        request: AddComparablePoint,
    ) -> Result<ValuationSketch, SketchError> {
        let mut errors = ValidationErrors::new();
        let location = required_point(&mut errors, request.latitude, request.longitude);
        if request.sale_price.is_some_and(|price| price < 0.0) {
            errors.add("sale_price", "the sale_price must be at least 0");
        }
        if request.area.is_some_and(|area| area < 0.0) {
            errors.add("area", "the area must be at least 0");
        }
        errors.into_result()?;
        let location = location.ok_or_else(|| {
            SketchError::Validation(ValidationErrors::single(
                "latitude",
                "the latitude field is required",
            ))
        })?;

        let point = ComparablePoint {
            id: next_annotation_id("cmp"),
            latitude: location.latitude,
            longitude: location.longitude,
            sale_price: request.sale_price,
            sale_date: request.sale_date,
            property_type: request.property_type,
            area: request.area,
            source: request.source.unwrap_or_else(|| "manual".to_string()),
            notes: request.notes,
        };
        let id = point.id.clone();
        let sketch = self.store.append_annotation(
            valuation_id,
            Annotation::ComparablePoint(point),
            caller.id,
        )?;
        debug!(valuation = %valuation_id, comparable = %id, "comparable point added");
        Ok(sketch)
    }

    pub fn add_landmark(
        &self,
        caller: &Caller,
        valuation_id: ValuationId,
        request: AddLandmark,
    ) -> Result<ValuationSketch, SketchError> {
        let mut errors = ValidationErrors::new();
        let location = required_point(&mut errors, request.latitude, request.longitude);
        errors.length("name", &request.name, 1, 255);
        if request.landmark_type.is_none() {
            errors.add("type", "the type field is required");
        }
        errors.into_result()?;
        let (Some(location), Some(landmark_type)) = (location, request.landmark_type) else {
            return Err(ValidationErrors::single("type", "the type field is required").into());
        };

        let landmark = Landmark {
            id: next_annotation_id("lmk"),
            latitude: location.latitude,
            longitude: location.longitude,
            name: request.name.trim().to_string(),
            landmark_type,
            icon: request
                .icon
                .filter(|icon| !icon.trim().is_empty())
                .unwrap_or_else(|| landmark_type.icon().to_string()),
            description: request.description,
        };
        let sketch = self.store.append_annotation(
            valuation_id,
            Annotation::Landmark(landmark),
            caller.id,
        )?;
        debug!(valuation = %valuation_id, kind = landmark_type.label(), "landmark added");
        Ok(sketch)
    }

    pub fn update_bounds(&self, valuation_id: ValuationId) -> Result<ValuationSketch, SketchError> {
        Ok(self.store.refresh_sketch_bounds(valuation_id)?)
    }

    /// Valuations with coordinates within `radius` meters of `center`, closest first.
    pub fn nearby(
        &self,
        center: GeoPoint,
        radius: Option<u32>,
        exclude: Option<ValuationId>,
    ) -> Result<Vec<NearbyValuation>, SketchError> {
        let mut errors = ValidationErrors::new();
        errors.range("latitude", center.latitude, -90.0, 90.0);
        errors.range("longitude", center.longitude, -180.0, 180.0);
        let radius = radius.unwrap_or(DEFAULT_NEARBY_RADIUS);
        errors.range("radius", radius, MIN_NEARBY_RADIUS, MAX_NEARBY_RADIUS);
        errors.into_result()?;

        Ok(self
            .within(center, radius, exclude)?
            .into_iter()
            .filter_map(|(valuation, distance)| {
                let location = valuation.location?;
                Some(NearbyValuation {
                    valuation_id: valuation.id,
                    valuation_number: valuation.valuation_number,
                    status: valuation.status,
                    latitude: location.latitude,
                    longitude: location.longitude,
                    property_type: valuation.property.property_type,
                    final_value: valuation.results.final_value,
                    distance_meters: distance,
                })
            })
            .collect())
    }

    /// Nearby lookup centred on the sketch (or the valuation) excluding the owner.
    pub fn nearby_for(
        &self,
        valuation_id: ValuationId,
        radius: Option<u32>,
    ) -> Result<Vec<NearbyValuation>, SketchError> {
        let valuation = self.valuation(valuation_id)?;
        let center = self
            .store
            .sketch(valuation_id)?
            .and_then(|sketch| sketch.layout.center)
            .or(valuation.location)
            .ok_or_else(|| {
                SketchError::Validation(ValidationErrors::single(
                    "center",
                    "the valuation has no coordinates to search around",
                ))
            })?;
        self.nearby(center, radius, Some(valuation_id))
    }

    pub fn update_display(
        &self,
        caller: &Caller,
        valuation_id: ValuationId,
        update: DisplayUpdate,
    ) -> Result<ValuationSketch, SketchError> {
        let mut display = self.show(valuation_id)?.display;
        if let Some(map) = &update.map {
            let mut errors = ValidationErrors::new();
            errors.range(
                "map.cluster_max_zoom",
                map.cluster_max_zoom,
                MIN_ZOOM_LEVEL,
                MAX_ZOOM_LEVEL,
            );
            errors.into_result()?;
        }
        update.apply(&mut display);
        Ok(self
            .store
            .update_sketch_display(valuation_id, display, caller.id)?)
    }

    pub fn delete(&self, valuation_id: ValuationId) -> Result<(), SketchError> {
        self.store.delete_sketch(valuation_id)?;
        info!(valuation = %valuation_id, "sketch deleted");
        Ok(())
    }

    pub fn landmark_types(&self) -> Vec<LandmarkTypeEntry> {
        LandmarkType::ALL
            .into_iter()
            .map(|landmark_type| LandmarkTypeEntry {
                landmark_type,
                icon: landmark_type.icon(),
            })
            .collect()
    }

    pub fn default_display(&self) -> DisplaySettings {
        DisplaySettings::default()
    }

    fn valuation(&self, id: ValuationId) -> Result<Valuation, SketchError> {
        Ok(self
            .store
            .valuation(id)?
            .ok_or(RepositoryError::NotFound("valuation"))?)
    }

    fn within(
        &self,
        center: GeoPoint,
        radius: u32,
        exclude: Option<ValuationId>,
    ) -> Result<Vec<(Valuation, f64)>, RepositoryError> {
        let located = ValuationFilter {
            located_only: true,
            ..ValuationFilter::default()
        };
        let radius = f64::from(radius);
        let mut found: Vec<(Valuation, f64)> = self
            .store
            .valuations(&located)?
            .into_iter()
            .filter(|valuation| Some(valuation.id) != exclude)
            .filter_map(|valuation| {
                let distance = center.distance_meters(&valuation.location?);
                (distance <= radius).then_some((valuation, distance))
            })
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(found)
    }

    /// Pins every nearby valuation not already on the sketch, then refreshes bounds.
    fn populate_nearby(
        &self,
        caller: &Caller,
        sketch: &ValuationSketch,
        radius: u32,
    ) -> Result<ValuationSketch, SketchError> {
        let Some(center) = sketch.layout.center else {
            return Ok(sketch.clone());
        };
        let mut added = 0usize;
        for (valuation, _) in self.within(center, radius, Some(sketch.valuation_id))? {
            if sketch
                .valuation_points
                .iter()
                .any(|point| point.id == valuation.id)
            {
                continue;
            }
            if let Some(point) = valuation_point(&valuation, serde_json::Map::new()) {
                self.store.append_annotation(
                    sketch.valuation_id,
                    Annotation::ValuationPoint(point),
                    caller.id,
                )?;
                added += 1;
            }
        }
        info!(valuation = %sketch.valuation_id, added, radius, "nearby valuations pinned");
        Ok(self.store.refresh_sketch_bounds(sketch.valuation_id)?)
    }
}

fn valuation_point(
    valuation: &Valuation,
    custom_data: serde_json::Map<String, serde_json::Value>,
) -> Option<ValuationPoint> {
    let location = valuation.location?;
    let address = valuation.property.location_label();
    Some(ValuationPoint {
        id: valuation.id,
        latitude: location.latitude,
        longitude: location.longitude,
        valuation_number: valuation.valuation_number.clone(),
        status: valuation.status,
        property_type: valuation.property.property_type.clone(),
        final_value: valuation.results.final_value,
        reference_number: valuation.report.reference_number.clone(),
        address: (!address.is_empty()).then_some(address),
        prepared_by: valuation.prepared_by,
        custom_data,
    })
}

fn required_point(
    errors: &mut ValidationErrors,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Option<GeoPoint> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => {
            errors.range("latitude", latitude, -90.0, 90.0);
            errors.range("longitude", longitude, -180.0, 180.0);
            Some(GeoPoint::new(latitude, longitude))
        }
        (latitude, longitude) => {
            if latitude.is_none() {
                errors.add("latitude", "the latitude field is required");
            }
            if longitude.is_none() {
                errors.add("longitude", "the longitude field is required");
            }
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SketchError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<SketchError> for ApiError {
    fn from(value: SketchError) -> Self {
        match value {
            SketchError::Validation(errors) => ApiError::validation(errors),
            SketchError::Repository(err) => err.into(),
        }
    }
}
