//! Map sketches: one per valuation, holding pinned valuations, comparable sales, landmarks,
//! bounds, and display toggles.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AddComparablePoint, AddLandmark, AddValuationPoint, Annotation, AnnotationId,
    ComparablePoint, DisplaySettings, DisplayUpdate, Landmark, LandmarkType, LandmarkTypeEntry,
    MapSettings, MapStyle, NearbyValuation, SaveSketchRequest, SketchLayout, SketchType,
    ValuationPoint, ValuationSketch,
};
pub use repository::SketchRepository;
pub use router::sketch_router;
pub use service::{
    SketchError, SketchService, DEFAULT_NEARBY_RADIUS, MAX_NEARBY_RADIUS, MIN_NEARBY_RADIUS,
};
