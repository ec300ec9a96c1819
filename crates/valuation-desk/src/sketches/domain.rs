use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, GeoPoint, BOUNDS_PADDING};
use crate::identity::UserId;
use crate::valuations::{ValuationId, ValuationStatus};

pub const DEFAULT_ZOOM_LEVEL: u8 = 15;
pub const MIN_ZOOM_LEVEL: u8 = 1;
pub const MAX_ZOOM_LEVEL: u8 = 20;

/// Identifier of a comparable point or landmark, e.g. `cmp-000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub String);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SketchType {
    Image,
    #[default]
    DigitalMap,
    Both,
}

/// Another valuation pinned onto this sketch. The id is the source valuation's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationPoint {
    pub id: ValuationId,
    pub latitude: f64,
    pub longitude: f64,
    pub valuation_number: String,
    pub status: ValuationStatus,
    pub property_type: Option<String>,
    pub final_value: Option<f64>,
    pub reference_number: Option<String>,
    pub address: Option<String>,
    pub prepared_by: UserId,
    #[serde(default)]
    pub custom_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparablePoint {
    pub id: AnnotationId,
    pub latitude: f64,
    pub longitude: f64,
    pub sale_price: Option<f64>,
    pub sale_date: Option<NaiveDate>,
    pub property_type: Option<String>,
    pub area: Option<f64>,
    pub source: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkType {
    Mosque,
    School,
    Hospital,
    Mall,
    Park,
    Highway,
    Bank,
    GasStation,
    Restaurant,
    Other,
}

impl LandmarkType {
    pub const ALL: [LandmarkType; 10] = [
        LandmarkType::Mosque,
        LandmarkType::School,
        LandmarkType::Hospital,
        LandmarkType::Mall,
        LandmarkType::Park,
        LandmarkType::Highway,
        LandmarkType::Bank,
        LandmarkType::GasStation,
        LandmarkType::Restaurant,
        LandmarkType::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            LandmarkType::Mosque => "mosque",
            LandmarkType::School => "school",
            LandmarkType::Hospital => "hospital",
            LandmarkType::Mall => "mall",
            LandmarkType::Park => "park",
            LandmarkType::Highway => "highway",
            LandmarkType::Bank => "bank",
            LandmarkType::GasStation => "gas_station",
            LandmarkType::Restaurant => "restaurant",
            LandmarkType::Other => "other",
        }
    }

    /// Default map icon when the caller supplies none.
    pub const fn icon(self) -> &'static str {
        match self {
            LandmarkType::Mosque => "mdi-mosque",
            LandmarkType::School => "mdi-school",
            LandmarkType::Hospital => "mdi-hospital-box",
            LandmarkType::Mall => "mdi-shopping",
            LandmarkType::Park => "mdi-tree",
            LandmarkType::Highway => "mdi-highway",
            LandmarkType::Bank => "mdi-bank",
            LandmarkType::GasStation => "mdi-gas-station",
            LandmarkType::Restaurant => "mdi-silverware-fork-knife",
            LandmarkType::Other => "mdi-map-marker",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: AnnotationId,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    #[serde(rename = "type")]
    pub landmark_type: LandmarkType,
    pub icon: String,
    pub description: Option<String>,
}

/// One child row of a sketch.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    ValuationPoint(ValuationPoint),
    ComparablePoint(ComparablePoint),
    Landmark(Landmark),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStyle {
    #[default]
    Satellite,
    Roadmap,
    Hybrid,
    Terrain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointColors {
    pub current_valuation: String,
    pub other_valuations: String,
    pub comparable_sales: String,
    pub landmarks: String,
}

impl Default for PointColors {
    fn default() -> Self {
        Self {
            current_valuation: "#ff0000".to_string(),
            other_valuations: "#0066cc".to_string(),
            comparable_sales: "#00cc66".to_string(),
            landmarks: "#cc6600".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointSizes {
    pub small: u8,
    pub medium: u8,
    pub large: u8,
}

impl Default for PointSizes {
    fn default() -> Self {
        Self {
            small: 8,
            medium: 12,
            large: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub map_style: MapStyle,
    pub show_grid: bool,
    pub show_scale: bool,
    pub show_compass: bool,
    pub enable_clustering: bool,
    pub cluster_max_zoom: u8,
    pub point_colors: PointColors,
    pub point_sizes: PointSizes,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            map_style: MapStyle::default(),
            show_grid: false,
            show_scale: true,
            show_compass: true,
            enable_clustering: true,
            cluster_max_zoom: 15,
            point_colors: PointColors::default(),
            point_sizes: PointSizes::default(),
        }
    }
}

/// What the rendered map shows next to each point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub show_prices: bool,
    pub show_valuator_names: bool,
    pub show_property_types: bool,
    pub show_dates: bool,
    pub map: MapSettings,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_prices: true,
            show_valuator_names: true,
            show_property_types: true,
            show_dates: true,
            map: MapSettings::default(),
        }
    }
}

/// Header fields written by a save; the annotation collections are untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchLayout {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sketch_type: SketchType,
    pub image_path: Option<String>,
    pub center: Option<GeoPoint>,
    pub zoom_level: u8,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationSketch {
    pub valuation_id: ValuationId,
    #[serde(flatten)]
    pub layout: SketchLayout,
    pub bounds: Option<BoundingBox>,
    pub valuation_points: Vec<ValuationPoint>,
    pub comparable_points: Vec<ComparablePoint>,
    pub landmarks: Vec<Landmark>,
    pub display: DisplaySettings,
    pub created_by: UserId,
    pub updated_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ValuationSketch {
    pub fn new(valuation_id: ValuationId, layout: SketchLayout, editor: UserId) -> Self {
        let now = Utc::now();
        Self {
            valuation_id,
            layout,
            bounds: None,
            valuation_points: Vec::new(),
            comparable_points: Vec::new(),
            landmarks: Vec::new(),
            display: DisplaySettings::default(),
            created_by: editor,
            updated_by: editor,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push(&mut self, annotation: Annotation) {
        match annotation {
            Annotation::ValuationPoint(point) => self.valuation_points.push(point),
            Annotation::ComparablePoint(point) => self.comparable_points.push(point),
            Annotation::Landmark(landmark) => self.landmarks.push(landmark),
        }
    }

    /// Every annotated coordinate across the three collections.
    pub fn points(&self) -> Vec<GeoPoint> {
        let valuations = self
            .valuation_points
            .iter()
            .map(|point| GeoPoint::new(point.latitude, point.longitude));
        let comparables = self
            .comparable_points
            .iter()
            .map(|point| GeoPoint::new(point.latitude, point.longitude));
        let landmarks = self
            .landmarks
            .iter()
            .map(|landmark| GeoPoint::new(landmark.latitude, landmark.longitude));
        valuations.chain(comparables).chain(landmarks).collect()
    }

    /// Enclosing box padded by [`BOUNDS_PADDING`]; `None` without annotations.
    pub fn computed_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(&self.points()).map(|bounds| bounds.padded(BOUNDS_PADDING))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LandmarkTypeEntry {
    #[serde(rename = "type")]
    pub landmark_type: LandmarkType,
    pub icon: &'static str,
}

/// A valuation returned by the nearby lookup, closest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyValuation {
    pub valuation_id: ValuationId,
    pub valuation_number: String,
    pub status: ValuationStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub property_type: Option<String>,
    pub final_value: Option<f64>,
    pub distance_meters: f64,
}

// Request payloads.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveSketchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sketch_type: Option<SketchType>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub center_latitude: Option<f64>,
    #[serde(default)]
    pub center_longitude: Option<f64>,
    #[serde(default)]
    pub zoom_level: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub auto_populate_nearby: bool,
    #[serde(default)]
    pub nearby_radius: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddValuationPoint {
    #[serde(default)]
    pub target_valuation_id: Option<ValuationId>,
    #[serde(default)]
    pub custom_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddComparablePoint {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub sale_date: Option<NaiveDate>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddLandmark {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub landmark_type: Option<LandmarkType>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayUpdate {
    #[serde(default)]
    pub show_prices: Option<bool>,
    #[serde(default)]
    pub show_valuator_names: Option<bool>,
    #[serde(default)]
    pub show_property_types: Option<bool>,
    #[serde(default)]
    pub show_dates: Option<bool>,
    #[serde(default)]
    pub map: Option<MapSettings>,
}

impl DisplayUpdate {
    pub fn apply(self, settings: &mut DisplaySettings) {
        if let Some(value) = self.show_prices {
            settings.show_prices = value;
        }
        if let Some(value) = self.show_valuator_names {
            settings.show_valuator_names = value;
        }
        if let Some(value) = self.show_property_types {
            settings.show_property_types = value;
        }
        if let Some(value) = self.show_dates {
            settings.show_dates = value;
        }
        if let Some(map) = self.map {
            settings.map = map;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landmark(latitude: f64, longitude: f64) -> Landmark {
        Landmark {
            id: AnnotationId("lmk-000001".to_string()),
            latitude,
            longitude,
            name: "Grand Mosque".to_string(),
            landmark_type: LandmarkType::Mosque,
            icon: LandmarkType::Mosque.icon().to_string(),
            description: None,
        }
    }

    fn layout() -> SketchLayout {
        SketchLayout {
            title: None,
            description: None,
            sketch_type: SketchType::default(),
            image_path: None,
            center: None,
            zoom_level: DEFAULT_ZOOM_LEVEL,
            notes: None,
        }
    }

    #[test]
    fn computed_bounds_pads_ten_percent_per_axis() {
        let mut sketch = ValuationSketch::new(ValuationId(1), layout(), UserId(1));
        assert_eq!(sketch.computed_bounds(), None);

        sketch.push(Annotation::Landmark(landmark(24.0, 46.0)));
        sketch.push(Annotation::Landmark(landmark(25.0, 48.0)));
        let bounds = sketch.computed_bounds().expect("bounds for two points");
        assert!((bounds.north - 25.1).abs() < 1e-9);
        assert!((bounds.south - 23.9).abs() < 1e-9);
        assert!((bounds.east - 48.2).abs() < 1e-9);
        assert!((bounds.west - 45.8).abs() < 1e-9);
    }

    #[test]
    fn display_defaults_show_everything() {
        let settings = DisplaySettings::default();
        assert!(settings.show_prices && settings.show_dates);
        assert_eq!(settings.map.map_style, MapStyle::Satellite);
        assert_eq!(settings.map.cluster_max_zoom, 15);
        assert_eq!(settings.map.point_sizes.medium, 12);
    }

    #[test]
    fn display_update_only_touches_given_fields() {
        let mut settings = DisplaySettings::default();
        DisplayUpdate {
            show_prices: Some(false),
            ..DisplayUpdate::default()
        }
        .apply(&mut settings);
        assert!(!settings.show_prices);
        assert!(settings.show_valuator_names);
    }

    #[test]
    fn landmark_icons_cover_every_type() {
        for kind in LandmarkType::ALL {
            assert!(kind.icon().starts_with("mdi-"), "{}", kind.label());
        }
        assert_eq!(LandmarkType::GasStation.icon(), "mdi-gas-station");
    }
}
