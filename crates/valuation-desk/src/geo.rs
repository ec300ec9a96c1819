//! Great-circle distance and bounding boxes for sketch annotations.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Fraction of each axis span added on every side of a computed bounding box.
pub const BOUNDS_PADDING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Spherical law of cosines on a sphere of [`EARTH_RADIUS_METERS`].
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let lat_a = self.latitude.to_radians();
        let lat_b = other.latitude.to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let cosine = lat_a.cos() * lat_b.cos() * delta_lon.cos() + lat_a.sin() * lat_b.sin();
        EARTH_RADIUS_METERS * cosine.clamp(-1.0, 1.0).acos()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Tightest box around `points`, or `None` when there are none.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let seed = Self {
            north: first.latitude,
            south: first.latitude,
            east: first.longitude,
            west: first.longitude,
        };

        Some(points.fold(seed, |acc, point| Self {
            north: acc.north.max(point.latitude),
            south: acc.south.min(point.latitude),
            east: acc.east.max(point.longitude),
            west: acc.west.min(point.longitude),
        }))
    }

    pub fn padded(self, ratio: f64) -> Self {
        let lat_pad = (self.north - self.south) * ratio;
        let lon_pad = (self.east - self.west) * ratio;
        Self {
            north: self.north + lat_pad,
            south: self.south - lat_pad,
            east: self.east + lon_pad,
            west: self.west - lon_pad,
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_identical_points_is_negligible() {
        let riyadh = GeoPoint::new(24.7136, 46.6753);
        assert!(riyadh.distance_meters(&riyadh) < 0.2);
    }

    #[test]
    fn hundredth_degree_of_latitude_is_about_1112_meters() {
        let a = GeoPoint::new(24.70, 46.67);
        let b = GeoPoint::new(24.71, 46.67);
        let distance = a.distance_meters(&b);
        assert!((distance - 1111.95).abs() < 0.5, "distance was {distance}");
        assert!((distance - b.distance_meters(&a)).abs() < 1e-6);
    }

    #[test]
    fn bounds_are_padded_by_ten_percent_of_span() {
        let points = [
            GeoPoint::new(24.0, 46.0),
            GeoPoint::new(25.0, 47.0),
            GeoPoint::new(24.5, 46.2),
        ];
        let bounds = BoundingBox::enclosing(&points)
            .expect("points present")
            .padded(BOUNDS_PADDING);
        assert!((bounds.north - 25.1).abs() < 1e-9);
        assert!((bounds.south - 23.9).abs() < 1e-9);
        assert!((bounds.east - 47.1).abs() < 1e-9);
        assert!((bounds.west - 45.9).abs() < 1e-9);
        assert!(points.iter().all(|point| bounds.contains(point)));
    }

    #[test]
    fn no_points_means_no_bounds() {
        assert!(BoundingBox::enclosing(&Vec::<GeoPoint>::new()).is_none());
    }
}
