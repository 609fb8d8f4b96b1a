//! Great-circle distance, bearing and point-in-polygon primitives.
//!
//! Kept deliberately free of any geodesy crate: the pack carries none, and
//! the spherical-earth formulas here are standard enough to hand-roll the
//! way `other_examples` do for the same purpose.
use crate::error::GeometryError;

/// Mean Earth radius, meters. Matches the spec's haversine convention.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two WGS84 points, in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().clamp(0.0, 1.0).asin();
    EARTH_RADIUS_M * c
}

/// Initial bearing from point 1 to point 2, degrees clockwise from true
/// north, normalized to `[0, 360)`.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let y = dlon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();
    let theta = y.atan2(x).to_degrees();
    (theta + 360.0) % 360.0
}

/// A simple (non-self-intersecting) polygon over WGS84 points, stored as
/// `(lat, lon)` pairs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    points: Vec<(f64, f64)>,
}

impl Polygon {
    /// Builds a polygon, rejecting degenerate inputs with fewer than 3
    /// vertices — the one geometry input that is a true programming error
    /// rather than data the pipeline should tolerate.
    pub fn new(name: &str, points: Vec<(f64, f64)>) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewVertices(name.to_string(), points.len()));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Ray-casting point-in-polygon test over `(lat, lon)` treated as a
    /// planar `(x, y)` pair — adequate at the pasture scale this operates
    /// at (a few kilometers).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let mut inside = false;
        let n = self.points.len();
        let mut j = n - 1;
        for i in 0..n {
            let (yi, xi) = self.points[i];
            let (yj, xj) = self.points[j];
            let intersects = ((yi > lat) != (yj > lat))
                && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi);
            if intersects {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Arithmetic centroid of the vertices (not the area centroid — fine
    /// for the small, roughly-convex fences this models).
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.points.len() as f64;
        let (sum_lat, sum_lon) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sa, so), (lat, lon)| (sa + lat, so + lon));
        (sum_lat / n, sum_lon / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
        // New York to Los Angeles, approximately 3940 km.
        let d = haversine_m(40.7128, -74.0060, 34.0522, -118.2437);
        assert!((d - 3_940_000.0).abs() < 100_000.0);
    }

    #[test]
    fn haversine_zero_for_identical_point() {
        assert_eq!(haversine_m(50.0, 14.0, 50.0, 14.0), 0.0);
    }

    #[test]
    fn bearing_due_north() {
        let b = bearing_deg(50.0, 14.0, 51.0, 14.0);
        assert!(b.abs() < 1e-6);
    }

    #[test]
    fn square_polygon_contains_center() {
        let poly = Polygon::new(
            "square",
            vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)],
        )
        .unwrap();
        assert!(poly.contains(0.5, 0.5));
        assert!(!poly.contains(2.0, 2.0));
    }

    #[test]
    fn degenerate_polygon_rejected() {
        let err = Polygon::new("line", vec![(0.0, 0.0), (1.0, 1.0)]).unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices("line".to_string(), 2));
    }
}
