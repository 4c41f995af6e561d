// src/location/position.rs
//! Position fix data and geodesic distance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, as used by the workout service
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Requested fix accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Balanced,
    High,
}

/// A single GPS position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Estimated horizontal accuracy in meters, when the source reports one
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            timestamp: Utc::now(),
        }
    }

    /// Great-circle distance to another fix in meters (haversine).
    ///
    /// No smoothing or outlier rejection is applied; a glitchy fix counts
    /// as real movement.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }

    /// Get the age of the fix in seconds
    pub fn age_seconds(&self) -> i64 {
        Utc::now().signed_duration_since(self.timestamp).num_seconds()
    }

    /// Check if the fix is recent (within 10 seconds)
    pub fn is_recent(&self) -> bool {
        self.age_seconds() < 10
    }

    /// Format a coordinate for display
    pub fn format_coordinate(coord: f64) -> String {
        format!("{:>12.6}", coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = Position::new(59.3293, 18.0686);
        assert!(p.distance_to(&p).abs() < 1e-9);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Position::new(59.3293, 18.0686);
        let b = Position::new(59.3300, 18.0700);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-9);
    }

    #[test]
    fn test_distance_stockholm_fix_pair() {
        // 0.0007 deg of latitude and 0.0014 deg of longitude at ~59.33 N
        let a = Position::new(59.3293, 18.0686);
        let b = Position::new(59.3300, 18.0700);
        let d = a.distance_to(&b);
        assert!((d - 111.2).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere
        let a = Position::new(0.0, 0.0);
        let b = Position::new(1.0, 0.0);
        let d = a.distance_to(&b);
        assert!((d - 111_194.9).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_longitude_shrinks_with_latitude() {
        let eq_a = Position::new(0.0, 0.0);
        let eq_b = Position::new(0.0, 1.0);
        let hi_a = Position::new(60.0, 0.0);
        let hi_b = Position::new(60.0, 1.0);
        assert!(hi_a.distance_to(&hi_b) < eq_a.distance_to(&eq_b) * 0.55);
    }
}
