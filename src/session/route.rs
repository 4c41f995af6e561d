// src/session/route.rs
//! Recorded GPS route and export functionality

use crate::error::Result;
use crate::location::Position;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// The ordered trackpoints of one cardio session.
///
/// Insertion order is chronological; points are only appended while
/// tracking and only removed by clearing the whole route.
#[derive(Debug, Clone, Default)]
pub struct Route {
    points: Vec<Position>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, point: Position) {
        self.points.push(point);
    }

    pub fn last(&self) -> Option<&Position> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    /// Sum of pairwise haversine distances over the whole route
    pub fn total_distance_meters(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    /// Render the route as a GPX track
    pub fn to_gpx(&self, name: &str) -> String {
        let mut gpx = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="Cardio Tracker" xmlns="http://www.topografix.com/GPX/1/1">
"#,
        );

        gpx.push_str("  <trk>\n");
        gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(name)));
        gpx.push_str("    <trkseg>\n");

        for point in &self.points {
            gpx.push_str(&format!(
                "      <trkpt lat=\"{}\" lon=\"{}\">\n",
                point.latitude, point.longitude
            ));
            gpx.push_str(&format!(
                "        <time>{}</time>\n",
                point.timestamp.to_rfc3339()
            ));
            gpx.push_str("      </trkpt>\n");
        }

        gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
        gpx
    }

    /// Write the GPX track to a file
    pub fn export_gpx(&self, path: &Path, name: &str) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.to_gpx(name).as_bytes())?;
        Ok(())
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_distance_matches_pairwise_sum() {
        let points = [
            Position::new(59.3293, 18.0686),
            Position::new(59.3300, 18.0700),
            Position::new(59.3310, 18.0710),
        ];

        let mut route = Route::new();
        let mut expected = 0.0;
        for (i, point) in points.iter().enumerate() {
            if i > 0 {
                expected += points[i - 1].distance_to(point);
            }
            route.append(*point);
        }

        assert_eq!(route.len(), 3);
        assert!((route.total_distance_meters() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_clear_empties_route() {
        let mut route = Route::new();
        route.append(Position::new(1.0, 2.0));
        route.clear();
        assert!(route.is_empty());
        assert_eq!(route.total_distance_meters(), 0.0);
    }

    #[test]
    fn test_gpx_contains_trackpoints() {
        let mut route = Route::new();
        route.append(Position::new(59.3293, 18.0686));
        route.append(Position::new(59.3300, 18.0700));

        let gpx = route.to_gpx("Morning run");
        assert!(gpx.contains("<gpx"));
        assert!(gpx.contains("<name>Morning run</name>"));
        assert!(gpx.contains("lat=\"59.3293\""));
        assert!(gpx.matches("<trkpt").count() == 2);
    }

    #[test]
    fn test_gpx_escapes_name() {
        let route = Route::new();
        let gpx = route.to_gpx("Run & stretch <fast>");
        assert!(gpx.contains("Run &amp; stretch &lt;fast&gt;"));
    }
}
