// src/session/draft.rs
//! Transient per-workout cardio draft state and input validation

use crate::api::{CardioMetrics, Workout};
use crate::error::{Result, TrackerError};
use crate::location::Position;
use crate::session::route::Route;

/// Locally-held, not-yet-persisted cardio state for one workout.
///
/// The numeric string fields mirror what the user sees and edits; empty
/// (`None`) means "no value", never zero.
#[derive(Debug, Clone, Default)]
pub struct CardioDraft {
    pub time_minutes: Option<String>,
    pub distance_km: Option<String>,
    pub calories: Option<String>,
    /// Accumulated active tracking time
    pub elapsed_seconds: u64,
    /// Whether the timer and location subscription are live
    pub is_running: bool,
    /// True while a persistence request is in flight
    pub is_saving: bool,
    pub route: Route,
    /// Running total of pairwise route distances
    pub distance_meters: f64,
}

impl CardioDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a draft from a persisted workout row
    pub fn from_workout(workout: &Workout) -> Self {
        Self {
            time_minutes: workout.cardio_time_minutes.map(|v| v.to_string()),
            distance_km: workout.cardio_distance_km.map(|v| v.to_string()),
            calories: workout.cardio_calories.map(|v| v.to_string()),
            ..Self::default()
        }
    }

    /// Advance the timer by one second while running
    pub fn tick(&mut self) {
        if self.is_running {
            self.elapsed_seconds += 1;
        }
    }

    /// Record a position update: add the incremental distance from the last
    /// trackpoint (zero for the first point), append, and refresh the
    /// displayed kilometers.
    pub fn record_position(&mut self, position: Position) {
        let added = self
            .route
            .last()
            .map(|last| last.distance_to(&position))
            .unwrap_or(0.0);
        self.distance_meters += added;
        self.route.append(position);

        self.distance_km = if self.distance_meters > 0.0 {
            Some(format!("{:.2}", self.distance_meters / 1000.0))
        } else {
            None
        };
    }

    /// Conclude the session: convert elapsed time to minutes (kept unchanged
    /// when nothing elapsed), zero the timer and stop running. Route and
    /// distance are preserved until an explicit reset.
    pub fn conclude(&mut self) {
        if self.elapsed_seconds > 0 {
            self.time_minutes = Some(format!("{:.2}", self.elapsed_seconds as f64 / 60.0));
        }
        self.elapsed_seconds = 0;
        self.is_running = false;
    }

    /// Clear all tracking state (workout marked complete or screen reset)
    pub fn reset(&mut self) {
        self.elapsed_seconds = 0;
        self.is_running = false;
        self.route.clear();
        self.distance_meters = 0.0;
        self.distance_km = None;
    }

    /// Snapshot of the user-editable values for a save call
    pub fn values(&self) -> CardioValues {
        CardioValues {
            time_minutes: self.time_minutes.clone(),
            distance_km: self.distance_km.clone(),
            calories: self.calories.clone(),
        }
    }

    /// `mm:ss` rendering of the elapsed timer
    pub fn format_elapsed(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }
}

/// User-editable cardio values as entered, prior to validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardioValues {
    pub time_minutes: Option<String>,
    pub distance_km: Option<String>,
    pub calories: Option<String>,
}

impl CardioValues {
    /// Validate all fields and build the wire metrics.
    ///
    /// Fails on the first offending field; nothing is mutated and no
    /// network call happens on failure.
    pub fn validate(&self) -> Result<CardioMetrics> {
        Ok(CardioMetrics {
            cardio_time_minutes: parse_optional_decimal(self.time_minutes.as_deref(), "time")?,
            cardio_distance_km: parse_optional_decimal(self.distance_km.as_deref(), "distance")?,
            cardio_calories: parse_optional_integer(self.calories.as_deref(), "calories")?,
        })
    }
}

/// Parse a non-negative decimal; comma and dot separators are both
/// accepted, empty input means "no value".
pub fn parse_optional_decimal(value: Option<&str>, field: &'static str) -> Result<Option<f64>> {
    let raw = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    let normalized = raw.replace(',', ".");
    let parsed = normalized.parse::<f64>().map_err(|_| TrackerError::Validation {
        field,
        message: format!("'{}' is not a number", raw),
    })?;

    if !parsed.is_finite() || parsed < 0.0 {
        return Err(TrackerError::Validation {
            field,
            message: "must be a non-negative number".to_string(),
        });
    }

    Ok(Some(parsed))
}

/// Parse a non-negative whole number; empty input means "no value".
pub fn parse_optional_integer(value: Option<&str>, field: &'static str) -> Result<Option<i64>> {
    let raw = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    let parsed = raw.parse::<f64>().map_err(|_| TrackerError::Validation {
        field,
        message: format!("'{}' is not a number", raw),
    })?;

    if !parsed.is_finite() || parsed < 0.0 {
        return Err(TrackerError::Validation {
            field,
            message: "must be a non-negative number".to_string(),
        });
    }

    if parsed.fract() != 0.0 {
        return Err(TrackerError::Validation {
            field,
            message: "must be a whole number".to_string(),
        });
    }

    Ok(Some(parsed as i64))
}

/// Format a second count as `mm:ss`
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_mean_null_not_zero() {
        assert_eq!(parse_optional_decimal(None, "time").unwrap(), None);
        assert_eq!(parse_optional_decimal(Some("  "), "time").unwrap(), None);
        assert_eq!(parse_optional_integer(Some(""), "calories").unwrap(), None);
    }

    #[test]
    fn test_comma_decimal_separator() {
        assert_eq!(parse_optional_decimal(Some("5,25"), "distance").unwrap(), Some(5.25));
        assert_eq!(parse_optional_decimal(Some("5.25"), "distance").unwrap(), Some(5.25));
    }

    #[test]
    fn test_negative_decimal_rejected() {
        let err = parse_optional_decimal(Some("-1"), "time").unwrap_err();
        match err {
            TrackerError::Validation { field, .. } => assert_eq!(field, "time"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(parse_optional_decimal(Some("abc"), "distance").is_err());
        assert!(parse_optional_integer(Some("12a"), "calories").is_err());
    }

    #[test]
    fn test_fractional_calories_rejected() {
        let err = parse_optional_integer(Some("12.5"), "calories").unwrap_err();
        match err {
            TrackerError::Validation { field, .. } => assert_eq!(field, "calories"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_whole_calories_accepted() {
        assert_eq!(parse_optional_integer(Some("410"), "calories").unwrap(), Some(410));
    }

    #[test]
    fn test_validate_stops_at_first_bad_field() {
        let values = CardioValues {
            time_minutes: Some("-1".to_string()),
            distance_km: Some("also bad".to_string()),
            calories: None,
        };
        match values.validate().unwrap_err() {
            TrackerError::Validation { field, .. } => assert_eq!(field, "time"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_tick_only_advances_while_running() {
        let mut draft = CardioDraft::new();
        draft.tick();
        assert_eq!(draft.elapsed_seconds, 0);

        draft.is_running = true;
        draft.tick();
        draft.tick();
        assert_eq!(draft.elapsed_seconds, 2);

        draft.is_running = false;
        draft.tick();
        assert_eq!(draft.elapsed_seconds, 2);
    }

    #[test]
    fn test_record_position_accumulates_distance() {
        let mut draft = CardioDraft::new();
        draft.record_position(Position::new(59.3293, 18.0686));
        assert_eq!(draft.distance_meters, 0.0);
        assert_eq!(draft.distance_km, None);

        draft.record_position(Position::new(59.3300, 18.0700));
        assert!((draft.distance_meters - 111.2).abs() < 0.5);
        assert_eq!(draft.distance_km.as_deref(), Some("0.11"));
        assert_eq!(draft.route.len(), 2);
    }

    #[test]
    fn test_conclude_converts_elapsed_to_minutes() {
        let mut draft = CardioDraft::new();
        draft.is_running = true;
        draft.elapsed_seconds = 125;
        draft.conclude();

        assert_eq!(draft.time_minutes.as_deref(), Some("2.08"));
        assert_eq!(draft.elapsed_seconds, 0);
        assert!(!draft.is_running);
    }

    #[test]
    fn test_conclude_with_zero_elapsed_keeps_time() {
        let mut draft = CardioDraft::new();
        draft.time_minutes = Some("30".to_string());
        draft.conclude();
        assert_eq!(draft.time_minutes.as_deref(), Some("30"));
    }

    #[test]
    fn test_from_workout_seeds_persisted_values() {
        let workout = Workout {
            id: Some(1),
            name: "Run".to_string(),
            cardio_time_minutes: Some(30.0),
            cardio_distance_km: Some(5.2),
            cardio_calories: Some(410),
            ..Workout::default()
        };

        let draft = CardioDraft::from_workout(&workout);
        assert_eq!(draft.time_minutes.as_deref(), Some("30"));
        assert_eq!(draft.distance_km.as_deref(), Some("5.2"));
        assert_eq!(draft.calories.as_deref(), Some("410"));
        assert_eq!(draft.elapsed_seconds, 0);
        assert!(!draft.is_running);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(125), "02:05");
        assert_eq!(format_elapsed(3600), "60:00");
    }
}
