// src/api/mod.rs
//! Workout API client and wire types

use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default base URL of the workout service
pub const DEFAULT_API_URL: &str = "http://localhost:5026";

/// A workout row as persisted by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: Option<i64>,
    pub name: String,
    pub workout_date: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
    pub cardio_time_minutes: Option<f64>,
    pub cardio_distance_km: Option<f64>,
    pub cardio_calories: Option<i64>,
}

impl Workout {
    pub fn has_cardio_summary(&self) -> bool {
        self.cardio_time_minutes.is_some()
            || self.cardio_distance_km.is_some()
            || self.cardio_calories.is_some()
    }
}

/// Server response wrapper around a workout row
#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutResponse {
    pub workout: Workout,
}

/// Validated cardio metrics ready for persistence. `None` means "no value",
/// not zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardioMetrics {
    pub cardio_time_minutes: Option<f64>,
    pub cardio_distance_km: Option<f64>,
    pub cardio_calories: Option<i64>,
}

/// Remote persistence for workout cardio data.
#[async_trait]
pub trait WorkoutApi: Send + Sync {
    /// Fetch the workouts scheduled on a calendar date
    async fn workouts_for_date(&self, date: NaiveDate) -> Result<Vec<Workout>>;

    /// Replace the cardio metrics of a workout
    async fn update_cardio(&self, workout_id: i64, metrics: &CardioMetrics) -> Result<()>;

    /// Mark a workout as completed
    async fn complete_workout(&self, workout_id: i64) -> Result<()>;
}

/// HTTP client for the workout service.
pub struct HttpWorkoutApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWorkoutApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Turn a non-success response into a `Persistence` error carrying the
    /// server's message, or a generic fallback when the body is empty
    async fn failure_message(response: reqwest::Response) -> TrackerError {
        let message = response.text().await.unwrap_or_default();
        if message.trim().is_empty() {
            TrackerError::Persistence("the server reported an error".to_string())
        } else {
            TrackerError::Persistence(message)
        }
    }
}

#[async_trait]
impl WorkoutApi for HttpWorkoutApi {
    async fn workouts_for_date(&self, date: NaiveDate) -> Result<Vec<Workout>> {
        let url = format!("{}/Workout/Workouts", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("date", date.format("%Y-%m-%d").to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure_message(response).await);
        }

        let rows: Vec<WorkoutResponse> = response.json().await?;
        Ok(rows.into_iter().map(|r| r.workout).collect())
    }

    async fn update_cardio(&self, workout_id: i64, metrics: &CardioMetrics) -> Result<()> {
        let url = format!("{}/Workout/Workouts/{}/Cardio", self.base_url, workout_id);
        let response = self.http.put(&url).json(metrics).send().await?;

        if !response.status().is_success() {
            return Err(Self::failure_message(response).await);
        }
        Ok(())
    }

    async fn complete_workout(&self, workout_id: i64) -> Result<()> {
        let url = format!("{}/Workout/Workouts/{}/Complete", self.base_url, workout_id);
        let response = self.http.put(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::failure_message(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardio_metrics_wire_names() {
        let metrics = CardioMetrics {
            cardio_time_minutes: Some(2.08),
            cardio_distance_km: Some(0.11),
            cardio_calories: None,
        };

        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["cardioTimeMinutes"], 2.08);
        assert_eq!(json["cardioDistanceKm"], 0.11);
        assert!(json["cardioCalories"].is_null());
    }

    #[test]
    fn test_workout_response_deserialization() {
        let json = r#"{"workout":{"id":7,"name":"Morning run","workoutDate":"2026-08-29","notes":null,"completed":false,"cardioTimeMinutes":30,"cardioDistanceKm":5.2,"cardioCalories":410}}"#;
        let response: WorkoutResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.workout.id, Some(7));
        assert_eq!(response.workout.name, "Morning run");
        assert_eq!(response.workout.cardio_time_minutes, Some(30.0));
        assert_eq!(response.workout.cardio_calories, Some(410));
        assert!(response.workout.has_cardio_summary());
    }

    #[test]
    fn test_workout_without_cardio_summary() {
        let json = r#"{"workout":{"id":2,"name":"Legs"}}"#;
        let response: WorkoutResponse = serde_json::from_str(json).unwrap();
        assert!(!response.workout.has_cardio_summary());
    }
}
