// src/session/registry.rs
//! Per-workout tracker registry

use crate::api::{Workout, WorkoutApi};
use crate::error::Result;
use crate::location::{LocationProvider, SubscriptionOptions};
use crate::session::tracker::CardioSessionTracker;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

/// Explicit ownership of the cardio trackers for one calendar date.
///
/// Trackers are created when a day's workouts are loaded and disposed
/// explicitly; disposal tears down any live subscription and timer rather
/// than relying on implicit cleanup.
pub struct SessionRegistry {
    api: Arc<dyn WorkoutApi>,
    provider: Arc<dyn LocationProvider>,
    options: SubscriptionOptions,
    date: NaiveDate,
    trackers: HashMap<i64, CardioSessionTracker>,
}

impl SessionRegistry {
    pub fn new(
        api: Arc<dyn WorkoutApi>,
        provider: Arc<dyn LocationProvider>,
        options: SubscriptionOptions,
        date: NaiveDate,
    ) -> Self {
        Self {
            api,
            provider,
            options,
            date,
            trackers: HashMap::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Fetch the date's workouts and create trackers for rows that do not
    /// have one yet. Existing trackers keep their in-progress drafts.
    pub async fn load(&mut self) -> Result<Vec<Workout>> {
        let workouts = self.api.workouts_for_date(self.date).await?;

        for workout in &workouts {
            let Some(workout_id) = workout.id else { continue };
            self.trackers.entry(workout_id).or_insert_with(|| {
                CardioSessionTracker::new(
                    workout_id,
                    workout.clone(),
                    self.date,
                    Arc::clone(&self.provider),
                    Arc::clone(&self.api),
                    self.options,
                )
            });
        }

        Ok(workouts)
    }

    pub fn get(&self, workout_id: i64) -> Option<&CardioSessionTracker> {
        self.trackers.get(&workout_id)
    }

    pub fn get_mut(&mut self, workout_id: i64) -> Option<&mut CardioSessionTracker> {
        self.trackers.get_mut(&workout_id)
    }

    pub fn workout_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.trackers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Tear down and remove one tracker
    pub fn dispose(&mut self, workout_id: i64) {
        if let Some(mut tracker) = self.trackers.remove(&workout_id) {
            tracker.reset();
        }
    }

    /// Tear down and remove every tracker (screen exit)
    pub fn dispose_all(&mut self) {
        for (_, mut tracker) in self.trackers.drain() {
            tracker.reset();
        }
    }
}
