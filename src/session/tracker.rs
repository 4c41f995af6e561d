// src/session/tracker.rs
//! Live cardio session tracking and save reconciliation

use crate::api::{Workout, WorkoutApi};
use crate::error::{Result, TrackerError};
use crate::location::{LocationProvider, SubscriptionOptions};
use crate::session::draft::{CardioDraft, CardioValues};
use chrono::NaiveDate;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, RwLock,
};
use std::time::Duration;
use tokio::{task::JoinHandle, time::sleep};

/// Owns the live state of one in-progress cardio session.
///
/// Exactly one timer/subscription pair is live per tracker at a time; both
/// are torn down on pause, stop and drop. All draft mutations happen as
/// read-modify-write under one lock, so the timer tick and position
/// callbacks may interleave freely without corrupting either value.
pub struct CardioSessionTracker {
    workout_id: i64,
    date: NaiveDate,
    draft: Arc<RwLock<CardioDraft>>,
    summary: Arc<RwLock<Workout>>,
    running: Arc<AtomicBool>,
    provider: Arc<dyn LocationProvider>,
    api: Arc<dyn WorkoutApi>,
    options: SubscriptionOptions,
    consumer: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl CardioSessionTracker {
    /// Create a zero-valued tracker for a workout, seeding the draft from
    /// the persisted cardio summary
    pub fn new(
        workout_id: i64,
        workout: Workout,
        date: NaiveDate,
        provider: Arc<dyn LocationProvider>,
        api: Arc<dyn WorkoutApi>,
        options: SubscriptionOptions,
    ) -> Self {
        Self {
            workout_id,
            date,
            draft: Arc::new(RwLock::new(CardioDraft::from_workout(&workout))),
            summary: Arc::new(RwLock::new(workout)),
            running: Arc::new(AtomicBool::new(false)),
            provider,
            api,
            options,
            consumer: None,
            ticker: None,
        }
    }

    pub fn workout_id(&self) -> i64 {
        self.workout_id
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Shared handle to the draft, for display loops
    pub fn draft_handle(&self) -> Arc<RwLock<CardioDraft>> {
        Arc::clone(&self.draft)
    }

    /// Shared handle to the persisted summary, for display loops
    pub fn summary_handle(&self) -> Arc<RwLock<Workout>> {
        Arc::clone(&self.summary)
    }

    pub fn draft(&self) -> CardioDraft {
        self.draft.read().unwrap().clone()
    }

    pub fn summary(&self) -> Workout {
        self.summary.read().unwrap().clone()
    }

    /// Start (or resume) tracking.
    ///
    /// A no-op when already running. Requests location permission, takes
    /// one immediate fix as the first route point when the route is empty,
    /// then opens the position subscription and the 1-second timer tick.
    /// Any failure leaves tracking inactive with no state change.
    pub async fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::Relaxed) {
            return Ok(());
        }

        self.provider.request_permission().await?;

        let first_fix = if self.draft.read().unwrap().route.is_empty() {
            let fix = self
                .provider
                .current_position(self.options.accuracy)
                .await
                .map_err(|e| match e {
                    e @ TrackerError::PermissionDenied(_)
                    | e @ TrackerError::LocationUnavailable(_) => e,
                    other => TrackerError::LocationUnavailable(other.to_string()),
                })?;
            Some(fix)
        } else {
            None
        };

        let mut stream = self.provider.subscribe(self.options).await?;

        {
            let mut draft = self.draft.write().unwrap();
            if let Some(fix) = first_fix {
                if draft.route.is_empty() {
                    draft.route.append(fix);
                }
            }
            draft.is_running = true;
        }
        self.running.store(true, Ordering::Relaxed);

        let draft = Arc::clone(&self.draft);
        let running = Arc::clone(&self.running);
        self.consumer = Some(tokio::spawn(async move {
            while let Some(position) = stream.next().await {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                draft.write().unwrap().record_position(position);
            }
        }));

        let draft = Arc::clone(&self.draft);
        let running = Arc::clone(&self.running);
        self.ticker = Some(tokio::spawn(async move {
            while running.load(Ordering::Relaxed) {
                sleep(Duration::from_secs(1)).await;
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                draft.write().unwrap().tick();
            }
        }));

        Ok(())
    }

    /// Resume tracking after a pause; appends to the existing route
    pub async fn resume(&mut self) -> Result<()> {
        self.start().await
    }

    /// Stop the subscription and timer; route and distance are preserved
    pub fn pause(&mut self) {
        self.teardown_tasks();
        self.draft.write().unwrap().is_running = false;
    }

    /// Conclude the session: stop tracking, convert elapsed time to
    /// minutes, reset the timer and persist the current values.
    pub async fn stop(&mut self) -> Result<()> {
        self.teardown_tasks();

        let values = {
            let mut draft = self.draft.write().unwrap();
            draft.conclude();
            draft.values()
        };

        self.save(values).await
    }

    /// Validate and persist cardio values, then reconcile the summary from
    /// the server (server wins). On failure the draft is left untouched so
    /// the user can retry; the saving flag is cleared on every exit path.
    pub async fn save(&self, values: CardioValues) -> Result<()> {
        let metrics = values.validate()?;

        self.draft.write().unwrap().is_saving = true;
        let outcome = self.persist_and_reconcile(&metrics).await;
        self.draft.write().unwrap().is_saving = false;

        outcome
    }

    /// Save the draft's current values
    pub async fn save_current(&self) -> Result<()> {
        let values = self.draft.read().unwrap().values();
        self.save(values).await
    }

    /// Mark the workout completed on the server, then reset local tracking
    /// state; the persisted summary remains the source of truth.
    pub async fn complete(&mut self) -> Result<()> {
        self.teardown_tasks();
        self.api.complete_workout(self.workout_id).await?;
        self.reconcile_summary().await?;
        self.draft.write().unwrap().reset();
        Ok(())
    }

    /// Discard all local tracking state
    pub fn reset(&mut self) {
        self.teardown_tasks();
        self.draft.write().unwrap().reset();
    }

    async fn persist_and_reconcile(&self, metrics: &crate::api::CardioMetrics) -> Result<()> {
        self.api.update_cardio(self.workout_id, metrics).await?;
        self.reconcile_summary().await
    }

    async fn reconcile_summary(&self) -> Result<()> {
        let rows = self.api.workouts_for_date(self.date).await?;
        if let Some(row) = rows.into_iter().find(|w| w.id == Some(self.workout_id)) {
            *self.summary.write().unwrap() = row;
        }
        Ok(())
    }

    /// Cancel the timer tick and the location subscription. Aborting the
    /// consumer drops the stream, which aborts the producer and releases
    /// the GPS source.
    fn teardown_tasks(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(task) = self.consumer.take() {
            task.abort();
        }
        if let Some(task) = self.ticker.take() {
            task.abort();
        }
    }
}

impl Drop for CardioSessionTracker {
    fn drop(&mut self) {
        self.teardown_tasks();
    }
}
