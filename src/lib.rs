// src/lib.rs
//! Cardio Tracker Library
//!
//! A GPS cardio session tracker: live distance/time/route accumulation
//! with start/pause/stop semantics, persisted to a remote workout API.

pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod location;
pub mod session;

// Re-export main types for convenience
pub use api::{HttpWorkoutApi, Workout, WorkoutApi};
pub use error::{Result, TrackerError};
pub use location::{LocationProvider, Position, SubscriptionOptions};
pub use session::{CardioDraft, CardioSessionTracker, SessionRegistry};
