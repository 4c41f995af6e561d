// src/session/mod.rs
//! Cardio session state: drafts, routes, trackers and their registry

pub mod draft;
pub mod registry;
pub mod route;
pub mod tracker;

pub use draft::{CardioDraft, CardioValues};
pub use registry::SessionRegistry;
pub use route::Route;
pub use tracker::CardioSessionTracker;
