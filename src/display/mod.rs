// src/display/mod.rs
//! Display surfaces

pub mod terminal;

pub use terminal::SessionDisplay;
