// src/error.rs
//! Error types for the cardio tracker

use std::fmt;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug)]
pub enum TrackerError {
    /// Location access was refused by the device or daemon
    PermissionDenied(String),
    /// A position fix could not be obtained
    LocationUnavailable(String),
    /// A user-supplied numeric field failed validation
    Validation { field: &'static str, message: String },
    /// The workout API rejected or failed a persistence call
    Persistence(String),
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    Parse(String),
    Other(String),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::PermissionDenied(msg) => write!(f, "Location permission denied: {}", msg),
            TrackerError::LocationUnavailable(msg) => write!(f, "Location unavailable: {}", msg),
            TrackerError::Validation { field, message } => {
                write!(f, "Invalid {}: {}", field, message)
            }
            TrackerError::Persistence(msg) => write!(f, "Could not save cardio: {}", msg),
            TrackerError::Io(e) => write!(f, "IO error: {}", e),
            TrackerError::Serial(e) => write!(f, "Serial error: {}", e),
            TrackerError::Json(e) => write!(f, "JSON error: {}", e),
            TrackerError::Http(e) => write!(f, "HTTP error: {}", e),
            TrackerError::Parse(msg) => write!(f, "Parse error: {}", msg),
            TrackerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for TrackerError {}

impl From<std::io::Error> for TrackerError {
    fn from(error: std::io::Error) -> Self {
        TrackerError::Io(error)
    }
}

impl From<tokio_serial::Error> for TrackerError {
    fn from(error: tokio_serial::Error) -> Self {
        TrackerError::Serial(error)
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(error: serde_json::Error) -> Self {
        TrackerError::Json(error)
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(error: reqwest::Error) -> Self {
        TrackerError::Http(error)
    }
}

impl From<anyhow::Error> for TrackerError {
    fn from(error: anyhow::Error) -> Self {
        TrackerError::Other(error.to_string())
    }
}

impl TrackerError {
    /// True for errors that are surfaced to the user and leave state untouched
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TrackerError::PermissionDenied(_)
                | TrackerError::LocationUnavailable(_)
                | TrackerError::Validation { .. }
                | TrackerError::Persistence(_)
        )
    }
}
