// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the webcam pipeline

use std::fmt;

use crate::backends::camera::BackendError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera acquisition errors
    Camera(BackendError),
    /// Positioning errors
    Location(LocationError),
    /// Geocoder client setup errors
    Geocode(GeocodeError),
    /// Snapshot capture/export errors
    Snapshot(SnapshotError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Positioning errors
///
/// All of these put the location tracker into its error state and require an
/// explicit restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The platform has no positioning capability
    Unsupported,
    /// The user denied access to the position
    PermissionDenied(String),
    /// No fix could be obtained within the acquisition timeout
    Timeout(String),
    /// The position is currently unavailable
    Unavailable(String),
}

/// Reverse geocoding errors
///
/// These never reach the control surface; the resolver degrades to the
/// "Unknown" placeholder.
#[derive(Debug, Clone)]
pub enum GeocodeError {
    /// Transport-level failure
    Network(String),
    /// Service answered with a non-success status
    Status(u16),
    /// Response body could not be parsed
    Malformed(String),
}

/// Snapshot errors
#[derive(Debug, Clone)]
pub enum SnapshotError {
    /// Nothing has been composited yet
    NoFrameAvailable,
    /// PNG encoding failed
    EncodingFailed(String),
    /// Gallery index out of range
    NotFound(usize),
    /// Writing the exported file failed
    ExportFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Location(e) => write!(f, "Location error: {}", e),
            AppError::Geocode(e) => write!(f, "Geocoder error: {}", e),
            AppError::Snapshot(e) => write!(f, "Snapshot error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::Unsupported => write!(f, "Geolocation not supported"),
            LocationError::PermissionDenied(msg) => write!(f, "GPS Error: {}", msg),
            LocationError::Timeout(msg) => write!(f, "GPS Error: {}", msg),
            LocationError::Unavailable(msg) => write!(f, "GPS Error: {}", msg),
        }
    }
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::Network(msg) => write!(f, "Network error: {}", msg),
            GeocodeError::Status(code) => write!(f, "Service returned status {}", code),
            GeocodeError::Malformed(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::NoFrameAvailable => write!(f, "No frame available for capture"),
            SnapshotError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            SnapshotError::NotFound(index) => write!(f, "No snapshot at position {}", index),
            SnapshotError::ExportFailed(msg) => write!(f, "Export failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for LocationError {}
impl std::error::Error for GeocodeError {}
impl std::error::Error for SnapshotError {}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err)
    }
}

impl From<LocationError> for AppError {
    fn from(err: LocationError) -> Self {
        AppError::Location(err)
    }
}

impl From<SnapshotError> for AppError {
    fn from(err: SnapshotError) -> Self {
        AppError::Snapshot(err)
    }
}

impl From<GeocodeError> for AppError {
    fn from(err: GeocodeError) -> Self {
        AppError::Geocode(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::ExportFailed(err.to_string())
    }
}

impl From<image::ImageError> for SnapshotError {
    fn from(err: image::ImageError) -> Self {
        SnapshotError::EncodingFailed(err.to_string())
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GeocodeError::Malformed(err.to_string())
        } else {
            GeocodeError::Network(err.to_string())
        }
    }
}
