// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::constants::capture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Which physical camera is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// User-facing camera
    #[default]
    Front,
    /// Environment-facing camera
    Back,
}

impl FacingMode {
    /// The other camera
    pub fn toggled(&self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Front => write!(f, "front"),
            FacingMode::Back => write!(f, "back"),
        }
    }
}

/// Constraints passed to the capture device
///
/// Width and height are ideals; backends may deliver something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl CaptureConstraints {
    /// Default constraints for a facing mode (1280x720 ideal)
    pub fn for_facing(facing_mode: FacingMode) -> Self {
        Self {
            facing_mode,
            ideal_width: capture::IDEAL_WIDTH,
            ideal_height: capture::IDEAL_HEIGHT,
        }
    }
}

/// One decoded RGBA video frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels (`width * height * 4` bytes)
    pub data: Arc<[u8]>,
    /// Timestamp when the frame was produced
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap packed RGBA bytes, rejecting buffers of the wrong size
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> BackendResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(BackendError::Other(format!(
                "Frame buffer has {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data: Arc::from(data),
            captured_at: Instant::now(),
        })
    }

    /// A frame with zero area cannot be drawn
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Lifecycle of a camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    #[default]
    Idle,
    Starting,
    Active,
    Error,
}

impl std::fmt::Display for CameraState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraState::Idle => write!(f, "idle"),
            CameraState::Starting => write!(f, "starting"),
            CameraState::Active => write!(f, "active"),
            CameraState::Error => write!(f, "error"),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Acquisition failures
///
/// The controller does not distinguish these by recovery policy: every one
/// ends in the error state and needs an explicit restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Access to the camera was denied
    PermissionDenied(String),
    /// No camera matches the request
    DeviceNotFound(String),
    /// The camera is held by another process
    DeviceBusy(String),
    /// The constraints cannot be satisfied
    ConstraintMismatch(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::ConstraintMismatch(msg) => write!(f, "Constraints not satisfiable: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}
