// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   Session / CLI     │
//! └──────────┬──────────┘
//!            │ start / stop / switch_facing
//!            ▼
//! ┌─────────────────────┐
//! │  CameraController   │  ← State machine, single owner of the frame source
//! └──────────┬──────────┘
//!            │ open(constraints)
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend trait │  ← Capture device API
//! └──────────┬──────────┘
//!            │
//!            ▼
//!   ┌──────────────────┐
//!   │ Virtual cameras  │  ← Test pattern, still image file
//!   └──────────────────┘
//! ```

pub mod controller;
pub mod types;
pub mod virtual_camera;

pub use controller::CameraController;
pub use types::*;
pub use virtual_camera::{ImageFileBackend, TestPatternBackend};

/// Capture device API
///
/// A backend turns a set of constraints into a live frame source. Opening
/// may block while the device negotiates a format.
pub trait CameraBackend: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Acquire a frame source for the given constraints
    ///
    /// # Returns
    /// * `Ok(source)` - The device is streaming
    /// * `Err(BackendError)` - Permission denied, no device, device busy or
    ///   unsatisfiable constraints
    fn open(&mut self, constraints: &CaptureConstraints) -> BackendResult<Box<dyn FrameSource>>;
}

/// A live frame source handle
///
/// The source owns the underlying device tracks. [`FrameSource::release`]
/// stops them; afterwards no further frames are produced.
pub trait FrameSource: Send {
    /// Pull the most recent frame
    ///
    /// Returns `None` while the source is not ready yet (warming up,
    /// between frames) or after release. This is not an error.
    fn read_frame(&mut self) -> Option<CameraFrame>;

    /// Stop all underlying device tracks
    fn release(&mut self);
}

impl CameraBackend for Box<dyn CameraBackend> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn open(&mut self, constraints: &CaptureConstraints) -> BackendResult<Box<dyn FrameSource>> {
        self.as_mut().open(constraints)
    }
}
