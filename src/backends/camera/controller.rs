// SPDX-License-Identifier: GPL-3.0-only

//! Camera acquisition state machine
//!
//! ```text
//! Idle ──start──▶ Starting ──ok──▶ Active ──stop──▶ Idle
//!                    │               │
//!                    └──err──▶ Error └──switch_facing──▶ Starting
//! ```
//!
//! The controller is the single owner of the active frame source. Any held
//! source is released before a new one is requested, so two device handles
//! are never alive at the same time. Dropping the controller releases the
//! source unconditionally.

use super::types::*;
use super::{CameraBackend, FrameSource};
use tracing::{debug, info, warn};

/// Camera session controller
pub struct CameraController<B: CameraBackend> {
    backend: B,
    state: CameraState,
    facing_mode: FacingMode,
    source: Option<Box<dyn FrameSource>>,
    last_error: Option<String>,
}

impl<B: CameraBackend> CameraController<B> {
    /// Create an idle controller
    pub fn new(backend: B) -> Self {
        info!(backend = backend.name(), "Creating camera controller");

        Self {
            backend,
            state: CameraState::Idle,
            facing_mode: FacingMode::default(),
            source: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CameraState::Active
    }

    /// Target facing mode of the current (or last attempted) session
    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    /// Message of the last acquisition failure, while in the error state
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start streaming from the camera facing `facing_mode`
    ///
    /// A previously held source is released before acquisition begins. On
    /// failure the controller enters [`CameraState::Error`] with a readable
    /// message and does not retry.
    pub fn start(&mut self, facing_mode: FacingMode) -> BackendResult<()> {
        info!(facing = %facing_mode, "Starting camera");

        self.release_source();
        self.facing_mode = facing_mode;
        self.state = CameraState::Starting;

        let constraints = CaptureConstraints::for_facing(facing_mode);
        match self.backend.open(&constraints) {
            Ok(source) => {
                self.source = Some(source);
                self.state = CameraState::Active;
                self.last_error = None;
                info!(facing = %facing_mode, "Camera active");
                Ok(())
            }
            Err(e) => {
                warn!(facing = %facing_mode, error = %e, "Camera acquisition failed");
                self.state = CameraState::Error;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Release the camera and return to idle
    ///
    /// Calling this while already idle does nothing.
    pub fn stop(&mut self) {
        if self.state == CameraState::Idle && self.source.is_none() {
            debug!("Camera already idle");
            return;
        }

        info!("Stopping camera");
        self.release_source();
        self.state = CameraState::Idle;
    }

    /// Restart with the opposite facing mode
    ///
    /// Implemented as stop-then-start; the old source is fully released
    /// before the new one is requested.
    pub fn switch_facing(&mut self) -> BackendResult<()> {
        let next = self.facing_mode.toggled();
        info!(from = %self.facing_mode, to = %next, "Switching camera");

        self.release_source();
        self.start(next)
    }

    /// Pull the current frame from the active source
    ///
    /// Returns `None` when the camera is not active or the source has no
    /// frame ready.
    pub fn read_frame(&mut self) -> Option<CameraFrame> {
        if self.state != CameraState::Active {
            return None;
        }
        self.source.as_mut()?.read_frame()
    }

    fn release_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            debug!(facing = %self.facing_mode, "Releasing frame source");
            source.release();
        }
    }
}

impl<B: CameraBackend> Drop for CameraController<B> {
    fn drop(&mut self) {
        if self.source.is_some() {
            debug!("CameraController dropped, releasing frame source");
            self.release_source();
        }
    }
}

impl<B: CameraBackend> std::fmt::Debug for CameraController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraController")
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .field("facing_mode", &self.facing_mode)
            .field("last_error", &self.last_error)
            .finish()
    }
}
