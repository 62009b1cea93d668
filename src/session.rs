// SPDX-License-Identifier: GPL-3.0-only

//! Webcam session
//!
//! Owns one of each subsystem and exposes the actions a control surface
//! triggers: camera start/stop/switch, location start/stop, filter
//! selection, render ticks and snapshot capture. Dropping the session
//! releases the camera, cancels location tracking and frees every snapshot.

use crate::backends::camera::{BackendError, CameraBackend, CameraController, FacingMode};
use crate::backends::location::{LocationTracker, PositionSource, ReverseGeocoder};
use crate::errors::{LocationError, SnapshotError};
use crate::filters::{FilterKind, FilterSpec};
use crate::pipelines::snapshot::{Snapshot, SnapshotStore};
use crate::render::{Compositor, TickOutcome};
use tracing::{debug, info};

pub struct WebcamSession<B: CameraBackend, G: ReverseGeocoder + 'static> {
    camera: CameraController<B>,
    tracker: LocationTracker<G>,
    compositor: Compositor,
    filter: FilterSpec,
    snapshots: SnapshotStore,
}

impl<B: CameraBackend, G: ReverseGeocoder + 'static> WebcamSession<B, G> {
    pub fn new(backend: B, geocoder: G) -> Self {
        Self {
            camera: CameraController::new(backend),
            tracker: LocationTracker::new(geocoder),
            compositor: Compositor::new(),
            filter: FilterSpec::default(),
            snapshots: SnapshotStore::default(),
        }
    }

    pub fn camera(&self) -> &CameraController<B> {
        &self.camera
    }

    pub fn tracker(&self) -> &LocationTracker<G> {
        &self.tracker
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn filter(&self) -> FilterSpec {
        self.filter
    }

    pub fn select_filter(&mut self, filter: FilterSpec) {
        debug!(filter = %filter.kind, intensity = filter.intensity, "Filter selected");
        self.filter = filter;
    }

    pub fn set_filter_kind(&mut self, kind: FilterKind) {
        self.select_filter(FilterSpec::new(kind, self.filter.intensity));
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.select_filter(FilterSpec::new(self.filter.kind, intensity));
    }

    pub fn start_camera(&mut self, facing_mode: FacingMode) -> Result<(), BackendError> {
        self.camera.start(facing_mode)
    }

    pub fn stop_camera(&mut self) {
        self.camera.stop();
    }

    pub fn switch_camera(&mut self) -> Result<(), BackendError> {
        self.camera.switch_facing()
    }

    /// Begin location tracking; must be called within a Tokio runtime
    pub fn start_location(&mut self, source: &dyn PositionSource) -> Result<(), LocationError> {
        self.tracker.start_watching(source)
    }

    pub fn stop_location(&mut self) {
        self.tracker.stop_watching();
    }

    /// Draw the current frame with the selected filter and any location fix
    pub fn render_tick(&mut self) -> TickOutcome {
        let frame = self.camera.read_frame();
        let expression = self.filter.expression();
        let fix = self.tracker.latest_fix();
        self.compositor
            .render(frame.as_ref(), &expression, fix.as_ref())
    }

    /// Capture the composited surface into the gallery
    ///
    /// Reads the pixels of the last completed tick, overlay included.
    pub fn capture(&mut self) -> Result<Snapshot, SnapshotError> {
        if !self.compositor.has_frame() {
            return Err(SnapshotError::NoFrameAvailable);
        }
        self.snapshots.capture(self.compositor.surface().pixels())
    }

    pub fn remove_snapshot(&mut self, index: usize) -> Result<Snapshot, SnapshotError> {
        self.snapshots.remove(index)
    }

    pub fn clear_snapshots(&mut self) -> usize {
        self.snapshots.clear()
    }

    /// Release every held resource
    pub fn teardown(&mut self) {
        info!("Tearing down webcam session");
        self.camera.stop();
        self.tracker.stop_watching();
        self.snapshots.clear();
    }
}

impl<B: CameraBackend, G: ReverseGeocoder + 'static> Drop for WebcamSession<B, G> {
    fn drop(&mut self) {
        self.teardown();
    }
}
