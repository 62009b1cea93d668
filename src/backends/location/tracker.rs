// SPDX-License-Identifier: GPL-3.0-only

//! Location tracking state machine
//!
//! ```text
//! Stopped ──start_watching──▶ Watching ──stop_watching──▶ Stopped
//!    │                           │
//!    └──no capability──▶ Error ◀─┘ positioning error
//! ```
//!
//! Every fix is resolved to a place name before it is published, so a
//! published fix always carries its place name (or "Unknown"). Fixes are
//! processed in arrival order by one background task per watch. Stopping
//! bumps a generation counter under the shared lock, so a resolution that
//! completes after the stop can never publish.

use super::geocode::{PlaceResolver, ReverseGeocoder};
use super::{LocationFix, PositionEvent, PositionOptions, PositionSource, PositionWatch};
use crate::errors::LocationError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Tracker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerState {
    #[default]
    Stopped,
    Watching,
    Error,
}

#[derive(Debug, Default)]
struct TrackerShared {
    state: TrackerState,
    error: Option<String>,
    generation: u64,
}

/// Continuous position tracker with place-name resolution
pub struct LocationTracker<G: ReverseGeocoder + 'static> {
    resolver: Arc<PlaceResolver<G>>,
    shared: Arc<Mutex<TrackerShared>>,
    fix_tx: watch::Sender<Option<LocationFix>>,
    task: Option<JoinHandle<()>>,
}

fn lock(shared: &Mutex<TrackerShared>) -> MutexGuard<'_, TrackerShared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<G: ReverseGeocoder + 'static> LocationTracker<G> {
    /// Create a stopped tracker with an empty place-name cache
    pub fn new(geocoder: G) -> Self {
        let (fix_tx, _) = watch::channel(None);
        Self {
            resolver: Arc::new(PlaceResolver::new(geocoder)),
            shared: Arc::new(Mutex::new(TrackerShared::default())),
            fix_tx,
            task: None,
        }
    }

    pub fn state(&self) -> TrackerState {
        lock(&self.shared).state
    }

    pub fn is_watching(&self) -> bool {
        self.state() == TrackerState::Watching
    }

    /// Message of the last positioning failure, while in the error state
    pub fn error(&self) -> Option<String> {
        lock(&self.shared).error.clone()
    }

    /// The most recently published fix
    pub fn latest_fix(&self) -> Option<LocationFix> {
        self.fix_tx.borrow().clone()
    }

    /// Receiver notified whenever a fix is published or cleared
    pub fn subscribe(&self) -> watch::Receiver<Option<LocationFix>> {
        self.fix_tx.subscribe()
    }

    pub fn resolver(&self) -> &PlaceResolver<G> {
        &self.resolver
    }

    /// Begin continuous position reporting
    ///
    /// Must be called from within a Tokio runtime. Calling it while already
    /// watching does nothing. A platform without positioning capability
    /// puts the tracker straight into the error state.
    pub fn start_watching(&mut self, source: &dyn PositionSource) -> Result<(), LocationError> {
        if self.is_watching() {
            debug!("Location tracker already watching");
            return Ok(());
        }

        if !source.is_available() {
            warn!("No positioning capability");
            self.fail(LocationError::Unsupported.to_string());
            return Err(LocationError::Unsupported);
        }

        let watch = match source.watch(PositionOptions::default()) {
            Ok(watch) => watch,
            Err(e) => {
                warn!(error = %e, "Failed to start position watch");
                self.fail(e.to_string());
                return Err(e);
            }
        };

        self.abort_task();
        let generation = {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            shared.state = TrackerState::Watching;
            shared.error = None;
            shared.generation
        };

        info!(generation, "Location tracking started");
        self.task = Some(tokio::spawn(run_watch(
            watch,
            Arc::clone(&self.resolver),
            Arc::clone(&self.shared),
            self.fix_tx.clone(),
            generation,
        )));

        Ok(())
    }

    /// Cancel the subscription and clear the published fix
    pub fn stop_watching(&mut self) {
        self.abort_task();
        {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            if shared.state != TrackerState::Stopped {
                info!("Location tracking stopped");
            }
            shared.state = TrackerState::Stopped;
            shared.error = None;
        }
        self.fix_tx.send_replace(None);
    }

    fn fail(&mut self, message: String) {
        self.abort_task();
        let mut shared = lock(&self.shared);
        shared.generation += 1;
        shared.state = TrackerState::Error;
        shared.error = Some(message);
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<G: ReverseGeocoder + 'static> Drop for LocationTracker<G> {
    fn drop(&mut self) {
        self.abort_task();
        self.resolver.cache().clear();
    }
}

/// Consume one position watch until it ends, errors or is superseded
async fn run_watch<G: ReverseGeocoder>(
    mut watch: PositionWatch,
    resolver: Arc<PlaceResolver<G>>,
    shared: Arc<Mutex<TrackerShared>>,
    fix_tx: watch::Sender<Option<LocationFix>>,
    generation: u64,
) {
    while let Some(event) = watch.next_event().await {
        match event {
            PositionEvent::Fix(position) => {
                let Some(mut fix) = LocationFix::from_position(&position, None) else {
                    warn!(
                        latitude = position.latitude,
                        longitude = position.longitude,
                        "Discarding out-of-range position"
                    );
                    continue;
                };
                fix.place_name = Some(resolver.resolve(fix.latitude, fix.longitude).await);

                let guard = lock(&shared);
                if guard.generation != generation || guard.state != TrackerState::Watching {
                    debug!(generation, "Dropping fix from superseded watch");
                    return;
                }
                debug!(
                    latitude = fix.latitude,
                    longitude = fix.longitude,
                    place = ?fix.place_name,
                    "Publishing fix"
                );
                fix_tx.send_replace(Some(fix));
                drop(guard);
            }
            PositionEvent::Error(e) => {
                let mut guard = lock(&shared);
                if guard.generation == generation {
                    warn!(error = %e, "Positioning error");
                    guard.state = TrackerState::Error;
                    guard.error = Some(e.to_string());
                }
                return;
            }
        }
    }
    debug!(generation, "Position watch ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::location::geocode::Address;
    use crate::backends::location::{ChannelPositionSource, RawPosition};
    use crate::errors::GeocodeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGeocoder {
        calls: Arc<AtomicUsize>,
    }

    impl ReverseGeocoder for FixedGeocoder {
        async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Address, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Address {
                city: Some("Berlin".to_string()),
                ..Default::default()
            })
        }
    }

    fn tracker() -> (LocationTracker<FixedGeocoder>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            LocationTracker::new(FixedGeocoder {
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }

    async fn next_fix(rx: &mut watch::Receiver<Option<LocationFix>>) -> Option<LocationFix> {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test]
    async fn test_fix_is_published_with_place_name() {
        let (mut tracker, _calls) = tracker();
        let (source, feed) = ChannelPositionSource::new();
        let mut rx = tracker.subscribe();

        tracker.start_watching(&source).unwrap();
        assert_eq!(tracker.state(), TrackerState::Watching);

        feed.push(PositionEvent::Fix(
            RawPosition::new(52.52, 13.405, 8.0).with_heading(45.0),
        ));
        let fix = next_fix(&mut rx).await.unwrap();
        assert_eq!(fix.place_name.as_deref(), Some("Berlin"));
        assert_eq!(fix.heading, Some(45.0));
        assert_eq!(tracker.latest_fix(), Some(fix));
    }

    #[tokio::test]
    async fn test_stop_clears_published_fix() {
        let (mut tracker, _calls) = tracker();
        let (source, feed) = ChannelPositionSource::new();
        let mut rx = tracker.subscribe();
        tracker.start_watching(&source).unwrap();

        feed.push(PositionEvent::Fix(RawPosition::new(52.52, 13.405, 8.0)));
        next_fix(&mut rx).await.unwrap();

        tracker.stop_watching();
        assert_eq!(tracker.state(), TrackerState::Stopped);
        assert!(tracker.latest_fix().is_none());

        // The aborted task drops its watch, which cancels the subscription
        for _ in 0..100 {
            if feed.active_watches() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(feed.active_watches(), 0);
        feed.push(PositionEvent::Fix(RawPosition::new(1.0, 1.0, 1.0)));
        tokio::task::yield_now().await;
        assert!(tracker.latest_fix().is_none());
    }

    #[tokio::test]
    async fn test_unsupported_platform_enters_error() {
        let (mut tracker, _calls) = tracker();
        let source = ChannelPositionSource::unsupported();

        assert_eq!(
            tracker.start_watching(&source),
            Err(LocationError::Unsupported)
        );
        assert_eq!(tracker.state(), TrackerState::Error);
        assert_eq!(tracker.error().as_deref(), Some("Geolocation not supported"));
    }

    #[tokio::test]
    async fn test_positioning_error_stops_publication() {
        let (mut tracker, _calls) = tracker();
        let (source, feed) = ChannelPositionSource::new();
        tracker.start_watching(&source).unwrap();

        feed.push(PositionEvent::Error(LocationError::PermissionDenied(
            "User denied Geolocation".into(),
        )));
        for _ in 0..100 {
            if tracker.state() == TrackerState::Error {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(tracker.state(), TrackerState::Error);
        assert_eq!(
            tracker.error().as_deref(),
            Some("GPS Error: User denied Geolocation")
        );

        // Explicit retry recovers
        tracker.start_watching(&source).unwrap();
        assert_eq!(tracker.state(), TrackerState::Watching);
        assert!(tracker.error().is_none());
    }

    #[tokio::test]
    async fn test_nearby_fixes_resolve_once() {
        let (mut tracker, calls) = tracker();
        let (source, feed) = ChannelPositionSource::new();
        let mut rx = tracker.subscribe();
        tracker.start_watching(&source).unwrap();

        feed.push(PositionEvent::Fix(RawPosition::new(52.5200, 13.4050, 8.0)));
        next_fix(&mut rx).await.unwrap();
        feed.push(PositionEvent::Fix(RawPosition::new(52.52001, 13.40499, 8.0)));
        let fix = next_fix(&mut rx).await.unwrap();

        assert_eq!(fix.latitude, 52.52001);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
