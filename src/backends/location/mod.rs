// SPDX-License-Identifier: GPL-3.0-only

//! Positioning backend abstraction
//!
//! A [`PositionSource`] is the platform positioning API: it hands out a
//! [`PositionWatch`] that streams [`PositionEvent`]s until it is dropped.
//! The [`LocationTracker`] consumes one watch at a time, resolves a place
//! name for every fix through the [`PlaceResolver`] and publishes the
//! resulting [`LocationFix`].

pub mod geocode;
pub mod scripted;
pub mod tracker;

pub use geocode::{Address, CoordKey, NominatimGeocoder, PlaceNameCache, PlaceResolver, ReverseGeocoder};
pub use scripted::{ChannelPositionSource, PositionFeed, ScriptedPositionSource};
pub use tracker::{LocationTracker, TrackerState};

use crate::constants::positioning;
use crate::errors::LocationError;
use std::time::Duration;
use tokio::sync::mpsc;

/// Options passed to the positioning API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub max_fix_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: positioning::HIGH_ACCURACY,
            timeout: positioning::FIX_TIMEOUT,
            max_fix_age: positioning::MAX_FIX_AGE,
        }
    }
}

/// One raw sample from the positioning API
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters
    pub accuracy: f64,
    pub altitude: Option<f64>,
    /// Degrees clockwise from true north, when the device reports direction
    pub heading: Option<f64>,
}

impl RawPosition {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            altitude: None,
            heading: None,
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }
}

/// Event delivered by a position watch
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(RawPosition),
    Error(LocationError),
}

/// An active position subscription
///
/// Dropping the watch cancels the platform subscription.
pub struct PositionWatch {
    events: mpsc::UnboundedReceiver<PositionEvent>,
    on_clear: Option<Box<dyn FnOnce() + Send>>,
}

impl PositionWatch {
    pub fn new(events: mpsc::UnboundedReceiver<PositionEvent>) -> Self {
        Self {
            events,
            on_clear: None,
        }
    }

    /// Attach a callback that runs when the watch is cleared
    pub fn on_clear(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_clear = Some(Box::new(callback));
        self
    }

    /// Wait for the next event; `None` once the source has gone away
    pub async fn next_event(&mut self) -> Option<PositionEvent> {
        self.events.recv().await
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.events.close();
        if let Some(callback) = self.on_clear.take() {
            callback();
        }
    }
}

/// Platform positioning API
pub trait PositionSource: Send + Sync {
    /// Whether the platform has any positioning capability
    fn is_available(&self) -> bool;

    /// Start continuous position reporting
    fn watch(&self, options: PositionOptions) -> Result<PositionWatch, LocationError>;
}

/// Latest published position
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    /// Degrees, within [-90, 90]
    pub latitude: f64,
    /// Degrees, within [-180, 180]
    pub longitude: f64,
    /// Accuracy radius in meters
    pub accuracy: f64,
    pub altitude: Option<f64>,
    /// Degrees in [0, 360), present only when the device reports direction
    pub heading: Option<f64>,
    /// Resolved place name, may be "Unknown"
    pub place_name: Option<String>,
}

impl LocationFix {
    /// Build a fix from a raw sample, rejecting out-of-range coordinates
    pub fn from_position(position: &RawPosition, place_name: Option<String>) -> Option<Self> {
        let valid_lat = (-90.0..=90.0).contains(&position.latitude);
        let valid_lon = (-180.0..=180.0).contains(&position.longitude);
        if !valid_lat || !valid_lon {
            return None;
        }

        Some(Self {
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: position.accuracy,
            altitude: position.altitude.filter(|a| a.is_finite()),
            heading: position
                .heading
                .filter(|h| h.is_finite())
                .map(|h| h.rem_euclid(360.0)),
            place_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_position_options() {
        let options = PositionOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.max_fix_age, Duration::from_secs(30));
    }

    #[test]
    fn test_fix_rejects_out_of_range_coordinates() {
        assert!(LocationFix::from_position(&RawPosition::new(91.0, 0.0, 5.0), None).is_none());
        assert!(LocationFix::from_position(&RawPosition::new(0.0, -180.5, 5.0), None).is_none());
        assert!(LocationFix::from_position(&RawPosition::new(-90.0, 180.0, 5.0), None).is_some());
    }

    #[test]
    fn test_fix_normalizes_heading() {
        let raw = RawPosition::new(52.52, 13.405, 5.0).with_heading(-90.0);
        let fix = LocationFix::from_position(&raw, None).unwrap();
        assert_eq!(fix.heading, Some(270.0));

        let raw = RawPosition::new(52.52, 13.405, 5.0).with_heading(f64::NAN);
        let fix = LocationFix::from_position(&raw, None).unwrap();
        assert_eq!(fix.heading, None);
    }
}
