// SPDX-License-Identifier: GPL-3.0-only

//! Positioning sources without positioning hardware
//!
//! - [`ChannelPositionSource`] forwards whatever is pushed into its
//!   [`PositionFeed`] to every active watch.
//! - [`ScriptedPositionSource`] replays a fixed list of events at an interval.

use super::{PositionEvent, PositionOptions, PositionSource, PositionWatch};
use crate::errors::LocationError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<PositionEvent>>>>;

/// Handle used to inject events into a [`ChannelPositionSource`]
#[derive(Clone, Default)]
pub struct PositionFeed {
    subscribers: Subscribers,
}

impl PositionFeed {
    /// Deliver an event to every active watch
    ///
    /// Returns the number of watches that received it.
    pub fn push(&self, event: PositionEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Number of watches currently subscribed
    pub fn active_watches(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

/// Position source driven through a [`PositionFeed`]
pub struct ChannelPositionSource {
    feed: PositionFeed,
    available: bool,
}

impl ChannelPositionSource {
    pub fn new() -> (Self, PositionFeed) {
        let feed = PositionFeed::default();
        (
            Self {
                feed: feed.clone(),
                available: true,
            },
            feed,
        )
    }

    /// A platform without positioning capability
    pub fn unsupported() -> Self {
        Self {
            feed: PositionFeed::default(),
            available: false,
        }
    }
}

impl PositionSource for ChannelPositionSource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn watch(&self, options: PositionOptions) -> Result<PositionWatch, LocationError> {
        if !self.available {
            return Err(LocationError::Unsupported);
        }

        debug!(?options, "Channel position watch registered");
        let (tx, rx) = mpsc::unbounded_channel();
        self.feed
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Ok(PositionWatch::new(rx))
    }
}

/// Replays a list of events, one per interval
///
/// Each watch replays the list from the start. Must be watched from within
/// a Tokio runtime.
#[derive(Debug, Clone)]
pub struct ScriptedPositionSource {
    events: Vec<PositionEvent>,
    interval: Duration,
}

impl ScriptedPositionSource {
    pub fn new(events: Vec<PositionEvent>, interval: Duration) -> Self {
        Self { events, interval }
    }
}

impl PositionSource for ScriptedPositionSource {
    fn is_available(&self) -> bool {
        true
    }

    fn watch(&self, options: PositionOptions) -> Result<PositionWatch, LocationError> {
        debug!(?options, events = self.events.len(), "Scripted position watch started");

        let (tx, rx) = mpsc::unbounded_channel();
        let events = self.events.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            for event in events {
                if tx.send(event).is_err() {
                    return;
                }
                tokio::time::sleep(interval).await;
            }
            // Hold the channel open like a live subscription would
            tx.closed().await;
        });

        Ok(PositionWatch::new(rx).on_clear(move || task.abort()))
    }
}
