// SPDX-License-Identifier: GPL-3.0-only

//! Webcam Wizard - filtered webcam capture with a geolocation overlay
//!
//! This library provides the core of the webcam utility: filter synthesis,
//! the camera and location state machines, the render/composite loop and
//! the bounded snapshot gallery.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`filters`]: Filter catalogue, synthesis and CPU application
//! - [`backends`]: Camera and positioning backends with their state machines
//! - [`render`]: Drawing surface, overlay and render loop scheduling
//! - [`pipelines`]: Snapshot encoding and the bounded gallery
//! - [`session`]: Ties the subsystems together for a control surface
//! - [`config`]: User configuration handling
//! - [`storage`]: Snapshot export
//!
//! # Example
//!
//! ```ignore
//! let mut session = WebcamSession::new(TestPatternBackend::new(), NominatimGeocoder::new()?);
//! session.start_camera(FacingMode::Front)?;
//! session.select_filter(FilterSpec::new(FilterKind::Grayscale, 1.5));
//! session.render_tick();
//! let snapshot = session.capture()?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filters;
pub mod pipelines;
pub mod render;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use filters::{FilterKind, FilterSpec, synthesize};
pub use session::WebcamSession;
