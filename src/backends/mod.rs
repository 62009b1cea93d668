// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera and positioning
//!
//! # Architecture
//!
//! The backend layer abstracts platform access, providing a consistent API
//! regardless of where frames and fixes come from:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                Session Layer                │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │               Backend Layer                 │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │      Camera      │  │    Location     │  │
//! │  │ CameraController │  │ LocationTracker │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! │                        ┌─────────────────┐  │
//! │                        │ Reverse geocode │  │
//! │                        │   (Nominatim)   │  │
//! │                        └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Capture device API, acquisition state machine, virtual cameras
//! - [`location`]: Positioning API, tracking state machine, place-name resolution

pub mod camera;
pub mod location;
