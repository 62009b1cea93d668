// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use std::time::Duration;
use webcam_wizard::constants::{capture, overlay, positioning, render, snapshots};

#[test]
fn test_capture_constraints() {
    assert_eq!((capture::IDEAL_WIDTH, capture::IDEAL_HEIGHT), (1280, 720));
}

#[test]
fn test_positioning_parameters() {
    assert!(positioning::HIGH_ACCURACY);
    assert_eq!(positioning::FIX_TIMEOUT, Duration::from_millis(10_000));
    assert_eq!(positioning::MAX_FIX_AGE, Duration::from_millis(30_000));
    assert_eq!(positioning::CACHE_PRECISION, 4);
    assert_eq!(positioning::UNKNOWN_PLACE, "Unknown");
}

#[test]
fn test_frame_interval_matches_target_rate() {
    let per_second = render::FRAME_INTERVAL * render::TARGET_FPS;
    // Integer nanoseconds lose less than one per frame
    assert!(per_second <= Duration::from_secs(1));
    assert!(per_second > Duration::from_millis(999));
}

#[test]
fn test_gallery_capacity() {
    assert_eq!(snapshots::MAX_SNAPSHOTS, 10);
    assert_eq!(snapshots::EXPORT_PREFIX, "wizard");
}

#[test]
fn test_overlay_layout_is_consistent() {
    // Needle stays inside the ring, ring stays below the top edge
    assert!(overlay::NEEDLE_LENGTH < overlay::COMPASS_RADIUS);
    assert!(overlay::COMPASS_TOP > overlay::COMPASS_RADIUS);
    assert!(overlay::PLACE_SCALE > overlay::COORDS_SCALE);
}
