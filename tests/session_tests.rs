// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests for the webcam session

use std::time::Duration;
use webcam_wizard::WebcamSession;
use webcam_wizard::backends::camera::{CameraState, FacingMode, TestPatternBackend};
use webcam_wizard::backends::location::{
    Address, ChannelPositionSource, PositionEvent, RawPosition, ReverseGeocoder,
};
use webcam_wizard::errors::{GeocodeError, SnapshotError};
use webcam_wizard::filters::{FilterKind, FilterSpec};
use webcam_wizard::pipelines::snapshot::BlobRegistry;
use webcam_wizard::render::TickOutcome;

struct StaticGeocoder;

impl ReverseGeocoder for StaticGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Address, GeocodeError> {
        Ok(Address {
            town: Some("Testville".to_string()),
            ..Default::default()
        })
    }
}

fn backend() -> TestPatternBackend {
    TestPatternBackend {
        front_resolution: Some((64, 48)),
        back_resolution: Some((32, 24)),
        warmup_frames: 0,
    }
}

fn session() -> WebcamSession<TestPatternBackend, StaticGeocoder> {
    WebcamSession::new(backend(), StaticGeocoder)
}

fn decode(
    session: &WebcamSession<TestPatternBackend, StaticGeocoder>,
    index: usize,
) -> image::RgbaImage {
    let snapshot = session.snapshots().get(index).unwrap();
    let data = session.snapshots().data(snapshot).unwrap();
    image::load_from_memory(&data).unwrap().to_rgba8()
}

#[test]
fn test_grayscale_capture_and_eviction() {
    let mut session = session();
    session.start_camera(FacingMode::Front).unwrap();
    session.select_filter(FilterSpec::new(FilterKind::Grayscale, 1.5));

    assert!(matches!(session.render_tick(), TickOutcome::Drawn { .. }));
    let first = session.capture().unwrap();
    assert_eq!(session.snapshots().len(), 1);

    // The captured pixels went through the grayscale filter
    let image = decode(&session, 0);
    assert_eq!(image.dimensions(), (64, 48));
    for pixel in image.pixels() {
        assert_eq!(pixel[0], pixel[1]);
        assert_eq!(pixel[1], pixel[2]);
    }

    let mut latest = first.clone();
    for _ in 0..10 {
        session.render_tick();
        latest = session.capture().unwrap();
        assert!(session.snapshots().len() <= 10);
    }

    assert_eq!(session.snapshots().len(), 10);
    assert_eq!(session.snapshots().get(0), Some(&latest));
    assert_eq!(session.snapshots().registry().released_count(), 1);
    assert!(session.snapshots().data(&first).is_none());
}

#[test]
fn test_capture_without_frame_fails() {
    let mut session = session();
    assert!(matches!(
        session.capture(),
        Err(SnapshotError::NoFrameAvailable)
    ));

    // A camera that is not streaming yet skips ticks instead of failing
    assert_eq!(session.render_tick(), TickOutcome::Skipped);
    assert!(matches!(
        session.capture(),
        Err(SnapshotError::NoFrameAvailable)
    ));
}

#[test]
fn test_warming_up_source_skips_ticks() {
    let mut session = WebcamSession::new(
        TestPatternBackend {
            front_resolution: Some((16, 16)),
            warmup_frames: 3,
            ..Default::default()
        },
        StaticGeocoder,
    );
    session.start_camera(FacingMode::Front).unwrap();

    for _ in 0..3 {
        assert_eq!(session.render_tick(), TickOutcome::Skipped);
    }
    assert_eq!(
        session.render_tick(),
        TickOutcome::Drawn {
            width: 16,
            height: 16
        }
    );
}

#[test]
fn test_switch_camera_follows_new_resolution() {
    let mut session = session();
    session.start_camera(FacingMode::Front).unwrap();
    session.render_tick();
    assert_eq!(session.compositor().surface().dimensions(), (64, 48));

    session.switch_camera().unwrap();
    assert_eq!(session.camera().facing_mode(), FacingMode::Back);
    assert_eq!(
        session.render_tick(),
        TickOutcome::Drawn {
            width: 32,
            height: 24
        }
    );
    assert_eq!(session.compositor().surface().dimensions(), (32, 24));
}

#[test]
fn test_stopped_camera_produces_no_frames() {
    let mut session = session();
    session.start_camera(FacingMode::Front).unwrap();
    session.render_tick();

    session.stop_camera();
    session.stop_camera();
    assert_eq!(session.camera().state(), CameraState::Idle);
    assert_eq!(session.render_tick(), TickOutcome::Skipped);
}

#[test]
fn test_camera_failure_surfaces_message() {
    let mut session = WebcamSession::new(
        TestPatternBackend {
            back_resolution: Some((0, 0)),
            ..Default::default()
        },
        StaticGeocoder,
    );
    assert!(session.start_camera(FacingMode::Back).is_err());
    assert_eq!(session.camera().state(), CameraState::Error);
    assert!(session.camera().error().is_some());

    // Explicit retry with a working camera recovers
    session.start_camera(FacingMode::Front).unwrap();
    assert_eq!(session.camera().state(), CameraState::Active);
    assert!(session.camera().error().is_none());
}

#[tokio::test]
async fn test_overlay_is_baked_into_capture() {
    let mut session = WebcamSession::new(
        TestPatternBackend {
            front_resolution: Some((640, 480)),
            ..Default::default()
        },
        StaticGeocoder,
    );
    session.start_camera(FacingMode::Front).unwrap();

    // The test pattern never contains pure white; the overlay does
    let is_white = |p: &image::Rgba<u8>| p.0 == [255, 255, 255, 255];

    session.render_tick();
    session.capture().unwrap();
    assert!(!decode(&session, 0).pixels().any(is_white));

    let (source, feed) = ChannelPositionSource::new();
    let mut fixes = session.tracker().subscribe();
    session.start_location(&source).unwrap();
    feed.push(PositionEvent::Fix(
        RawPosition::new(52.52, 13.405, 5.0).with_heading(90.0),
    ));
    tokio::time::timeout(Duration::from_secs(5), fixes.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        session.tracker().latest_fix().unwrap().place_name.as_deref(),
        Some("Testville")
    );

    session.render_tick();
    session.capture().unwrap();
    let with_overlay = decode(&session, 0);
    assert!(with_overlay.pixels().any(is_white));
    // Compass ring to the right of the top-center anchor
    assert!(is_white(with_overlay.get_pixel(364, 70)));
}

#[tokio::test]
async fn test_teardown_releases_everything() {
    let mut session = session();
    session.start_camera(FacingMode::Front).unwrap();
    let (source, feed) = ChannelPositionSource::new();
    session.start_location(&source).unwrap();
    session.render_tick();
    session.capture().unwrap();

    session.teardown();

    assert_eq!(session.camera().state(), CameraState::Idle);
    assert!(!session.tracker().is_watching());
    assert!(session.tracker().latest_fix().is_none());
    assert!(session.snapshots().is_empty());
    assert_eq!(session.snapshots().registry().live_count(), 0);

    for _ in 0..100 {
        if feed.active_watches() == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(feed.active_watches(), 0);
}
