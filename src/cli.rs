// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing the filter catalogue
//! - Running the live pipeline headless and exporting the gallery
//! - Resolving a coordinate to a place name

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};
use webcam_wizard::{AppError, AppResult, Config};
use webcam_wizard::backends::camera::{
    CameraBackend, FacingMode, ImageFileBackend, TestPatternBackend,
};
use webcam_wizard::backends::location::{
    NominatimGeocoder, PlaceResolver, PositionEvent, RawPosition, ScriptedPositionSource,
};
use webcam_wizard::constants::render;
use webcam_wizard::filters::{FilterKind, clamp_intensity, synthesize};
use webcam_wizard::render::{FrameClock, LoopAction, RenderLoopController, TickOutcome};
use webcam_wizard::session::WebcamSession;
use webcam_wizard::storage;

/// Position reported by the simulated positioning source
pub struct SimulatedFix {
    pub latitude: f64,
    pub longitude: f64,
    pub heading: Option<f64>,
}

pub struct SnapOptions {
    pub image: Option<PathBuf>,
    pub facing: Option<FacingMode>,
    pub filter: Option<FilterKind>,
    pub intensity: Option<f32>,
    pub frames: u64,
    pub every: u64,
    pub position: Option<SimulatedFix>,
    pub output: Option<PathBuf>,
}

/// Print every filter with its expression at `intensity`
pub fn list_filters(intensity: f32) -> AppResult<()> {
    let intensity = clamp_intensity(intensity);
    println!("Filters at intensity {:.2}:", intensity);
    println!();
    for kind in FilterKind::ALL {
        println!(
            "  {:<16} {:<16} {}",
            kind.id(),
            kind.label(),
            synthesize(kind, intensity)
        );
    }
    Ok(())
}

/// Run the render loop against a virtual camera, capture and export
pub fn snap(config: &Config, options: SnapOptions) -> AppResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_snap(config, options))
}

async fn run_snap(config: &Config, options: SnapOptions) -> AppResult<()> {
    let backend: Box<dyn CameraBackend> = match &options.image {
        Some(path) => Box::new(ImageFileBackend::new(path)),
        None => Box::new(TestPatternBackend::new()),
    };
    let geocoder = NominatimGeocoder::from_config(config)?;
    let mut session = WebcamSession::new(backend, geocoder);

    let mut filter = config.default_filter_spec();
    if let Some(kind) = options.filter {
        filter.kind = kind;
    }
    if let Some(intensity) = options.intensity {
        filter.intensity = intensity;
    }
    session.select_filter(filter);
    println!("Filter: {} ({})", filter.kind.label(), filter.expression());

    let facing = options.facing.unwrap_or(config.default_facing);
    session.start_camera(facing)?;
    println!("Camera: {} ({})", session.camera().backend().name(), facing);

    if let Some(position) = &options.position {
        start_simulated_location(&mut session, position, config).await?;
    }

    let session = Arc::new(Mutex::new(session));
    let every = options.every.max(1);
    let frames = options.frames;
    let mut controller = RenderLoopController::start(
        "snap",
        FrameClock::new(render::FRAME_INTERVAL),
        {
            let session = Arc::clone(&session);
            let mut ticks = 0u64;
            let mut drawn = 0u64;
            move || {
                let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
                ticks += 1;
                if let TickOutcome::Drawn { .. } = session.render_tick() {
                    drawn += 1;
                    if drawn % every == 0 {
                        if let Err(e) = session.capture() {
                            warn!(error = %e, "Capture failed");
                        }
                    }
                }
                if ticks >= frames {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            }
        },
    );

    while controller.is_running() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let ticks = controller.join().unwrap_or(0);
    info!(ticks, "Render loop finished");

    let mut session = Arc::try_unwrap(session)
        .map_err(|_| AppError::Other("render loop still holds the session".to_string()))?
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);

    let dir = options.output.unwrap_or_else(|| storage::export_dir(config));
    let paths = storage::export_all(session.snapshots(), &dir).await?;
    println!(
        "Rendered {} frames, exported {} snapshot(s) to {}",
        session.compositor().frames_drawn(),
        paths.len(),
        dir.display()
    );
    for path in &paths {
        println!("  {}", path.display());
    }

    session.teardown();
    Ok(())
}

async fn start_simulated_location(
    session: &mut WebcamSession<Box<dyn CameraBackend>, NominatimGeocoder>,
    position: &SimulatedFix,
    config: &Config,
) -> AppResult<()> {
    let mut raw = RawPosition::new(position.latitude, position.longitude, 5.0);
    if let Some(heading) = position.heading {
        raw = raw.with_heading(heading);
    }
    let source = ScriptedPositionSource::new(vec![PositionEvent::Fix(raw)], Duration::ZERO);

    let mut fixes = session.tracker().subscribe();
    session.start_location(&source)?;

    // The overlay only appears once the fix has its place name
    let wait = Duration::from_secs(config.geocoder_timeout_secs + 1);
    match tokio::time::timeout(wait, fixes.changed()).await {
        Ok(Ok(())) => {
            if let Some(fix) = fixes.borrow().clone() {
                println!(
                    "Location: {:.4}, {:.4} ({})",
                    fix.latitude,
                    fix.longitude,
                    fix.place_name.as_deref().unwrap_or("Unknown")
                );
            }
        }
        _ => warn!("No location fix before rendering started"),
    }
    Ok(())
}

/// Resolve a coordinate through the configured geocoder
pub fn geocode(config: &Config, latitude: f64, longitude: f64) -> AppResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let resolver = PlaceResolver::new(NominatimGeocoder::from_config(config)?);
    let name = runtime.block_on(resolver.resolve(latitude, longitude));
    println!("{}", name);
    Ok(())
}
