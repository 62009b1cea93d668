// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backends
//!
//! These stand in for a physical capture device:
//! - [`TestPatternBackend`] produces animated colour bars. Each facing mode
//!   can report its own native resolution, and the source can be told to
//!   report "not ready" for a few reads after opening, like a device that
//!   is still warming up.
//! - [`ImageFileBackend`] streams a still image from disk.

use super::types::*;
use super::{CameraBackend, FrameSource};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// SMPTE-style colour bars
const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

/// Animated test pattern camera
#[derive(Debug, Clone, Default)]
pub struct TestPatternBackend {
    /// Native resolution of the front camera; `None` honours the ideal constraints
    pub front_resolution: Option<(u32, u32)>,
    /// Native resolution of the back camera; `None` honours the ideal constraints
    pub back_resolution: Option<(u32, u32)>,
    /// Reads that return no frame right after opening
    pub warmup_frames: u32,
}

impl TestPatternBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolution_for(&self, constraints: &CaptureConstraints) -> (u32, u32) {
        let native = match constraints.facing_mode {
            FacingMode::Front => self.front_resolution,
            FacingMode::Back => self.back_resolution,
        };
        native.unwrap_or((constraints.ideal_width, constraints.ideal_height))
    }
}

impl CameraBackend for TestPatternBackend {
    fn name(&self) -> &str {
        "test-pattern"
    }

    fn open(&mut self, constraints: &CaptureConstraints) -> BackendResult<Box<dyn FrameSource>> {
        let (width, height) = self.resolution_for(constraints);
        if width == 0 || height == 0 {
            return Err(BackendError::ConstraintMismatch(format!(
                "Cannot produce {}x{} frames",
                width, height
            )));
        }

        info!(
            facing = %constraints.facing_mode,
            width,
            height,
            "Opening test pattern source"
        );

        Ok(Box::new(TestPatternSource {
            width,
            height,
            facing: constraints.facing_mode,
            warmup_remaining: self.warmup_frames,
            frame_index: 0,
            released: false,
        }))
    }
}

struct TestPatternSource {
    width: u32,
    height: u32,
    facing: FacingMode,
    warmup_remaining: u32,
    frame_index: u64,
    released: bool,
}

impl TestPatternSource {
    fn render(&self) -> Vec<u8> {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut data = vec![0u8; width * height * 4];
        let shift = (self.frame_index as usize * 4) % width.max(1);
        let bar_width = width.div_ceil(BARS.len()).max(1);

        for (y, row) in data.chunks_exact_mut(width * 4).enumerate() {
            // Lower eighth is a luminance ramp so filters have gradients to act on
            let ramp = y >= height - height / 8;
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let rgb = if ramp {
                    let v = (x * 255 / width.max(1)) as u8;
                    [v, v, v]
                } else {
                    BARS[((x + shift) % width / bar_width).min(BARS.len() - 1)]
                };
                pixel[..3].copy_from_slice(&rgb);
                pixel[3] = 255;
            }
        }

        data
    }
}

impl FrameSource for TestPatternSource {
    fn read_frame(&mut self) -> Option<CameraFrame> {
        if self.released {
            return None;
        }
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return None;
        }

        let data = self.render();
        self.frame_index += 1;
        Some(CameraFrame {
            width: self.width,
            height: self.height,
            data: Arc::from(data),
            captured_at: Instant::now(),
        })
    }

    fn release(&mut self) {
        if !self.released {
            debug!(facing = %self.facing, frames = self.frame_index, "Test pattern source released");
            self.released = true;
        }
    }
}

/// Camera backed by a still image file
///
/// The image is decoded on every open, so a missing or unreadable file
/// surfaces as an acquisition failure. Both facing modes stream the same
/// picture.
#[derive(Debug, Clone)]
pub struct ImageFileBackend {
    path: PathBuf,
}

impl ImageFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CameraBackend for ImageFileBackend {
    fn name(&self) -> &str {
        "image-file"
    }

    fn open(&mut self, constraints: &CaptureConstraints) -> BackendResult<Box<dyn FrameSource>> {
        let frame = load_image_as_frame(&self.path)?;
        info!(
            path = %self.path.display(),
            facing = %constraints.facing_mode,
            width = frame.width,
            height = frame.height,
            "Opening image file source"
        );
        Ok(Box::new(StillFrameSource { frame: Some(frame) }))
    }
}

struct StillFrameSource {
    frame: Option<CameraFrame>,
}

impl FrameSource for StillFrameSource {
    fn read_frame(&mut self) -> Option<CameraFrame> {
        self.frame.clone()
    }

    fn release(&mut self) {
        self.frame = None;
    }
}

/// Decode an image file into an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::DeviceNotFound(format!(
            "Unsupported image format: {}",
            path.display()
        )));
    }

    let image = image::open(path)
        .map_err(|e| BackendError::DeviceNotFound(format!("{}: {}", path.display(), e)))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    CameraFrame::from_rgba(width, height, image.into_raw())
}
