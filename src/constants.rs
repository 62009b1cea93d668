// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Capture constraints requested from the camera device
///
/// These are hints. The device may deliver a different resolution, so the
/// render loop reads frame dimensions from the live source on every tick.
pub mod capture {
    /// Ideal capture width in pixels
    pub const IDEAL_WIDTH: u32 = 1280;

    /// Ideal capture height in pixels
    pub const IDEAL_HEIGHT: u32 = 720;
}

/// Positioning parameters (fixed, not user configurable)
pub mod positioning {
    use super::Duration;

    /// Request the most accurate fixes the platform can provide
    pub const HIGH_ACCURACY: bool = true;

    /// Per-fix acquisition timeout
    pub const FIX_TIMEOUT: Duration = Duration::from_millis(10_000);

    /// Maximum age of a cached platform fix that is still acceptable
    pub const MAX_FIX_AGE: Duration = Duration::from_millis(30_000);

    /// Decimal places used to quantize coordinates for the place-name cache (~11 m grid)
    pub const CACHE_PRECISION: i32 = 4;

    /// Placeholder returned when a place name cannot be resolved
    pub const UNKNOWN_PLACE: &str = "Unknown";
}

/// Reverse geocoding service defaults
pub mod geocoding {
    use super::Duration;

    /// Nominatim reverse lookup endpoint
    pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";

    /// Identifying client tag sent with every lookup
    pub const DEFAULT_USER_AGENT: &str = "WebcamWizard/1.0 (educational project)";

    /// City-level detail
    pub const DEFAULT_ZOOM: u8 = 14;

    /// HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Render loop timing
pub mod render {
    use super::Duration;

    /// Target display refresh rate
    pub const TARGET_FPS: u32 = 60;

    /// Interval between ticks at the target refresh rate
    pub const FRAME_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / TARGET_FPS as u64);
}

/// Snapshot gallery
pub mod snapshots {
    /// Maximum number of snapshots retained in the gallery
    pub const MAX_SNAPSHOTS: usize = 10;

    /// Prefix of exported snapshot file names (`wizard-<n>.png`)
    pub const EXPORT_PREFIX: &str = "wizard";
}

/// Overlay layout (pixels, relative to the surface edges)
pub mod overlay {
    /// Distance of the compass center from the top edge
    pub const COMPASS_TOP: f32 = 70.0;

    /// Compass ring radius
    pub const COMPASS_RADIUS: f32 = 44.0;

    /// Compass needle length from center to tip
    pub const NEEDLE_LENGTH: f32 = 36.0;

    /// Margin from the right edge for text blocks
    pub const TEXT_MARGIN: u32 = 20;

    /// Top of the coordinate text block
    pub const COORDS_TOP: u32 = 20;

    /// Distance of the place-name baseline from the bottom edge
    pub const PLACE_BOTTOM: u32 = 24;

    /// Pixel scale of the coordinate font (glyph cell = 6x8 font pixels)
    pub const COORDS_SCALE: u32 = 3;

    /// Pixel scale of the place-name font
    pub const PLACE_SCALE: u32 = 6;
}

/// Supported still-image file extensions for the image-file camera source
pub mod file_formats {
    /// Image extensions accepted by the still-image camera source
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

    /// Check if an extension (lowercase, without dot) is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext)
    }
}
