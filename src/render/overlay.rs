// SPDX-License-Identifier: GPL-3.0-only

//! Geolocation overlay
//!
//! Drawn over the filtered frame so it is baked into anything captured
//! from the surface:
//! - compass ring and needle at the top center, rotated to the heading
//!   (only when the device reports a heading)
//! - latitude and longitude at the top right
//! - resolved place name at the bottom right in a large font
//!
//! All drawing happens between a save and a restore of the surface state.

use super::font;
use super::surface::{BLACK, Shadow, Surface, WHITE};
use crate::backends::location::LocationFix;
use crate::constants::overlay;

const NEEDLE_NORTH: [u8; 4] = [230, 40, 40, 255];
const NEEDLE_HALF_WIDTH: f32 = 6.0;
const RING_WIDTH: f32 = 3.0;

const OVERLAY_SHADOW: Shadow = Shadow {
    color: BLACK,
    offset_x: 2.0,
    offset_y: 2.0,
};

/// Latitude as shown in the overlay, e.g. `52.5200°N`
pub fn format_latitude(latitude: f64) -> String {
    format!("{:.4}°N", latitude)
}

/// Longitude as shown in the overlay, e.g. `13.4050°E`
pub fn format_longitude(longitude: f64) -> String {
    format!("{:.4}°E", longitude)
}

/// Composite the overlay for `fix` onto the surface
pub fn draw_overlay(surface: &mut Surface, fix: &LocationFix) {
    surface.save();
    surface.set_shadow(Some(OVERLAY_SHADOW));

    if let Some(heading) = fix.heading {
        draw_compass(surface, heading as f32);
    }

    surface.set_fill(WHITE);
    let line_height = font::text_height(overlay::COORDS_SCALE) as i64;
    let top = overlay::COORDS_TOP as i64;
    for (line, text) in [
        format_latitude(fix.latitude),
        format_longitude(fix.longitude),
    ]
    .iter()
    .enumerate()
    {
        let x = right_aligned_x(surface, text, overlay::COORDS_SCALE);
        surface.fill_text(text, x, top + line as i64 * line_height, overlay::COORDS_SCALE);
    }

    if let Some(place) = fix.place_name.as_deref().filter(|p| !p.is_empty()) {
        let x = right_aligned_x(surface, place, overlay::PLACE_SCALE);
        let y = surface.height() as i64
            - overlay::PLACE_BOTTOM as i64
            - font::text_height(overlay::PLACE_SCALE) as i64;
        surface.fill_text(place, x, y, overlay::PLACE_SCALE);
    }

    surface.restore();
}

fn right_aligned_x(surface: &Surface, text: &str, scale: u32) -> i64 {
    surface.width() as i64 - overlay::TEXT_MARGIN as i64 - font::text_width(text, scale) as i64
}

fn draw_compass(surface: &mut Surface, heading: f32) {
    let cx = surface.width() as f32 / 2.0;
    let cy = overlay::COMPASS_TOP;

    surface.set_stroke(WHITE);
    surface.set_line_width(RING_WIDTH);
    surface.stroke_circle(cx, cy, overlay::COMPASS_RADIUS);

    // Needle points up at heading 0 and turns clockwise
    let north = [
        (cx, cy - overlay::NEEDLE_LENGTH),
        (cx + NEEDLE_HALF_WIDTH, cy),
        (cx - NEEDLE_HALF_WIDTH, cy),
    ];
    let south = [
        (cx, cy + overlay::NEEDLE_LENGTH),
        (cx - NEEDLE_HALF_WIDTH, cy),
        (cx + NEEDLE_HALF_WIDTH, cy),
    ];
    surface.set_fill(NEEDLE_NORTH);
    surface.fill_polygon(&north, heading, (cx, cy));
    surface.set_fill(WHITE);
    surface.fill_polygon(&south, heading, (cx, cy));
}
