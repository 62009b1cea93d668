// SPDX-License-Identifier: GPL-3.0-only

//! Addressable RGBA drawing surface
//!
//! The surface behaves like a 2D canvas context: it carries a current
//! [`DrawState`] (filter, fill and stroke colours, line width, shadow) that
//! can be pushed with [`Surface::save`] and popped with [`Surface::restore`].
//! Resizing reallocates the pixels and resets the draw state, as a canvas
//! does when its dimensions are assigned.
//!
//! Vector primitives are rasterized with tiny-skia directly into the RGBA
//! buffer. The buffer always holds opaque pixels, so its straight and
//! premultiplied interpretations coincide.

use crate::backends::camera::CameraFrame;
use crate::filters::{FilterExpression, apply_expression};
use crate::render::font;
use image::RgbaImage;
use tiny_skia::{FillRule, Paint, Path, PathBuilder, PixmapMut, Rect, Stroke, Transform};
use tracing::{debug, trace};

/// Straight RGBA colour
pub type Color = [u8; 4];

pub const WHITE: Color = [255, 255, 255, 255];
pub const BLACK: Color = [0, 0, 0, 255];

/// Drop shadow drawn under every overlay primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Mutable drawing parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DrawState {
    /// Filter applied to the frame draw
    pub filter: FilterExpression,
    pub fill: Color,
    pub stroke: Color,
    pub line_width: f32,
    pub shadow: Option<Shadow>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            filter: FilterExpression::identity(),
            fill: BLACK,
            stroke: BLACK,
            line_width: 1.0,
            shadow: None,
        }
    }
}

/// Canvas-like RGBA surface
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
    state: DrawState,
    saved: Vec<DrawState>,
}

impl Surface {
    /// Create an opaque black surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, image::Rgba(BLACK)),
            state: DrawState::default(),
            saved: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Current pixel contents
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    /// Depth of the saved-state stack
    pub fn saved_depth(&self) -> usize {
        self.saved.len()
    }

    /// Assign new dimensions
    ///
    /// Always resets the draw state and the saved stack. Pixels are only
    /// reallocated when the dimensions actually change.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.dimensions() != (width, height) {
            debug!(width, height, "Resizing surface");
            self.pixels = RgbaImage::from_pixel(width, height, image::Rgba(BLACK));
        }
        self.state = DrawState::default();
        self.saved.clear();
    }

    /// Push the current draw state
    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    /// Pop the last saved draw state; unbalanced calls are ignored
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    pub fn set_filter(&mut self, filter: FilterExpression) {
        self.state.filter = filter;
    }

    pub fn set_fill(&mut self, color: Color) {
        self.state.fill = color;
    }

    pub fn set_stroke(&mut self, color: Color) {
        self.state.stroke = color;
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.state.line_width = width;
    }

    pub fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.shadow = shadow;
    }

    /// Copy a frame onto the surface at the origin through the current filter
    ///
    /// Returns `false` without drawing when the frame does not match the
    /// surface dimensions.
    pub fn draw_frame(&mut self, frame: &CameraFrame) -> bool {
        if (frame.width, frame.height) != self.dimensions() || frame.is_empty() {
            trace!(
                frame_width = frame.width,
                frame_height = frame.height,
                "Frame does not match surface"
            );
            return false;
        }

        let Some(mut image) = RgbaImage::from_raw(frame.width, frame.height, frame.data.to_vec())
        else {
            return false;
        };

        // Canvas pixels are opaque; whatever alpha the source carries is dropped
        for pixel in image.pixels_mut() {
            pixel[3] = 255;
        }

        if !self.state.filter.is_identity() {
            apply_expression(&mut image, &self.state.filter);
        }
        self.pixels = image;
        true
    }

    /// Stroke a circle outline with the stroke colour
    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.stroke_path(&path, Transform::identity());
        }
    }

    /// Fill a closed polygon with the fill colour, rotated about a pivot
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], rotate_deg: f32, pivot: (f32, f32)) {
        let Some(path) = polygon_path(points) else {
            return;
        };
        let transform = Transform::from_rotate_at(rotate_deg, pivot.0, pivot.1);
        self.fill_path(&path, transform);
    }

    /// Draw text with its top-left corner at (x, y) using the fill colour
    pub fn fill_text(&mut self, text: &str, x: i64, y: i64, scale: u32) {
        let scale = scale.max(1);
        let mut cells = Vec::new();
        for (i, c) in text.chars().enumerate() {
            let origin_x = x + (i as u32 * font::CELL_WIDTH * scale) as i64;
            for (col, row) in font::lit_pixels(c) {
                cells.push((
                    origin_x + (col * scale) as i64,
                    y + (row * scale) as i64,
                ));
            }
        }

        let fill = self.state.fill;
        let shadow = self.state.shadow;
        let size = scale as f32;
        self.with_pixmap(|pixmap| {
            let passes = shadow
                .map(|s| (s.color, s.offset_x, s.offset_y))
                .into_iter()
                .chain(std::iter::once((fill, 0.0, 0.0)));
            for (color, dx, dy) in passes {
                let paint = paint(color, false);
                for &(px, py) in &cells {
                    if let Some(rect) =
                        Rect::from_xywh(px as f32 + dx, py as f32 + dy, size, size)
                    {
                        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                    }
                }
            }
        });
    }

    fn fill_path(&mut self, path: &Path, transform: Transform) {
        let fill = self.state.fill;
        let shadow = self.state.shadow;
        self.with_pixmap(|pixmap| {
            if let Some(s) = shadow {
                let offset = transform.post_translate(s.offset_x, s.offset_y);
                pixmap.fill_path(path, &paint(s.color, true), FillRule::Winding, offset, None);
            }
            pixmap.fill_path(path, &paint(fill, true), FillRule::Winding, transform, None);
        });
    }

    fn stroke_path(&mut self, path: &Path, transform: Transform) {
        let color = self.state.stroke;
        let shadow = self.state.shadow;
        let stroke = Stroke {
            width: self.state.line_width.max(0.0),
            ..Stroke::default()
        };
        self.with_pixmap(|pixmap| {
            if let Some(s) = shadow {
                let offset = transform.post_translate(s.offset_x, s.offset_y);
                pixmap.stroke_path(path, &paint(s.color, true), &stroke, offset, None);
            }
            pixmap.stroke_path(path, &paint(color, true), &stroke, transform, None);
        });
    }

    fn with_pixmap(&mut self, draw: impl FnOnce(&mut PixmapMut<'_>)) {
        let (width, height) = self.dimensions();
        if let Some(mut pixmap) = PixmapMut::from_bytes(&mut self.pixels, width, height) {
            draw(&mut pixmap);
        }
    }
}

fn paint(color: Color, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = anti_alias;
    paint
}

fn polygon_path(points: &[(f32, f32)]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.0, first.1);
    for &(x, y) in rest {
        builder.line_to(x, y);
    }
    builder.close();
    builder.finish()
}
