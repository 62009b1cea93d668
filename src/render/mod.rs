// SPDX-License-Identifier: GPL-3.0-only

//! Render/composite pipeline
//!
//! Each tick pulls the current camera frame, sizes the surface to it, draws
//! it through the synthesized filter and, when a location fix is available,
//! composites the overlay on top:
//!
//! ```text
//! CameraFrame ──▶ resize ──▶ filtered draw ──▶ overlay ──▶ Surface ──▶ capture
//! ```
//!
//! Captures read the surface after the whole tick has run, so a snapshot
//! always holds exactly what was last displayed.

pub mod font;
pub mod frame_loop;
pub mod overlay;
pub mod surface;

pub use frame_loop::{
    CancelToken, FrameClock, LoopAction, ManualTicks, RenderLoopController, TickSource, run_loop,
};
pub use surface::{DrawState, Surface};

use crate::backends::camera::CameraFrame;
use crate::backends::location::LocationFix;
use crate::filters::FilterExpression;
use tracing::trace;

/// Result of one render tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No usable frame this tick; the surface is untouched
    Skipped,
    /// A frame was drawn at these dimensions
    Drawn { width: u32, height: u32 },
}

/// Owns the output surface and performs render ticks
#[derive(Debug, Clone)]
pub struct Compositor {
    surface: Surface,
    frames_drawn: u64,
    ticks_skipped: u64,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            surface: Surface::new(0, 0),
            frames_drawn: 0,
            ticks_skipped: 0,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Whether the surface holds a composited frame
    pub fn has_frame(&self) -> bool {
        self.frames_drawn > 0
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn ticks_skipped(&self) -> u64 {
        self.ticks_skipped
    }

    /// Run one tick
    ///
    /// Frame dimensions are taken from the frame itself every tick, so a
    /// source that changes resolution (after a facing switch) is followed
    /// immediately. A missing or empty frame skips the tick.
    pub fn render(
        &mut self,
        frame: Option<&CameraFrame>,
        filter: &FilterExpression,
        fix: Option<&LocationFix>,
    ) -> TickOutcome {
        let Some(frame) = frame.filter(|f| !f.is_empty()) else {
            self.ticks_skipped += 1;
            trace!("No frame ready, skipping tick");
            return TickOutcome::Skipped;
        };

        self.surface.resize(frame.width, frame.height);
        self.surface.set_filter(filter.clone());
        if !self.surface.draw_frame(frame) {
            self.ticks_skipped += 1;
            return TickOutcome::Skipped;
        }

        if let Some(fix) = fix {
            overlay::draw_overlay(&mut self.surface, fix);
        }

        self.frames_drawn += 1;
        TickOutcome::Drawn {
            width: frame.width,
            height: frame.height,
        }
    }
}
