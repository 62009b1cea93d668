// SPDX-License-Identifier: GPL-3.0-only

//! Filter synthesis
//!
//! Maps a filter selection and an intensity scalar to a composed
//! [`FilterExpression`]: an ordered chain of parametrized image operations.
//! The expression is what the render loop applies to every frame (see
//! [`apply`]) and it displays in CSS filter syntax for logging and tests.
//!
//! Synthesis is a pure function. The intensity is clamped to
//! [`MIN_INTENSITY`]..=[`MAX_INTENSITY`] before use and the identity filter
//! ignores it entirely.

pub mod apply;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use apply::apply_expression;

/// Lowest accepted intensity
pub const MIN_INTENSITY: f32 = 0.0;

/// Highest accepted intensity
pub const MAX_INTENSITY: f32 = 2.0;

/// 3x3 sharpening kernel (row-major): center 5, orthogonal neighbors -1
pub const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Selectable filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterKind {
    /// No filter applied
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "grayscale")]
    Grayscale,
    #[serde(rename = "invert")]
    Invert,
    #[serde(rename = "blur")]
    Blur,
    #[serde(rename = "sepia")]
    Sepia,
    #[serde(rename = "brightness")]
    Brightness,
    #[serde(rename = "contrast")]
    Contrast,
    #[serde(rename = "saturate")]
    Saturate,
    #[serde(rename = "hue-rotate-90")]
    HueRotate90,
    #[serde(rename = "hue-rotate-180")]
    HueRotate180,
    #[serde(rename = "hue-rotate-270")]
    HueRotate270,
    /// Dimmed, high-contrast look
    #[serde(rename = "darkness")]
    Darkness,
    /// Fixed 3x3 sharpening convolution
    #[serde(rename = "sharpen")]
    Sharpen,
    /// Light sepia with boosted contrast and saturation
    #[serde(rename = "vintage")]
    Vintage,
}

impl FilterKind {
    /// All filters in control-surface order
    pub const ALL: [FilterKind; 14] = [
        FilterKind::None,
        FilterKind::Grayscale,
        FilterKind::Invert,
        FilterKind::Blur,
        FilterKind::Sepia,
        FilterKind::Brightness,
        FilterKind::Contrast,
        FilterKind::Saturate,
        FilterKind::HueRotate90,
        FilterKind::HueRotate180,
        FilterKind::HueRotate270,
        FilterKind::Darkness,
        FilterKind::Sharpen,
        FilterKind::Vintage,
    ];

    /// Stable identifier used by the control surface and config files
    pub fn id(&self) -> &'static str {
        match self {
            FilterKind::None => "none",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Invert => "invert",
            FilterKind::Blur => "blur",
            FilterKind::Sepia => "sepia",
            FilterKind::Brightness => "brightness",
            FilterKind::Contrast => "contrast",
            FilterKind::Saturate => "saturate",
            FilterKind::HueRotate90 => "hue-rotate-90",
            FilterKind::HueRotate180 => "hue-rotate-180",
            FilterKind::HueRotate270 => "hue-rotate-270",
            FilterKind::Darkness => "darkness",
            FilterKind::Sharpen => "sharpen",
            FilterKind::Vintage => "vintage",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::None => "Normal",
            FilterKind::Grayscale => "Black & White",
            FilterKind::Invert => "Negativ",
            FilterKind::Blur => "Soft Focus",
            FilterKind::Sepia => "Sepia",
            FilterKind::Brightness => "Super Bright",
            FilterKind::Contrast => "Rich in Contrast",
            FilterKind::Saturate => "Vivid Colors",
            FilterKind::HueRotate90 => "Green Tint",
            FilterKind::HueRotate180 => "Blue Tint",
            FilterKind::HueRotate270 => "Pink Tint",
            FilterKind::Darkness => "Dark Mode",
            FilterKind::Sharpen => "Sharpened",
            FilterKind::Vintage => "Vintage",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing an unknown filter identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilter(pub String);

impl fmt::Display for UnknownFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown filter: {}", self.0)
    }
}

impl std::error::Error for UnknownFilter {}

impl FromStr for FilterKind {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

/// One parametrized image operation
///
/// Percent values follow CSS semantics: 100% is the unmodified image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Grayscale { percent: f32 },
    Invert { amount: f32 },
    Blur { radius_px: f32 },
    Sepia { amount: f32 },
    HueRotate { degrees: f32 },
    Brightness { percent: f32 },
    Contrast { percent: f32 },
    Saturate { percent: f32 },
    /// 3x3 convolution, row-major
    Convolve { kernel: [f32; 9] },
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Grayscale { percent } => write!(f, "grayscale({}%)", percent),
            FilterOp::Invert { amount } => write!(f, "invert({})", amount),
            FilterOp::Blur { radius_px } => write!(f, "blur({}px)", radius_px),
            FilterOp::Sepia { amount } => write!(f, "sepia({})", amount),
            FilterOp::HueRotate { degrees } => write!(f, "hue-rotate({}deg)", degrees),
            FilterOp::Brightness { percent } => write!(f, "brightness({}%)", percent),
            FilterOp::Contrast { percent } => write!(f, "contrast({}%)", percent),
            FilterOp::Saturate { percent } => write!(f, "saturate({}%)", percent),
            FilterOp::Convolve { kernel } => {
                let values: Vec<String> = kernel.iter().map(|v| v.to_string()).collect();
                write!(f, "convolve({})", values.join(" "))
            }
        }
    }
}

/// Composed filter expression
///
/// An empty chain is the explicit no-op expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterExpression {
    ops: Vec<FilterOp>,
}

impl FilterExpression {
    /// The no-op expression
    pub fn identity() -> Self {
        Self { ops: Vec::new() }
    }

    fn chain(ops: Vec<FilterOp>) -> Self {
        Self { ops }
    }

    /// Whether applying this expression leaves pixels unchanged
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operations in application order
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("none");
        }
        let parts: Vec<String> = self.ops.iter().map(|op| op.to_string()).collect();
        f.write_str(&parts.join(" "))
    }
}

/// Clamp an intensity into the accepted range; NaN counts as the minimum
pub fn clamp_intensity(intensity: f32) -> f32 {
    if intensity.is_nan() {
        return MIN_INTENSITY;
    }
    intensity.clamp(MIN_INTENSITY, MAX_INTENSITY)
}

/// Build the filter expression for a filter and intensity
pub fn synthesize(kind: FilterKind, intensity: f32) -> FilterExpression {
    if kind == FilterKind::None {
        return FilterExpression::identity();
    }

    let i = clamp_intensity(intensity);

    let ops = match kind {
        FilterKind::None => Vec::new(),
        FilterKind::Grayscale => vec![FilterOp::Grayscale {
            percent: (i * 100.0).min(100.0),
        }],
        FilterKind::Invert => vec![FilterOp::Invert { amount: i.min(1.0) }],
        FilterKind::Blur => vec![FilterOp::Blur {
            radius_px: (i * 5.0).min(20.0),
        }],
        FilterKind::Sepia => vec![
            FilterOp::Sepia { amount: i.min(1.0) },
            FilterOp::HueRotate { degrees: i * 20.0 },
        ],
        FilterKind::Brightness => vec![FilterOp::Brightness {
            percent: 100.0 + (i - 1.0) * 100.0,
        }],
        FilterKind::Contrast => vec![FilterOp::Contrast {
            percent: 100.0 + (i - 1.0) * 100.0,
        }],
        FilterKind::Saturate => vec![FilterOp::Saturate {
            percent: 100.0 + (i - 1.0) * 100.0,
        }],
        FilterKind::HueRotate90 => vec![FilterOp::HueRotate { degrees: i * 90.0 }],
        FilterKind::HueRotate180 => vec![FilterOp::HueRotate { degrees: i * 180.0 }],
        FilterKind::HueRotate270 => vec![FilterOp::HueRotate { degrees: i * 270.0 }],
        FilterKind::Darkness => vec![
            FilterOp::Brightness {
                percent: 60.0 - i * 20.0,
            },
            FilterOp::Contrast {
                percent: 120.0 + i * 30.0,
            },
        ],
        FilterKind::Sharpen => vec![FilterOp::Convolve {
            kernel: SHARPEN_KERNEL,
        }],
        FilterKind::Vintage => vec![
            FilterOp::Sepia { amount: 0.4 * i },
            FilterOp::Contrast {
                percent: 100.0 + i * 20.0,
            },
            FilterOp::Saturate {
                percent: 100.0 + i * 10.0,
            },
        ],
    };

    FilterExpression::chain(ops)
}

/// Current filter selection from the control surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub intensity: f32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            kind: FilterKind::None,
            intensity: 1.0,
        }
    }
}

impl FilterSpec {
    pub fn new(kind: FilterKind, intensity: f32) -> Self {
        Self { kind, intensity }
    }

    /// Synthesize the expression for this selection
    pub fn expression(&self) -> FilterExpression {
        synthesize(self.kind, self.intensity)
    }
}
