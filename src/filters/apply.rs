// SPDX-License-Identifier: GPL-3.0-only

//! CPU-side application of filter expressions to RGBA frames
//!
//! Colour operations use the Filter Effects colour matrices so that the
//! result matches what a browser canvas would draw for the same expression.
//! Alpha is never modified.

use super::{FilterExpression, FilterOp};
use image::RgbaImage;

type ColorMatrix = [[f32; 3]; 3];

/// Apply every operation of the expression to the image in order
pub fn apply_expression(image: &mut RgbaImage, expression: &FilterExpression) {
    for op in expression.ops() {
        apply_op(image, op);
    }
}

fn apply_op(image: &mut RgbaImage, op: &FilterOp) {
    match *op {
        FilterOp::Grayscale { percent } => {
            apply_matrix(image, &grayscale_matrix((percent / 100.0).clamp(0.0, 1.0)))
        }
        FilterOp::Sepia { amount } => apply_matrix(image, &sepia_matrix(amount.clamp(0.0, 1.0))),
        FilterOp::Saturate { percent } => {
            apply_matrix(image, &saturate_matrix((percent / 100.0).max(0.0)))
        }
        FilterOp::HueRotate { degrees } => apply_matrix(image, &hue_rotate_matrix(degrees)),
        FilterOp::Invert { amount } => {
            let a = amount.clamp(0.0, 1.0);
            apply_transfer(image, |c| a + c * (1.0 - 2.0 * a));
        }
        FilterOp::Brightness { percent } => {
            let slope = (percent / 100.0).max(0.0);
            apply_transfer(image, |c| c * slope);
        }
        FilterOp::Contrast { percent } => {
            let slope = (percent / 100.0).max(0.0);
            let intercept = 0.5 - 0.5 * slope;
            apply_transfer(image, |c| c * slope + intercept);
        }
        FilterOp::Blur { radius_px } => {
            if radius_px > 0.0 {
                *image = image::imageops::blur(&*image, radius_px);
            }
        }
        FilterOp::Convolve { kernel } => convolve3x3(image, &kernel),
    }
}

/// Apply a per-channel transfer function to R, G and B
fn apply_transfer(image: &mut RgbaImage, transfer: impl Fn(f32) -> f32) {
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            let value = transfer(*channel as f32 / 255.0);
            *channel = to_u8(value);
        }
    }
}

fn apply_matrix(image: &mut RgbaImage, m: &ColorMatrix) {
    for pixel in image.pixels_mut() {
        let r = pixel[0] as f32 / 255.0;
        let g = pixel[1] as f32 / 255.0;
        let b = pixel[2] as f32 / 255.0;

        pixel[0] = to_u8(m[0][0] * r + m[0][1] * g + m[0][2] * b);
        pixel[1] = to_u8(m[1][0] * r + m[1][1] * g + m[1][2] * b);
        pixel[2] = to_u8(m[2][0] * r + m[2][1] * g + m[2][2] * b);
    }
}

#[inline]
fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn grayscale_matrix(amount: f32) -> ColorMatrix {
    let a = 1.0 - amount;
    [
        [0.2126 + 0.7874 * a, 0.7152 - 0.7152 * a, 0.0722 - 0.0722 * a],
        [0.2126 - 0.2126 * a, 0.7152 + 0.2848 * a, 0.0722 - 0.0722 * a],
        [0.2126 - 0.2126 * a, 0.7152 - 0.7152 * a, 0.0722 + 0.9278 * a],
    ]
}

fn sepia_matrix(amount: f32) -> ColorMatrix {
    let a = 1.0 - amount;
    [
        [0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a],
        [0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a],
        [0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a],
    ]
}

fn saturate_matrix(s: f32) -> ColorMatrix {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> ColorMatrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

/// 3x3 convolution with edge clamping; alpha is copied through
fn convolve3x3(image: &mut RgbaImage, kernel: &[f32; 9]) {
    let width = image.width() as i64;
    let height = image.height() as i64;
    if width == 0 || height == 0 {
        return;
    }

    let source = image.clone();
    let sample = |x: i64, y: i64| {
        let x = x.clamp(0, width - 1) as u32;
        let y = y.clamp(0, height - 1) as u32;
        source.get_pixel(x, y)
    };

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let mut acc = [0.0f32; 3];
        for ky in 0..3i64 {
            for kx in 0..3i64 {
                let weight = kernel[(ky * 3 + kx) as usize];
                if weight == 0.0 {
                    continue;
                }
                let neighbor = sample(x as i64 + kx - 1, y as i64 + ky - 1);
                for (c, value) in acc.iter_mut().enumerate() {
                    *value += weight * neighbor[c] as f32;
                }
            }
        }
        for (c, value) in acc.iter().enumerate() {
            pixel[c] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}
