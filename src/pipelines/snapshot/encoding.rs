// SPDX-License-Identifier: GPL-3.0-only

//! PNG encoding of composited frames

use crate::errors::SnapshotError;
use image::{ImageFormat, RgbaImage};
use tracing::debug;

/// Encoded image data ready for registering or saving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// File extension of the encoded format
    pub fn extension(&self) -> &'static str {
        "png"
    }
}

/// Encode an RGBA image as PNG
pub fn encode_png(image: &RgbaImage) -> Result<EncodedImage, SnapshotError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(SnapshotError::NoFrameAvailable);
    }

    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| SnapshotError::EncodingFailed(e.to_string()))?;

    debug!(
        width = image.width(),
        height = image.height(),
        size = buffer.len(),
        "PNG encoding complete"
    );

    Ok(EncodedImage {
        data: buffer,
        width: image.width(),
        height: image.height(),
    })
}
