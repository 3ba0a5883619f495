//! Image dimension decoding.

use serde::{Deserialize, Serialize};

use hubble_core::Error;

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

/// Read the width and height from encoded image bytes.
///
/// Only the header is inspected; the pixel data is never decoded.
pub fn image_size(bytes: &[u8]) -> Result<ImageSize, Error> {
    let size = imagesize::blob_size(bytes).map_err(|e| Error::ImageDecode(e.to_string()))?;
    Ok(ImageSize { width: size.width, height: size.height })
}
