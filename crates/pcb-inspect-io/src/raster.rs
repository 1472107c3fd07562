//! Raster image encoding for `<img src>` attributes.
//!
//! The desktop webview displays bitmaps as inline `data:` URLs: the RGB
//! buffer is encoded to PNG and base64'd. Nothing is written to disk.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageEncoder;
use pcb_inspect_core::RgbImage;

/// Errors that can occur during raster encoding.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(String),
}

impl From<image::ImageError> for RasterError {
    fn from(err: image::ImageError) -> Self {
        Self::PngEncode(err.to_string())
    }
}

/// Encode an `RgbImage` as PNG bytes.
///
/// # Errors
///
/// Returns [`RasterError::PngEncode`] if PNG encoding fails.
pub fn rgb_image_to_png(image: &RgbImage) -> Result<Vec<u8>, RasterError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(png_bytes)
}

/// Encode an `RgbImage` as a `data:image/png;base64,...` URL.
///
/// # Errors
///
/// Returns [`RasterError::PngEncode`] if PNG encoding fails.
pub fn rgb_image_to_data_url(image: &RgbImage) -> Result<String, RasterError> {
    let png = rgb_image_to_png(image)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
