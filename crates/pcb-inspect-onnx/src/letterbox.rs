//! Letterbox preprocessing and its inverse.
//!
//! The source is resized to fit a square `size x size` canvas without
//! distortion, centered, and the margins are filled with grey. The
//! resulting tensor is `[1, 3, size, size]` in CHW order with values in
//! `[0, 1]`.

use image::imageops::{self, FilterType};
use image::Rgb;
use pcb_inspect_core::{BoundingBox, Dimensions, RgbImage};

use crate::error::OnnxError;

/// Padding value for the letterbox margins.
pub const PAD_VALUE: u8 = 114;

/// The geometry of one letterbox transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Model-space pixels per source pixel.
    pub scale: f32,
    /// Left margin in model pixels.
    pub pad_x: f32,
    /// Top margin in model pixels.
    pub pad_y: f32,
    pub size: u32,
    pub source: Dimensions,
}

impl Letterbox {
    /// Compute the transform that fits `source` into a `size` square.
    ///
    /// # Errors
    ///
    /// Returns [`OnnxError::InputSize`] if `size` is zero.
    pub fn fit(source: Dimensions, size: u32) -> Result<Self, OnnxError> {
        if size == 0 {
            return Err(OnnxError::InputSize(size));
        }
        let (w, h) = (source.width.max(1), source.height.max(1));

        #[expect(clippy::cast_precision_loss)]
        let scale = (size as f32 / w as f32).min(size as f32 / h as f32);
        let (new_w, new_h) = Self::scaled(w, h, scale, size);

        #[expect(clippy::cast_precision_loss)]
        let (pad_x, pad_y) = (
            ((size - new_w) / 2) as f32,
            ((size - new_h) / 2) as f32,
        );

        Ok(Self {
            scale,
            pad_x,
            pad_y,
            size,
            source,
        })
    }

    fn scaled(w: u32, h: u32, scale: f32, size: u32) -> (u32, u32) {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let f = |v: u32| ((v as f32 * scale).round() as u32).clamp(1, size);
        (f(w), f(h))
    }

    /// Size of the resized image inside the canvas.
    #[must_use]
    pub fn inner(&self) -> (u32, u32) {
        Self::scaled(
            self.source.width.max(1),
            self.source.height.max(1),
            self.scale,
            self.size,
        )
    }

    /// Map a box from model-input pixels back to source pixels, clamped
    /// to the source image.
    #[must_use]
    pub fn unmap(&self, bbox: BoundingBox) -> BoundingBox {
        BoundingBox::new(
            (bbox.x1 - self.pad_x) / self.scale,
            (bbox.y1 - self.pad_y) / self.scale,
            (bbox.x2 - self.pad_x) / self.scale,
            (bbox.y2 - self.pad_y) / self.scale,
        )
        .clamp_to(self.source)
    }
}

/// Letterbox `image` into a normalized CHW tensor.
///
/// # Errors
///
/// Returns [`OnnxError::InputSize`] if `size` is zero.
pub fn letterbox(image: &RgbImage, size: u32) -> Result<(Vec<f32>, Letterbox), OnnxError> {
    let geometry = Letterbox::fit(Dimensions::of(image), size)?;
    let (new_w, new_h) = geometry.inner();

    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (left, top) = (geometry.pad_x as i64, geometry.pad_y as i64);
    imageops::replace(&mut canvas, &resized, left, top);

    Ok((to_chw(&canvas), geometry))
}

/// Convert an RGB image to a planar `[3, h, w]` buffer scaled to `[0, 1]`.
#[must_use]
pub fn to_chw(image: &RgbImage) -> Vec<f32> {
    let plane = image.width() as usize * image.height() as usize;
    let mut out = vec![0.0_f32; plane * 3];
    for (i, pixel) in image.pixels().enumerate() {
        for (c, &value) in pixel.0.iter().enumerate() {
            out[c * plane + i] = f32::from(value) / 255.0;
        }
    }
    out
}
