//! Display surfaces for the input and output images.
//!
//! An [`ImageSurface`] always holds a bitmap already scaled to the
//! display budget: the longest edge equals `max_edge` and the aspect
//! ratio is preserved. Scaling uses Lanczos3, the sharpest filter the
//! `image` crate offers, since the output is looked at, not processed.

use std::sync::Arc;

use image::Rgb;
use image::imageops::FilterType;

use crate::types::{Dimensions, RgbImage};

/// Size of the blank placeholder before scaling.
pub const PLACEHOLDER_DIMENSIONS: Dimensions = Dimensions {
    width: 640,
    height: 480,
};

/// Fill color of the blank placeholder.
pub const PLACEHOLDER_COLOR: [u8; 3] = [0x11, 0x12, 0x17];

/// Compute the display size of a `width` x `height` image whose longest
/// edge must become `max_edge`.
///
/// With `r = min(max_edge / width, max_edge / height)` the result is
/// `(round(width * r), round(height * r))`, each at least 1. Degenerate
/// inputs (zero width or height) yield a 1x1 result.
#[must_use]
pub fn fit_dimensions(width: u32, height: u32, max_edge: u32) -> Dimensions {
    if width == 0 || height == 0 || max_edge == 0 {
        return Dimensions {
            width: 1,
            height: 1,
        };
    }
    let m = f64::from(max_edge);
    let ratio = (m / f64::from(width)).min(m / f64::from(height));

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scale = |v: u32| ((f64::from(v) * ratio).round() as u32).max(1);

    Dimensions {
        width: scale(width),
        height: scale(height),
    }
}

/// Resize `image` so its longest edge is `max_edge`, preserving aspect
/// ratio. Small images are scaled up, large ones down.
#[must_use]
pub fn scale_to_fit(image: &RgbImage, max_edge: u32) -> RgbImage {
    let target = fit_dimensions(image.width(), image.height(), max_edge);
    if target == Dimensions::of(image) {
        return image.clone();
    }
    image::imageops::resize(image, target.width, target.height, FilterType::Lanczos3)
}

/// The blank placeholder bitmap at its unscaled size.
#[must_use]
pub fn placeholder_bitmap() -> RgbImage {
    RgbImage::from_pixel(
        PLACEHOLDER_DIMENSIONS.width,
        PLACEHOLDER_DIMENSIONS.height,
        Rgb(PLACEHOLDER_COLOR),
    )
}

/// A single displayed image.
///
/// The surface keeps the scaled bitmap alive behind an `Arc` for as
/// long as it is on screen; the UI layer only borrows it.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: Arc<RgbImage>,
    max_edge: u32,
    placeholder: bool,
}

impl ImageSurface {
    /// A surface showing the blank placeholder.
    #[must_use]
    pub fn blank(max_edge: u32) -> Self {
        Self {
            image: Arc::new(scale_to_fit(&placeholder_bitmap(), max_edge)),
            max_edge,
            placeholder: true,
        }
    }

    /// Replace the displayed bitmap with a scaled copy of `bitmap`.
    pub fn update(&mut self, bitmap: &RgbImage) {
        self.image = Arc::new(scale_to_fit(bitmap, self.max_edge));
        self.placeholder = false;
    }

    /// Go back to the blank placeholder.
    pub fn reset(&mut self) {
        *self = Self::blank(self.max_edge);
    }

    /// The currently displayed (already scaled) bitmap.
    #[must_use]
    pub const fn image(&self) -> &Arc<RgbImage> {
        &self.image
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.image)
    }

    #[must_use]
    pub const fn max_edge(&self) -> u32 {
        self.max_edge
    }

    /// Returns `true` while the blank placeholder is shown.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// Surfaces compare by identity of the displayed bitmap, so an
/// unchanged surface never triggers a re-encode in the UI.
impl PartialEq for ImageSurface {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
            && self.max_edge == other.max_edge
            && self.placeholder == other.placeholder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([200, 40, 40]))
    }

    #[test]
    fn landscape_fits_width() {
        let d = fit_dimensions(1000, 500, 560);
        assert_eq!(
            d,
            Dimensions {
                width: 560,
                height: 280
            }
        );
    }

    #[test]
    fn portrait_fits_height() {
        let d = fit_dimensions(300, 900, 560);
        assert_eq!(
            d,
            Dimensions {
                width: 187,
                height: 560
            }
        );
    }

    #[test]
    fn small_image_is_scaled_up() {
        let d = fit_dimensions(100, 50, 560);
        assert_eq!(
            d,
            Dimensions {
                width: 560,
                height: 280
            }
        );
    }

    #[test]
    fn aspect_ratio_preserved_within_rounding() {
        for &(w, h) in &[(640, 480), (1920, 1080), (37, 1001), (4000, 3), (559, 561)] {
            let d = fit_dimensions(w, h, 560);
            let ratio = (560.0 / f64::from(w)).min(560.0 / f64::from(h));
            let expected_w = (f64::from(w) * ratio).round().max(1.0);
            let expected_h = (f64::from(h) * ratio).round().max(1.0);
            assert!((f64::from(d.width) - expected_w).abs() <= 1.0, "{w}x{h} -> {d:?}");
            assert!((f64::from(d.height) - expected_h).abs() <= 1.0, "{w}x{h} -> {d:?}");
            assert_eq!(d.width.max(d.height), 560, "{w}x{h} -> {d:?}");
        }
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        let d = fit_dimensions(10_000, 1, 560);
        assert_eq!(
            d,
            Dimensions {
                width: 560,
                height: 1
            }
        );
    }

    #[test]
    fn degenerate_input_is_one_pixel() {
        assert_eq!(
            fit_dimensions(0, 10, 560),
            Dimensions {
                width: 1,
                height: 1
            }
        );
    }

    #[test]
    fn scale_to_fit_resizes() {
        let out = scale_to_fit(&solid(200, 100), 50);
        assert_eq!(out.dimensions(), (50, 25));
    }

    #[test]
    fn scale_to_fit_same_size_is_copy() {
        let img = solid(56, 28);
        let out = scale_to_fit(&img, 56);
        assert_eq!(out, img);
    }

    #[test]
    fn blank_surface_is_scaled_placeholder() {
        let surface = ImageSurface::blank(560);
        assert!(surface.is_placeholder());
        assert_eq!(
            surface.dimensions(),
            Dimensions {
                width: 560,
                height: 420
            }
        );
        assert_eq!(surface.image().get_pixel(0, 0), &Rgb(PLACEHOLDER_COLOR));
    }

    #[test]
    fn update_then_reset() {
        let mut surface = ImageSurface::blank(100);
        surface.update(&solid(400, 200));
        assert!(!surface.is_placeholder());
        assert_eq!(
            surface.dimensions(),
            Dimensions {
                width: 100,
                height: 50
            }
        );

        surface.reset();
        assert!(surface.is_placeholder());
        assert_eq!(surface, surface.clone());
    }

    #[test]
    fn update_changes_identity() {
        let mut surface = ImageSurface::blank(64);
        let before = surface.clone();
        surface.update(&solid(64, 64));
        assert_ne!(surface, before);
    }
}
