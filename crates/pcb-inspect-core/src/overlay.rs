//! Default overlay renderer: class-colored boxes on a copy of the source,
//! each with a `"{name} {confidence:.2}"` label strip.

use ab_glyph::{FontRef, PxScale};
use image::Rgb;
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::detector::{PredictedBox, Prediction};
use crate::types::{Dimensions, RenderError, RgbImage};

/// Stroke width of each box in pixels.
pub const BOX_THICKNESS: u32 = 3;

/// Label glyph height in pixels.
pub const LABEL_HEIGHT: f32 = 14.0;

/// Padding between the label text and its strip edge.
const LABEL_PAD: u32 = 2;

const LABEL_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Box colors, indexed by class index modulo the palette length.
const PALETTE: [[u8; 3]; 6] = [
    [0x00, 0xcc, 0xff],
    [0xff, 0x38, 0x38],
    [0xff, 0xb2, 0x1d],
    [0x48, 0xf9, 0x0a],
    [0xcf, 0x32, 0xff],
    [0xff, 0x70, 0x1f],
];

/// Color used for a class index.
#[must_use]
pub const fn class_color(class_index: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_index % PALETTE.len()])
}

/// Black or white, whichever reads better on `background`.
#[must_use]
pub fn label_text_color(background: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = background.0;
    let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    if luma > 153.0 {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    }
}

/// Label text for one box.
#[must_use]
pub fn box_label(prediction: &Prediction, b: &PredictedBox) -> String {
    let name = prediction
        .names
        .get(b.class_index)
        .map_or_else(|| b.class_index.to_string(), Clone::clone);
    format!("{name} {:.2}", b.confidence)
}

/// Draw every box of `prediction` onto a copy of `image`.
///
/// Boxes are clamped to the image. A box that collapses to nothing after
/// clamping is skipped. Each label sits on a strip just above its box,
/// or just inside the top edge when there is no room above.
///
/// # Errors
///
/// Returns [`RenderError::EmptyImage`] for a zero-area image,
/// [`RenderError::InvalidGeometry`] for a box with non-finite
/// coordinates and [`RenderError::Font`] if the label font fails to load.
pub fn draw_prediction(image: &RgbImage, prediction: &Prediction) -> Result<RgbImage, RenderError> {
    let dimensions = Dimensions::of(image);
    if dimensions.width == 0 || dimensions.height == 0 {
        return Err(RenderError::EmptyImage);
    }
    let font = FontRef::try_from_slice(LABEL_FONT).map_err(|_| RenderError::Font)?;
    let scale = PxScale::from(LABEL_HEIGHT);

    let mut canvas = image.clone();
    for b in &prediction.boxes {
        if !b.bbox.is_finite() {
            return Err(RenderError::InvalidGeometry(b.bbox));
        }
        let clamped = b.bbox.clamp_to(dimensions);

        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y, w, h) = (
            clamped.x1.floor() as u32,
            clamped.y1.floor() as u32,
            clamped.width().round() as u32,
            clamped.height().round() as u32,
        );
        if w == 0 || h == 0 {
            continue;
        }
        let color = class_color(b.class_index);

        // Inset successive outlines so the stroke grows inward.
        for inset in 0..BOX_THICKNESS {
            let (iw, ih) = (w.saturating_sub(2 * inset), h.saturating_sub(2 * inset));
            if iw == 0 || ih == 0 {
                break;
            }
            #[expect(clippy::cast_possible_wrap)]
            let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(iw, ih);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }

        let label = box_label(prediction, b);
        let (text_w, text_h) = text_size(scale, &font, &label);
        let (strip_w, strip_h) = (text_w + 2 * LABEL_PAD, text_h + 2 * LABEL_PAD);
        let strip_y = if y >= strip_h { y - strip_h } else { y };

        #[expect(clippy::cast_possible_wrap)]
        let (sx, sy) = (x as i32, strip_y as i32);
        draw_filled_rect_mut(&mut canvas, Rect::at(sx, sy).of_size(strip_w, strip_h), color);
        #[expect(clippy::cast_possible_wrap)]
        let pad = LABEL_PAD as i32;
        draw_text_mut(
            &mut canvas,
            label_text_color(color),
            sx + pad,
            sy + pad,
            scale,
            &font,
            &label,
        );
    }
    Ok(canvas)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::detector::PredictedBox;
    use crate::types::BoundingBox;

    const BG: Rgb<u8> = Rgb([10, 10, 10]);

    fn prediction(boxes: Vec<PredictedBox>) -> Prediction {
        Prediction {
            boxes,
            names: Arc::from(vec!["spur".to_owned(), "short".to_owned()]),
        }
    }

    fn pbox(class_index: usize, bbox: BoundingBox) -> PredictedBox {
        PredictedBox {
            class_index,
            confidence: 0.9,
            bbox,
        }
    }

    #[test]
    fn draws_outline_not_interior() {
        let image = RgbImage::from_pixel(40, 40, BG);
        let out = draw_prediction(
            &image,
            &prediction(vec![pbox(1, BoundingBox::new(5.0, 5.0, 35.0, 35.0))]),
        )
        .unwrap();
        assert_eq!(out.get_pixel(5, 30), &class_color(1));
        assert_eq!(out.get_pixel(7, 30), &class_color(1));
        assert_eq!(out.get_pixel(20, 30), &BG);
        // The source is untouched.
        assert_eq!(image.get_pixel(5, 5), &BG);
    }

    #[test]
    fn label_strip_sits_above_box() {
        let image = RgbImage::from_pixel(100, 100, BG);
        let out = draw_prediction(
            &image,
            &prediction(vec![pbox(1, BoundingBox::new(20.0, 50.0, 80.0, 90.0))]),
        )
        .unwrap();
        let color = class_color(1);

        // Strip fill just above the box's top-left corner.
        assert_eq!(out.get_pixel(20, 49), &color);
        assert_eq!(out.get_pixel(21, 49), &color);
        // Well above the strip nothing is drawn.
        assert_eq!(out.get_pixel(20, 10), &BG);

        // Glyphs are drawn inside the strip.
        let glyph_pixels = (20..80)
            .flat_map(|x| (30..50).map(move |y| (x, y)))
            .filter(|&(x, y)| {
                let p = out.get_pixel(x, y);
                p != &color && p != &BG
            })
            .count();
        assert!(glyph_pixels > 0);
    }

    #[test]
    fn label_text() {
        let p = prediction(vec![pbox(1, BoundingBox::new(0.0, 0.0, 1.0, 1.0))]);
        assert_eq!(box_label(&p, &p.boxes[0]), "short 0.90");
        let unknown = pbox(9, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(box_label(&p, &unknown), "9 0.90");
    }

    #[test]
    fn label_text_contrasts_with_strip() {
        assert_eq!(label_text_color(class_color(1)), Rgb([255, 255, 255]));
        assert_eq!(label_text_color(class_color(3)), Rgb([0, 0, 0]));
    }

    #[test]
    fn no_boxes_returns_copy() {
        let image = RgbImage::from_pixel(8, 8, BG);
        let out = draw_prediction(&image, &prediction(Vec::new())).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn out_of_bounds_box_is_clamped() {
        let image = RgbImage::from_pixel(40, 40, BG);
        let out = draw_prediction(
            &image,
            &prediction(vec![pbox(0, BoundingBox::new(-10.0, -10.0, 50.0, 50.0))]),
        )
        .unwrap();
        assert_eq!(out.get_pixel(0, 39), &class_color(0));
        assert_eq!(out.get_pixel(39, 39), &class_color(0));
        assert_eq!(out.get_pixel(20, 30), &BG);
    }

    #[test]
    fn non_finite_box_fails() {
        let image = RgbImage::from_pixel(8, 8, BG);
        let result = draw_prediction(
            &image,
            &prediction(vec![pbox(0, BoundingBox::new(f32::NAN, 0.0, 4.0, 4.0))]),
        );
        assert!(matches!(result, Err(RenderError::InvalidGeometry(_))));
    }

    #[test]
    fn empty_image_fails() {
        let image = RgbImage::new(0, 0);
        let result = draw_prediction(&image, &prediction(Vec::new()));
        assert!(matches!(result, Err(RenderError::EmptyImage)));
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(class_color(0), class_color(PALETTE.len()));
    }
}
