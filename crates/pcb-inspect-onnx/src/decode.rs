//! Decoding raw YOLO output into ranked boxes.
//!
//! YOLOv8-style detectors emit one tensor of shape `[1, 4 + C, N]`: for
//! each of `N` anchors a `(cx, cy, w, h)` box in model-input pixels
//! followed by `C` class scores. Some exports transpose this to
//! `[1, N, 4 + C]`; both layouts are accepted.

use std::cmp::Ordering;

use pcb_inspect_core::{BoundingBox, PredictedBox};

use crate::error::OnnxError;
use crate::letterbox::Letterbox;

/// Memory layout of the output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `[1, 4 + C, N]`: attributes are rows.
    AttributesFirst { anchors: usize },
    /// `[1, N, 4 + C]`: anchors are rows.
    AnchorsFirst { anchors: usize },
}

impl Layout {
    /// Work out the layout from the output shape.
    ///
    /// # Errors
    ///
    /// Returns [`OnnxError::OutputShape`] unless the shape is
    /// `[1, 4 + classes, N]` or `[1, N, 4 + classes]`.
    pub fn detect(shape: &[i64], classes: usize) -> Result<Self, OnnxError> {
        let bad = || OnnxError::OutputShape {
            shape: shape.to_vec(),
            classes,
        };
        let attributes = 4 + classes;
        let [1, a, b] = shape else {
            return Err(bad());
        };
        let (a, b) = (
            usize::try_from(*a).map_err(|_| bad())?,
            usize::try_from(*b).map_err(|_| bad())?,
        );
        if a == attributes {
            Ok(Self::AttributesFirst { anchors: b })
        } else if b == attributes {
            Ok(Self::AnchorsFirst { anchors: a })
        } else {
            Err(bad())
        }
    }

    const fn anchors(self) -> usize {
        match self {
            Self::AttributesFirst { anchors } | Self::AnchorsFirst { anchors } => anchors,
        }
    }

    fn index(self, attributes: usize, anchor: usize, attribute: usize) -> usize {
        match self {
            Self::AttributesFirst { anchors } => attribute * anchors + anchor,
            Self::AnchorsFirst { .. } => anchor * attributes + attribute,
        }
    }
}

/// Turn a raw output tensor into boxes in source-image pixels.
///
/// Each anchor keeps its best class; anchors scoring below
/// `confidence_threshold` are dropped. Survivors go through
/// class-aware non-maximum suppression and come back sorted by
/// descending confidence.
///
/// # Errors
///
/// Returns [`OnnxError::OutputShape`] if the tensor does not match the
/// expected layout for `classes` classes.
pub fn decode(
    shape: &[i64],
    data: &[f32],
    classes: usize,
    confidence_threshold: f32,
    iou_threshold: f32,
    letterbox: &Letterbox,
) -> Result<Vec<PredictedBox>, OnnxError> {
    let layout = Layout::detect(shape, classes)?;
    let attributes = 4 + classes;
    if data.len() != attributes * layout.anchors() {
        return Err(OnnxError::OutputShape {
            shape: shape.to_vec(),
            classes,
        });
    }
    let at = |anchor, attribute| data[layout.index(attributes, anchor, attribute)];

    let candidates = (0..layout.anchors())
        .filter_map(|anchor| {
            let (class_index, confidence) = (0..classes)
                .map(|c| (c, at(anchor, 4 + c)))
                .max_by(|a, b| a.1.total_cmp(&b.1))?;
            if confidence.is_nan() || confidence < confidence_threshold {
                return None;
            }
            let bbox = BoundingBox::from_center(
                at(anchor, 0),
                at(anchor, 1),
                at(anchor, 2),
                at(anchor, 3),
            );
            if !bbox.is_finite() {
                return None;
            }
            Some(PredictedBox {
                class_index,
                confidence,
                bbox: letterbox.unmap(bbox),
            })
        })
        .collect();

    Ok(non_max_suppression(candidates, iou_threshold))
}

/// Class-aware greedy NMS.
///
/// Boxes are visited in descending confidence; a box is dropped if it
/// overlaps an already kept box of the same class by more than
/// `iou_threshold`. The result is sorted by descending confidence.
#[must_use]
pub fn non_max_suppression(mut boxes: Vec<PredictedBox>, iou_threshold: f32) -> Vec<PredictedBox> {
    boxes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<PredictedBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let suppressed = kept.iter().any(|k| {
            k.class_index == candidate.class_index && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
