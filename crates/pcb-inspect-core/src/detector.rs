//! The contract between the pipeline and the object-detection model.
//!
//! The pipeline never knows how predictions are computed. A detector is
//! constructed once by the application root, shared behind an `Arc`, and
//! handed to [`DetectionPipeline`](crate::pipeline::DetectionPipeline).
//! Tests substitute scripted fakes.

use std::sync::Arc;

use crate::overlay;
use crate::types::{BoundingBox, Detection, DetectionError, RenderError, RgbImage};

/// One raw box as reported by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedBox {
    /// Index into [`Prediction::names`].
    pub class_index: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Output of a single inference call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Boxes in the order the model ranks them.
    pub boxes: Vec<PredictedBox>,
    /// Class-index-to-name table of the model.
    pub names: Arc<[String]>,
}

impl Prediction {
    #[must_use]
    pub fn class_name(&self, class_index: usize) -> Option<&str> {
        self.names.get(class_index).map(String::as_str)
    }

    /// Resolve class indices to names.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::UnknownClass`] if a box refers to an
    /// index outside the name table.
    pub fn detections(&self) -> Result<Vec<Detection>, DetectionError> {
        self.boxes
            .iter()
            .map(|b| {
                let class_name = self
                    .class_name(b.class_index)
                    .ok_or(DetectionError::UnknownClass(b.class_index))?;
                Ok(Detection {
                    class_name: class_name.to_owned(),
                    confidence: b.confidence,
                    bounding_box: b.bbox,
                })
            })
            .collect()
    }
}

/// A pretrained defect detector.
///
/// Implementations are shared between the presentation thread and one
/// worker at a time; they must be `Send + Sync` but need not support
/// truly concurrent `predict` calls efficiently.
pub trait DefectDetector: Send + Sync {
    /// Run the model on `image`, keeping boxes scoring at least
    /// `confidence_threshold`.
    ///
    /// # Errors
    ///
    /// Any model failure, reported as [`DetectionError::Inference`].
    fn predict(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Prediction, DetectionError>;

    /// Draw `prediction` onto a copy of `image`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if the overlay cannot be drawn; the
    /// pipeline then shows the plain image instead.
    fn render(&self, image: &RgbImage, prediction: &Prediction) -> Result<RgbImage, RenderError> {
        overlay::draw_prediction(image, prediction)
    }
}
