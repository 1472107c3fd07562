//! Shared types for the pcb-inspect detection pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can reference decoded
/// bitmaps without depending on `image` directly.
pub use image::RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an RGB bitmap.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Axis-aligned bounding box in source-image pixel coordinates.
///
/// `(x1, y1)` is the top-left corner and `(x2, y2)` the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Create a box from its two corners.
    #[must_use]
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from its center and size.
    #[must_use]
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self::new(cx - hw, cy - hh, cx + hw, cy + hh)
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Returns `true` if every coordinate is a finite number.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Intersection over union with another box. Zero when either box
    /// has no area.
    #[must_use]
    pub fn iou(&self, other: &Self) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    /// Clamp all coordinates into `[0, width] x [0, height]`.
    #[must_use]
    pub fn clamp_to(self, dimensions: Dimensions) -> Self {
        #[expect(clippy::cast_precision_loss)]
        let (w, h) = (dimensions.width as f32, dimensions.height as f32);
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }
}

/// One defect instance reported by the model.
///
/// Produced fresh per inference call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class name as reported by the model's name table.
    pub class_name: String,
    /// Model confidence in `[0, 1]`.
    pub confidence: f32,
    /// Location in source-image pixels.
    pub bounding_box: BoundingBox,
}

/// Lifecycle of one detection run.
///
/// `Idle -> Loading -> Detecting -> {Done | Failed}`. From `Done` or
/// `Failed` the controls are enabled again; the next upload moves to
/// `Loading` and a clear moves back to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// No run is active.
    #[default]
    Idle,
    /// Upload accepted; the image is being read and decoded.
    Loading,
    /// Source image is on screen; inference is running.
    Detecting,
    /// Inference finished and its results are rendered.
    Done,
    /// Decoding or inference failed with a human-readable reason.
    Failed(String),
}

impl RunStatus {
    /// Returns `true` while a worker owns the run.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Loading | Self::Detecting)
    }
}

/// The current detection run, owned exclusively by the
/// [`Session`](crate::session::Session).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRun {
    /// Generation number issued when the upload was accepted.
    pub generation: u64,
    /// Decoded source image; absent until the worker reports it.
    pub source: Option<Arc<RgbImage>>,
    /// Source image with boxes drawn on it; absent until done, or when
    /// overlay rendering failed.
    pub annotated: Option<Arc<RgbImage>>,
    /// Detections in model order.
    pub detections: Vec<Detection>,
    pub status: RunStatus,
}

impl DetectionRun {
    /// A freshly accepted run that has not decoded anything yet.
    #[must_use]
    pub const fn loading(generation: u64) -> Self {
        Self {
            generation,
            source: None,
            annotated: None,
            detections: Vec::new(),
            status: RunStatus::Loading,
        }
    }
}

/// Configuration for the detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum detection score accepted from the model.
    pub confidence_threshold: f32,

    /// Longest edge, in pixels, of images shown on an
    /// [`ImageSurface`](crate::surface::ImageSurface).
    pub display_max_edge: u32,
}

impl PipelineConfig {
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
    pub const DEFAULT_DISPLAY_MAX_EDGE: u32 = 560;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: Self::DEFAULT_CONFIDENCE_THRESHOLD,
            display_max_edge: Self::DEFAULT_DISPLAY_MAX_EDGE,
        }
    }
}

/// Broad category of a [`DetectionError`], matching what the user is
/// told went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file could not be read or decoded as an image.
    FileDecode,
    /// The model failed to produce a usable prediction.
    Inference,
}

/// Errors that end a detection run in [`RunStatus::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// The selected file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input image data was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The file was read but is not a decodable image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The model raised an error; the message is shown verbatim.
    #[error("{0}")]
    Inference(String),

    /// The model reported a class index missing from its name table.
    #[error("model returned unknown class index {0}")]
    UnknownClass(usize),

    /// The worker thread could not be started.
    #[error("failed to start detection worker: {0}")]
    Worker(#[source] std::io::Error),

    /// The worker panicked before it produced a result.
    #[error("detection worker panicked: {0}")]
    WorkerPanicked(String),

    /// The worker went away without posting a result.
    #[error("detection worker exited without a result")]
    WorkerExited,
}

impl DetectionError {
    /// Wrap any displayable model error as an inference failure.
    pub fn inference(err: impl std::fmt::Display) -> Self {
        Self::Inference(err.to_string())
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::FileRead { .. } | Self::EmptyInput | Self::ImageDecode(_) => ErrorKind::FileDecode,
            Self::Inference(_)
            | Self::UnknownClass(_)
            | Self::Worker(_)
            | Self::WorkerPanicked(_)
            | Self::WorkerExited => ErrorKind::Inference,
        }
    }
}

/// Errors from drawing the detection overlay.
///
/// Never surfaced to the user: the pipeline falls back to the plain
/// source image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The source image has zero width or height.
    #[error("source image has zero area")]
    EmptyImage,

    /// A box had NaN or infinite coordinates.
    #[error("bounding box has non-finite coordinates: {0:?}")]
    InvalidGeometry(BoundingBox),

    /// The bundled label font could not be parsed.
    #[error("label font is invalid")]
    Font,

    /// A detector-specific renderer failed.
    #[error("overlay rendering failed: {0}")]
    Backend(String),
}
