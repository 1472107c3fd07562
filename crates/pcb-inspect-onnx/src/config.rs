//! Model configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the model lives and how to feed it.
///
/// Every field has a default, so a partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the exported `.onnx` file.
    pub model_path: PathBuf,

    /// Optional class-name file, one name per line. When absent the
    /// built-in PCB defect classes are used.
    pub labels_path: Option<PathBuf>,

    /// Name of the image input tensor.
    pub input_name: String,

    /// Side length of the square model input, in pixels.
    pub input_size: u32,

    /// IoU above which a lower-scoring box of the same class is
    /// suppressed.
    pub iou_threshold: f32,
}

impl ModelConfig {
    pub const DEFAULT_MODEL_PATH: &str = "weights/best.onnx";
    pub const DEFAULT_INPUT_NAME: &str = "images";
    pub const DEFAULT_INPUT_SIZE: u32 = 640;
    pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(Self::DEFAULT_MODEL_PATH),
            labels_path: None,
            input_name: Self::DEFAULT_INPUT_NAME.to_owned(),
            input_size: Self::DEFAULT_INPUT_SIZE,
            iou_threshold: Self::DEFAULT_IOU_THRESHOLD,
        }
    }
}
