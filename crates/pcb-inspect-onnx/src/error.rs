use std::path::PathBuf;

use pcb_inspect_core::DetectionError;

/// Errors from loading or running the ONNX model.
#[derive(Debug, thiserror::Error)]
pub enum OnnxError {
    /// ONNX Runtime rejected the model or failed during a run.
    #[error(transparent)]
    Runtime(#[from] ort::Error),

    /// The model file does not exist.
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// The labels file could not be read.
    #[error("failed to read labels {}: {source}", .path.display())]
    Labels {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The labels file had no class names in it.
    #[error("labels file {} contains no class names", .0.display())]
    EmptyLabels(PathBuf),

    /// The configured input size cannot be letterboxed into.
    #[error("invalid model input size {0}")]
    InputSize(u32),

    /// The model has no output tensor.
    #[error("model produced no outputs")]
    NoOutput,

    /// The output tensor does not look like `[1, 4 + classes, anchors]`.
    #[error("unexpected output shape {shape:?} for {classes} classes")]
    OutputShape { shape: Vec<i64>, classes: usize },
}

impl From<OnnxError> for DetectionError {
    fn from(err: OnnxError) -> Self {
        Self::inference(err)
    }
}
