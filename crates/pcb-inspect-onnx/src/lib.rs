//! pcb-inspect-onnx: the defect model behind the core `DefectDetector`
//! contract.
//!
//! Loads a YOLOv8-style detector exported to ONNX and runs it through
//! ONNX Runtime. The runtime library is loaded dynamically; point
//! `ORT_DYLIB_PATH` at `libonnxruntime` before starting.
//!
//! Preprocessing letterboxes the image into the square model input;
//! postprocessing picks the best class per anchor, maps boxes back to
//! source pixels and applies class-aware non-maximum suppression.

pub mod config;
pub mod decode;
pub mod detector;
pub mod error;
pub mod labels;
pub mod letterbox;

pub use config::ModelConfig;
pub use detector::OnnxDetector;
pub use error::OnnxError;
pub use labels::DEFAULT_LABELS;
