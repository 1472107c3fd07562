use std::sync::Arc;
use std::time::Instant;

use ort::session::Session;
use ort::value::Value;
use parking_lot::Mutex;
use pcb_inspect_core::{DefectDetector, DetectionError, PredictedBox, Prediction, RgbImage};
use tracing::{debug, info, warn};

use crate::config::ModelConfig;
use crate::decode::decode;
use crate::error::OnnxError;
use crate::labels::load_labels;
use crate::letterbox::letterbox;

/// A YOLO-family detector running on ONNX Runtime.
///
/// The runtime session needs exclusive access per run, so concurrent
/// `predict` calls are serialized.
pub struct OnnxDetector {
    session: Mutex<Session>,
    input_name: String,
    input_size: u32,
    iou_threshold: f32,
    names: Arc<[String]>,
}

impl std::fmt::Debug for OnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetector")
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("iou_threshold", &self.iou_threshold)
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl OnnxDetector {
    /// Load the model and its class names.
    ///
    /// # Errors
    ///
    /// Returns [`OnnxError::ModelNotFound`] if the model file is missing,
    /// [`OnnxError::Runtime`] if ONNX Runtime cannot load it, a labels
    /// error if the labels file is unusable, and
    /// [`OnnxError::InputSize`] / [`OnnxError::NoOutput`] for a model or
    /// configuration that cannot work.
    pub fn load(config: &ModelConfig) -> Result<Self, OnnxError> {
        if config.input_size == 0 {
            return Err(OnnxError::InputSize(config.input_size));
        }
        if !config.model_path.is_file() {
            return Err(OnnxError::ModelNotFound(config.model_path.clone()));
        }
        let names = load_labels(config.labels_path.as_deref())?;

        let started = Instant::now();
        let session = Session::builder()?.commit_from_file(&config.model_path)?;
        if session.outputs.is_empty() {
            return Err(OnnxError::NoOutput);
        }

        let input_name = resolve_input_name(&session, &config.input_name);
        info!(
            model = %config.model_path.display(),
            input = %input_name,
            classes = names.len(),
            elapsed = ?started.elapsed(),
            "model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            input_size: config.input_size,
            iou_threshold: config.iou_threshold,
            names,
        })
    }

    /// Class names, indexed by class index.
    #[must_use]
    pub const fn names(&self) -> &Arc<[String]> {
        &self.names
    }

    fn infer(&self, image: &RgbImage, confidence_threshold: f32) -> Result<Vec<PredictedBox>, OnnxError> {
        let size = usize::try_from(self.input_size)
            .map_err(|_| OnnxError::InputSize(self.input_size))?;
        let (data, geometry) = letterbox(image, self.input_size)?;
        let shape = [1_usize, 3, size, size];
        let input = Value::from_array((shape.as_slice(), data.into_boxed_slice()))?;

        let started = Instant::now();
        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input])?;
        let (shape, raw) = outputs[0].try_extract_tensor::<f32>()?;
        debug!(shape = ?shape, elapsed = ?started.elapsed(), "inference done");

        decode(
            shape,
            raw,
            self.names.len(),
            confidence_threshold,
            self.iou_threshold,
            &geometry,
        )
    }
}

/// Use the configured input name if the model has it; otherwise fall
/// back to the model's first input.
fn resolve_input_name(session: &Session, configured: &str) -> String {
    if session.inputs.iter().any(|input| input.name == configured) {
        return configured.to_owned();
    }
    match session.inputs.first() {
        Some(input) => {
            warn!(
                configured,
                using = %input.name,
                "model has no input with the configured name"
            );
            input.name.clone()
        }
        None => configured.to_owned(),
    }
}

impl DefectDetector for OnnxDetector {
    fn predict(&self, image: &RgbImage, confidence_threshold: f32) -> Result<Prediction, DetectionError> {
        let boxes = self.infer(image, confidence_threshold)?;
        Ok(Prediction {
            boxes,
            names: Arc::clone(&self.names),
        })
    }
}
