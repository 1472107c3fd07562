//! pcb-inspect-core: the upload -> background inference -> UI refresh
//! pipeline for PCB defect inspection, free of any UI toolkit.
//!
//! A [`Session`] owns everything the window shows. An upload is accepted
//! by [`Session::begin_upload`], which hands out a [`RunTicket`]; the
//! [`DetectionPipeline`] then decodes the image and runs the injected
//! [`DefectDetector`] on a worker thread, posting [`PipelineEvent`]s back
//! through an [`EventSink`]. The presentation loop feeds each event to
//! [`Session::apply`], which discards anything from an older generation.
//!
//! The model itself lives elsewhere (`pcb-inspect-onnx`); this crate
//! only defines the contract and a default overlay renderer.

pub mod catalog;
pub mod detector;
pub mod overlay;
pub mod pipeline;
pub mod results;
pub mod session;
pub mod surface;
pub mod types;

pub use catalog::{DefectCatalog, DefectEntry};
pub use detector::{DefectDetector, PredictedBox, Prediction};
pub use pipeline::{
    DetectionPipeline, EventSink, ImageSource, PipelineEvent, RunOutput, RunTicket, decode_rgb,
    detect,
};
pub use results::{ResultCard, ResultsPanel};
pub use session::{Applied, Session, StatusLine, StatusTone};
pub use surface::ImageSurface;
pub use types::{
    BoundingBox, Detection, DetectionError, DetectionRun, Dimensions, ErrorKind, PipelineConfig,
    RenderError, RgbImage, RunStatus,
};
