//! Off-thread detection runs.
//!
//! [`DetectionPipeline::spawn`] starts one short-lived worker thread per
//! upload. The worker decodes the image, runs the detector once and
//! renders the overlay. It never touches presentation state: everything
//! it produces is posted as a [`PipelineEvent`] to an [`EventSink`] that
//! the presentation loop drains, and every event carries the generation
//! of the run so the consumer can drop stale ones.
//!
//! Within one run the worker posts [`PipelineEvent::SourceDecoded`]
//! strictly before [`PipelineEvent::Finished`], and always posts exactly
//! one [`PipelineEvent::Finished`], even when the detector panics.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::detector::DefectDetector;
use crate::types::{Detection, DetectionError, PipelineConfig, RgbImage};

/// Where the image of one run comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A file on disk, read by the worker.
    Path(PathBuf),
    /// Bytes the file picker already read, with the original file name.
    Bytes { name: String, bytes: Vec<u8> },
}

impl ImageSource {
    /// Short human-readable name for logs.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    /// Read and decode the image, converting to 8-bit RGB.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::FileRead`] if the file cannot be read,
    /// [`DetectionError::EmptyInput`] for empty data and
    /// [`DetectionError::ImageDecode`] for data that is not an image.
    pub fn load(&self) -> Result<RgbImage, DetectionError> {
        match self {
            Self::Path(path) => {
                let bytes = std::fs::read(path).map_err(|source| DetectionError::FileRead {
                    path: path.clone(),
                    source,
                })?;
                decode_rgb(&bytes)
            }
            Self::Bytes { bytes, .. } => decode_rgb(bytes),
        }
    }
}

/// Decode raw image bytes (PNG, JPEG, BMP, WebP) into 8-bit RGB.
///
/// # Errors
///
/// Returns [`DetectionError::EmptyInput`] if `bytes` is empty and
/// [`DetectionError::ImageDecode`] if the format is unrecognized or the
/// data is corrupt.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, DetectionError> {
    if bytes.is_empty() {
        return Err(DetectionError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Proof that the session accepted an upload; carries its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket {
    generation: u64,
}

impl RunTicket {
    pub(crate) const fn new(generation: u64) -> Self {
        Self { generation }
    }

    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// Everything a finished run hands back to the presentation layer.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub source: Arc<RgbImage>,
    /// `None` when overlay rendering failed; show `source` instead.
    pub annotated: Option<Arc<RgbImage>>,
    pub detections: Vec<Detection>,
}

impl RunOutput {
    /// The bitmap to put on the output surface.
    #[must_use]
    pub fn display_image(&self) -> &Arc<RgbImage> {
        self.annotated.as_ref().unwrap_or(&self.source)
    }
}

/// A message from a worker to the presentation loop.
#[derive(Debug)]
pub enum PipelineEvent {
    /// The source image decoded; show it before inference completes.
    SourceDecoded {
        generation: u64,
        image: Arc<RgbImage>,
    },
    /// The run is over.
    Finished {
        generation: u64,
        outcome: Result<RunOutput, DetectionError>,
    },
}

impl PipelineEvent {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        match self {
            Self::SourceDecoded { generation, .. } | Self::Finished { generation, .. } => {
                *generation
            }
        }
    }
}

/// The "post to the presentation thread" primitive.
///
/// Returns `false` if the receiving side is gone.
pub trait EventSink: Send + 'static {
    fn post(&self, event: PipelineEvent) -> bool;
}

impl EventSink for mpsc::Sender<PipelineEvent> {
    fn post(&self, event: PipelineEvent) -> bool {
        self.send(event).is_ok()
    }
}

/// Run detection on an already decoded image.
///
/// Calls the detector exactly once. An overlay rendering failure is
/// logged and yields `annotated: None`; it is not an error.
///
/// # Errors
///
/// Returns the detector's error, or [`DetectionError::UnknownClass`] if
/// the prediction names a class outside its own name table.
pub fn detect<D: DefectDetector + ?Sized>(
    detector: &D,
    source: Arc<RgbImage>,
    confidence_threshold: f32,
) -> Result<RunOutput, DetectionError> {
    let prediction = detector.predict(&source, confidence_threshold)?;
    let detections = prediction.detections()?;

    let annotated = match detector.render(&source, &prediction) {
        Ok(image) => Some(Arc::new(image)),
        Err(e) => {
            warn!(error = %e, "overlay rendering failed; showing the plain image");
            None
        }
    };

    Ok(RunOutput {
        source,
        annotated,
        detections,
    })
}

/// Dispatches uploads to worker threads.
///
/// Holds the process-wide detector, injected by the application root.
pub struct DetectionPipeline<D: ?Sized> {
    detector: Arc<D>,
    config: PipelineConfig,
}

impl<D: ?Sized> Clone for DetectionPipeline<D> {
    fn clone(&self) -> Self {
        Self {
            detector: Arc::clone(&self.detector),
            config: self.config.clone(),
        }
    }
}

impl<D: DefectDetector + ?Sized + 'static> DetectionPipeline<D> {
    #[must_use]
    pub const fn new(detector: Arc<D>, config: PipelineConfig) -> Self {
        Self { detector, config }
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub const fn detector(&self) -> &Arc<D> {
        &self.detector
    }

    /// Start a worker thread for one accepted upload.
    ///
    /// The thread runs to completion; there is no cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::Worker`] if the OS refuses to create the
    /// thread. No event is posted in that case.
    pub fn spawn<S: EventSink>(
        &self,
        ticket: RunTicket,
        source: ImageSource,
        sink: S,
    ) -> Result<JoinHandle<()>, DetectionError> {
        let worker = self.clone();
        thread::Builder::new()
            .name(format!("detect-{}", ticket.generation()))
            .spawn(move || worker.run(ticket, &source, &sink))
            .map_err(DetectionError::Worker)
    }

    /// The body of a worker: decode, post the source, detect, post the
    /// outcome. Runs on the calling thread.
    ///
    /// A panic in decoding or in the detector is caught and reported as
    /// [`DetectionError::WorkerPanicked`].
    pub fn run<S: EventSink + ?Sized>(&self, ticket: RunTicket, source: &ImageSource, sink: &S) {
        let generation = ticket.generation();
        let started = Instant::now();

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            source.load().and_then(|image| {
                let image = Arc::new(image);
                if !sink.post(PipelineEvent::SourceDecoded {
                    generation,
                    image: Arc::clone(&image),
                }) {
                    debug!(generation, "presentation loop gone; finishing run anyway");
                }
                detect(&*self.detector, image, self.config.confidence_threshold)
            })
        }));
        let outcome = attempt.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(
                generation,
                source = %source.name(),
                panic = %message,
                "detection worker panicked"
            );
            Err(DetectionError::WorkerPanicked(message))
        });

        match &outcome {
            Ok(output) => info!(
                generation,
                source = %source.name(),
                detections = output.detections.len(),
                elapsed = ?started.elapsed(),
                "detection run finished"
            ),
            Err(e) => info!(
                generation,
                source = %source.name(),
                error = %e,
                "detection run failed"
            ),
        }

        sink.post(PipelineEvent::Finished {
            generation,
            outcome,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
