//! The application shell's state, independent of any UI toolkit.
//!
//! A [`Session`] owns the current [`DetectionRun`], both image surfaces,
//! the results panel and the two status lines. It is only ever touched
//! on the presentation thread: user actions call [`Session::begin_upload`]
//! and [`Session::clear`], and events drained from the worker channel are
//! fed to [`Session::apply`].

use tracing::{debug, warn};

use crate::catalog::DefectCatalog;
use crate::pipeline::{PipelineEvent, RunOutput, RunTicket};
use crate::results::ResultsPanel;
use crate::surface::ImageSurface;
use crate::types::{DetectionError, DetectionRun, PipelineConfig, RunStatus};

pub const INPUT_STARTUP_STATUS: &str = "No image loaded.";
pub const INPUT_IDLE_STATUS: &str = "Upload a PCB image to begin detection.";
pub const OUTPUT_IDLE_STATUS: &str = "Detection results will appear here.";
pub const LOADING_STATUS: &str = "Loading image...";
pub const DETECTING_STATUS: &str = "Image loaded. Detecting...";
pub const LOADED_STATUS: &str = "Image loaded.";
pub const NO_DEFECTS_STATUS: &str = "No defects detected.";

/// Visual emphasis of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Muted,
    Normal,
    Accent,
    Error,
}

/// One line of status text under an image panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: StatusTone,
}

impl StatusLine {
    fn new(text: impl Into<String>, tone: StatusTone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    fn input_startup() -> Self {
        Self::new(INPUT_STARTUP_STATUS, StatusTone::Muted)
    }

    fn input_idle() -> Self {
        Self::new(INPUT_IDLE_STATUS, StatusTone::Muted)
    }

    fn output_idle() -> Self {
        Self::new(OUTPUT_IDLE_STATUS, StatusTone::Muted)
    }
}

/// What [`Session::apply`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The event belonged to an older run and was dropped.
    Stale,
    /// The decoded source is now on the input surface.
    SourceShown,
    /// The run finished; results are on screen.
    Completed { detections: usize },
    /// The run failed; the error is in the output status.
    Failed,
}

/// Output status text for a successful run.
#[must_use]
pub fn detected_status(count: usize) -> String {
    if count == 0 {
        NO_DEFECTS_STATUS.to_owned()
    } else {
        format!("{count} defect(s) detected.")
    }
}

/// Output status text for a failed run.
#[must_use]
pub fn error_status(error: &DetectionError) -> String {
    format!("Error during detection: {error}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    catalog: DefectCatalog,
    generation: u64,
    run: DetectionRun,
    input: ImageSurface,
    output: ImageSurface,
    results: ResultsPanel,
    input_status: StatusLine,
    output_status: StatusLine,
    /// Input status to restore when a run fails before its source decodes.
    pre_upload_status: StatusLine,
}

impl Session {
    #[must_use]
    pub fn new(catalog: DefectCatalog, config: &PipelineConfig) -> Self {
        let max_edge = config.display_max_edge;
        Self {
            catalog,
            generation: 0,
            run: DetectionRun {
                generation: 0,
                source: None,
                annotated: None,
                detections: Vec::new(),
                status: RunStatus::Idle,
            },
            input: ImageSurface::blank(max_edge),
            output: ImageSurface::blank(max_edge),
            results: ResultsPanel::new(),
            input_status: StatusLine::input_startup(),
            output_status: StatusLine::output_idle(),
            pre_upload_status: StatusLine::input_startup(),
        }
    }

    /// Accept an upload and enter `Loading`.
    ///
    /// Returns `None`, changing nothing, while a run is in flight.
    pub fn begin_upload(&mut self) -> Option<RunTicket> {
        if self.is_busy() {
            debug!(generation = self.generation, "upload refused while busy");
            return None;
        }
        self.generation += 1;
        self.run = DetectionRun::loading(self.generation);
        self.pre_upload_status = self.input_status.clone();
        self.input_status = StatusLine::new(LOADING_STATUS, StatusTone::Muted);
        Some(RunTicket::new(self.generation))
    }

    /// Report that an accepted upload never reached a worker.
    ///
    /// Used when [`DetectionPipeline::spawn`](crate::pipeline::DetectionPipeline::spawn)
    /// fails; the run ends in `Failed` like any other error.
    pub fn abort(&mut self, ticket: RunTicket, error: DetectionError) -> Applied {
        self.apply(PipelineEvent::Finished {
            generation: ticket.generation(),
            outcome: Err(error),
        })
    }

    /// Report that the event channel of `ticket`'s worker closed.
    ///
    /// If that run is still in flight the worker died without posting
    /// [`PipelineEvent::Finished`], and the run fails with
    /// [`DetectionError::WorkerExited`]. Otherwise returns
    /// [`Applied::Stale`] and changes nothing.
    pub fn worker_exited(&mut self, ticket: RunTicket) -> Applied {
        if ticket.generation() != self.run.generation || !self.is_busy() {
            return Applied::Stale;
        }
        warn!(generation = ticket.generation(), "worker exited without a result");
        self.fail(&DetectionError::WorkerExited)
    }

    /// Fold one worker event into the session.
    pub fn apply(&mut self, event: PipelineEvent) -> Applied {
        if event.generation() != self.run.generation || !self.run.status.is_busy() {
            debug!(
                event_generation = event.generation(),
                current = self.run.generation,
                "dropping stale pipeline event"
            );
            return Applied::Stale;
        }

        match event {
            PipelineEvent::SourceDecoded { image, .. } => {
                self.input.update(&image);
                self.run.source = Some(image);
                self.run.status = RunStatus::Detecting;
                self.input_status = StatusLine::new(DETECTING_STATUS, StatusTone::Normal);
                Applied::SourceShown
            }
            PipelineEvent::Finished {
                outcome: Ok(output),
                ..
            } => self.complete(output),
            PipelineEvent::Finished {
                outcome: Err(error),
                ..
            } => self.fail(&error),
        }
    }

    fn complete(&mut self, output: RunOutput) -> Applied {
        let count = output.detections.len();

        if self.run.source.is_none() {
            self.input.update(&output.source);
            self.input_status = StatusLine::new(DETECTING_STATUS, StatusTone::Normal);
        }
        self.output.update(output.display_image());
        self.results.rebuild(&output.detections, &self.catalog);

        self.output_status = if count == 0 {
            StatusLine::new(detected_status(0), StatusTone::Muted)
        } else {
            StatusLine::new(detected_status(count), StatusTone::Accent)
        };

        self.run.source = Some(output.source);
        self.run.annotated = output.annotated;
        self.run.detections = output.detections;
        self.run.status = RunStatus::Done;

        Applied::Completed { detections: count }
    }

    fn fail(&mut self, error: &DetectionError) -> Applied {
        self.input_status = if self.run.source.is_none() {
            self.pre_upload_status.clone()
        } else {
            StatusLine::new(LOADED_STATUS, StatusTone::Normal)
        };
        self.output_status = StatusLine::new(error_status(error), StatusTone::Error);
        self.run.status = RunStatus::Failed(error.to_string());
        Applied::Failed
    }

    /// Return to `Idle`, blanking everything.
    ///
    /// A no-op returning `false` while a run is in flight.
    pub fn clear(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.run = DetectionRun {
            generation: self.generation,
            source: None,
            annotated: None,
            detections: Vec::new(),
            status: RunStatus::Idle,
        };
        self.input.reset();
        self.output.reset();
        self.results.clear();
        self.input_status = StatusLine::input_idle();
        self.output_status = StatusLine::output_idle();
        self.pre_upload_status = StatusLine::input_idle();
        true
    }

    #[must_use]
    pub const fn status(&self) -> &RunStatus {
        &self.run.status
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.run.status.is_busy()
    }

    /// Upload and Clear are enabled exactly when no run is in flight.
    #[must_use]
    pub const fn controls_enabled(&self) -> bool {
        !self.is_busy()
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn run(&self) -> &DetectionRun {
        &self.run
    }

    #[must_use]
    pub const fn catalog(&self) -> &DefectCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn input(&self) -> &ImageSurface {
        &self.input
    }

    #[must_use]
    pub const fn output(&self) -> &ImageSurface {
        &self.output
    }

    #[must_use]
    pub const fn results(&self) -> &ResultsPanel {
        &self.results
    }

    #[must_use]
    pub const fn input_status(&self) -> &StatusLine {
        &self.input_status
    }

    #[must_use]
    pub const fn output_status(&self) -> &StatusLine {
        &self.output_status
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DefectCatalog::builtin(), &PipelineConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use image::Rgb;

    use super::*;
    use crate::types::{BoundingBox, Detection, RgbImage};

    fn session() -> Session {
        Session::new(
            DefectCatalog::builtin(),
            &PipelineConfig {
                display_max_edge: 64,
                ..PipelineConfig::default()
            },
        )
    }

    fn bitmap() -> Arc<RgbImage> {
        Arc::new(RgbImage::from_pixel(32, 16, Rgb([1, 2, 3])))
    }

    fn finished_ok(generation: u64, detections: Vec<Detection>) -> PipelineEvent {
        PipelineEvent::Finished {
            generation,
            outcome: Ok(RunOutput {
                source: bitmap(),
                annotated: Some(bitmap()),
                detections,
            }),
        }
    }

    fn spur(confidence: f32) -> Detection {
        Detection {
            class_name: "spur".into(),
            confidence,
            bounding_box: BoundingBox::new(0.0, 0.0, 2.0, 2.0),
        }
    }

    #[test]
    fn starts_idle() {
        let s = session();
        assert_eq!(s.status(), &RunStatus::Idle);
        assert!(s.controls_enabled());
        assert!(s.input().is_placeholder());
        assert!(s.output().is_placeholder());
        assert_eq!(s.input_status().text, INPUT_STARTUP_STATUS);
        assert_eq!(s.output_status().text, OUTPUT_IDLE_STATUS);
    }

    #[test]
    fn upload_enters_loading_and_refuses_second() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        assert_eq!(ticket.generation(), 1);
        assert_eq!(s.status(), &RunStatus::Loading);
        assert!(!s.controls_enabled());
        assert_eq!(s.input_status().text, LOADING_STATUS);
        assert!(s.begin_upload().is_none());
        assert_eq!(s.generation(), 1);
    }

    #[test]
    fn full_run_transitions() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        let applied = s.apply(PipelineEvent::SourceDecoded {
            generation: ticket.generation(),
            image: bitmap(),
        });
        assert_eq!(applied, Applied::SourceShown);
        assert_eq!(s.status(), &RunStatus::Detecting);
        assert!(!s.input().is_placeholder());
        assert_eq!(s.input_status().text, DETECTING_STATUS);

        let applied = s.apply(finished_ok(ticket.generation(), vec![spur(0.5)]));
        assert_eq!(applied, Applied::Completed { detections: 1 });
        assert_eq!(s.status(), &RunStatus::Done);
        assert!(s.controls_enabled());
        assert_eq!(s.output_status().text, "1 defect(s) detected.");
        assert_eq!(s.output_status().tone, StatusTone::Accent);
        assert_eq!(s.results().cards().len(), 1);
        assert!(!s.output().is_placeholder());
    }

    #[test]
    fn zero_detections_is_muted() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        s.apply(finished_ok(ticket.generation(), Vec::new()));
        assert_eq!(s.output_status().text, NO_DEFECTS_STATUS);
        assert_eq!(s.output_status().tone, StatusTone::Muted);
    }

    #[test]
    fn early_failure_restores_input_status() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        let applied = s.apply(PipelineEvent::Finished {
            generation: ticket.generation(),
            outcome: Err(DetectionError::EmptyInput),
        });
        assert_eq!(applied, Applied::Failed);
        assert!(matches!(s.status(), RunStatus::Failed(_)));
        assert_eq!(s.input_status().text, INPUT_STARTUP_STATUS);
        assert_eq!(
            s.output_status().text,
            "Error during detection: input image data is empty"
        );
        assert_eq!(s.output_status().tone, StatusTone::Error);
        assert!(s.controls_enabled());
    }

    #[test]
    fn stale_generation_is_dropped() {
        let mut s = session();
        let first = s.begin_upload().unwrap();
        s.apply(finished_ok(first.generation(), Vec::new()));
        let second = s.begin_upload().unwrap();

        assert_eq!(
            s.apply(finished_ok(first.generation(), vec![spur(0.9)])),
            Applied::Stale
        );
        assert_eq!(s.status(), &RunStatus::Loading);
        assert_eq!(s.run().generation, second.generation());
    }

    #[test]
    fn event_after_finish_is_stale() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        s.apply(finished_ok(ticket.generation(), Vec::new()));
        assert_eq!(
            s.apply(PipelineEvent::SourceDecoded {
                generation: ticket.generation(),
                image: bitmap(),
            }),
            Applied::Stale
        );
    }

    #[test]
    fn clear_while_busy_is_noop() {
        let mut s = session();
        s.begin_upload().unwrap();
        let before = s.clone();
        assert!(!s.clear());
        assert_eq!(s, before);
    }

    #[test]
    fn abort_fails_the_run() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        let error = DetectionError::Worker(std::io::Error::other("no threads"));
        assert_eq!(s.abort(ticket, error), Applied::Failed);
        assert!(s.controls_enabled());
        assert!(s.output_status().text.contains("no threads"));
    }

    #[test]
    fn failure_after_decode_drops_detecting_text() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        s.apply(PipelineEvent::SourceDecoded {
            generation: ticket.generation(),
            image: bitmap(),
        });
        s.apply(PipelineEvent::Finished {
            generation: ticket.generation(),
            outcome: Err(DetectionError::inference("bad tensor")),
        });
        assert_eq!(s.input_status().text, LOADED_STATUS);
        assert!(!s.input().is_placeholder());
    }

    #[test]
    fn worker_exit_while_busy_fails_the_run() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        assert_eq!(s.worker_exited(ticket), Applied::Failed);
        assert!(matches!(s.status(), RunStatus::Failed(_)));
        assert!(s.controls_enabled());
        assert_eq!(
            s.output_status().text,
            "Error during detection: detection worker exited without a result"
        );
        assert!(s.clear());
    }

    #[test]
    fn worker_exit_after_finish_is_stale() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        s.apply(finished_ok(ticket.generation(), vec![spur(0.6)]));
        let before = s.clone();
        assert_eq!(s.worker_exited(ticket), Applied::Stale);
        assert_eq!(s, before);

        let next = s.begin_upload().unwrap();
        assert_eq!(s.worker_exited(ticket), Applied::Stale);
        assert_eq!(s.run().generation, next.generation());
        assert_eq!(s.status(), &RunStatus::Loading);
    }

    #[test]
    fn clear_after_run_resets_everything() {
        let mut s = session();
        let ticket = s.begin_upload().unwrap();
        s.apply(finished_ok(ticket.generation(), vec![spur(0.4)]));
        assert!(s.clear());
        assert_eq!(s.status(), &RunStatus::Idle);
        assert!(s.input().is_placeholder());
        assert!(s.output().is_placeholder());
        assert!(s.results().is_idle());
        assert_eq!(s.input_status().text, INPUT_IDLE_STATUS);
        assert_eq!(s.output_status().text, OUTPUT_IDLE_STATUS);
        // Generations keep counting after a clear.
        assert_eq!(s.begin_upload().unwrap().generation(), 2);
    }

    #[test]
    fn status_texts() {
        assert_eq!(detected_status(0), "No defects detected.");
        assert_eq!(detected_status(3), "3 defect(s) detected.");
        assert_eq!(
            error_status(&DetectionError::inference("model exploded")),
            "Error during detection: model exploded"
        );
    }
}
