//! Root component and the bridge from worker threads to the UI loop.

use dioxus::prelude::*;
use futures_channel::mpsc::{UnboundedSender, unbounded};
use futures_util::StreamExt;
use pcb_inspect_core::{
    Applied, DefectCatalog, DefectDetector, DetectionPipeline, EventSink, ImageSource,
    PipelineEvent, Session,
};
use pcb_inspect_io::{ControlBar, DefectAnalysis, ImagePanel};
use tracing::{error, info};

/// Process-wide services, provided as root context.
#[derive(Clone)]
pub struct Services {
    pub pipeline: DetectionPipeline<dyn DefectDetector>,
}

/// Posts worker events onto the channel drained by the UI task.
struct UiSink(UnboundedSender<PipelineEvent>);

impl EventSink for UiSink {
    fn post(&self, event: PipelineEvent) -> bool {
        self.0.unbounded_send(event).is_ok()
    }
}

/// Root application component.
///
/// Owns the [`Session`] in a signal. An upload is accepted by the
/// session, dispatched to a worker thread, and the worker's events are
/// applied back to the session by a task running on the UI loop.
pub fn app() -> Element {
    let services = use_context::<Services>();
    let mut session = use_signal({
        let config = services.pipeline.config().clone();
        move || Session::new(DefectCatalog::builtin(), &config)
    });

    let on_upload = move |(bytes, name): (Vec<u8>, String)| {
        let Some(ticket) = session.write().begin_upload() else {
            return;
        };
        info!(generation = ticket.generation(), file = %name, "upload accepted");

        let (tx, mut rx) = unbounded();
        let source = ImageSource::Bytes { name, bytes };
        if let Err(e) = services.pipeline.spawn(ticket, source, UiSink(tx)) {
            error!(error = %e, "could not start detection");
            session.write().abort(ticket, e);
            return;
        }

        spawn(async move {
            while let Some(event) = rx.next().await {
                if let Applied::Completed { detections } = session.write().apply(event) {
                    info!(generation = ticket.generation(), detections, "results shown");
                }
            }
            // The worker dropped its sender; unlock the UI if it never finished.
            session.write().worker_exited(ticket);
        });
    };

    let on_clear = move |()| {
        session.write().clear();
    };

    let s = session.read();

    rsx! {
        style { dangerous_inner_html: include_str!("../assets/theme.css") }

        div { class: "app",
            header { class: "app-header",
                div { class: "brand",
                    h1 { "PCB Defect Detection" }
                    span { class: "status muted", "Dark Dashboard" }
                }
                ControlBar {
                    enabled: s.controls_enabled(),
                    on_upload,
                    on_clear,
                }
            }

            main { class: "layout",
                ImagePanel {
                    title: "Uploaded Image",
                    surface: s.input().clone(),
                    status: s.input_status().clone(),
                }
                ImagePanel {
                    title: "Detection Result",
                    surface: s.output().clone(),
                    status: s.output_status().clone(),
                }
                DefectAnalysis { panel: s.results().clone() }
            }
        }
    }
}
