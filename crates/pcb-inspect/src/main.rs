mod app;
mod config;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use dioxus::desktop::{Config, LogicalSize, WindowBuilder};
use dioxus::prelude::*;
use pcb_inspect_core::{DefectDetector, DetectionPipeline};
use pcb_inspect_onnx::OnnxDetector;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::{Services, app};
use crate::config::{AppConfig, CONFIG_FILE};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::load(Path::new(CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration error");
            return ExitCode::FAILURE;
        }
    };

    // The window only opens once the model is ready.
    let detector: Arc<dyn DefectDetector> = match OnnxDetector::load(&config.model) {
        Ok(detector) => Arc::new(detector),
        Err(e) => {
            error!(error = %e, model = %config.model.model_path.display(), "failed to load model");
            return ExitCode::FAILURE;
        }
    };
    info!("starting window");

    let services = Services {
        pipeline: DetectionPipeline::new(detector, config.pipeline),
    };

    let window = WindowBuilder::new()
        .with_title("PCB Defect Detection")
        .with_inner_size(LogicalSize::new(1400.0, 800.0))
        .with_min_inner_size(LogicalSize::new(1100.0, 650.0));

    LaunchBuilder::desktop()
        .with_cfg(Config::new().with_window(window))
        .with_context(services)
        .launch(app);

    ExitCode::SUCCESS
}
