//! pcb-inspect-bench: run the defect detector on one image from the
//! command line.
//!
//! Uses the same decode -> predict -> overlay path as the desktop app,
//! without a window. Useful for:
//!
//! - Checking that a model export loads and produces sensible boxes
//! - Tuning the confidence and IoU thresholds
//! - Measuring inference latency over several runs
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pcb-inspect-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use pcb_inspect_core::results::format_confidence;
use pcb_inspect_core::{
    DefectCatalog, Detection, ImageSource, PipelineConfig, ResultCard, ResultsPanel, RunOutput,
    detect,
};
use pcb_inspect_onnx::{ModelConfig, OnnxDetector};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Defect detection on a single image, with timing.
///
/// Loads the ONNX model, runs detection on the image one or more times
/// and prints the detections with their catalog descriptions.
#[derive(Parser)]
#[command(name = "pcb-inspect-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG).
    image_path: PathBuf,

    /// Path to the ONNX model.
    #[arg(long, default_value = ModelConfig::DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Class names file, one per line. Defaults to the built-in classes.
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Minimum confidence for a detection.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CONFIDENCE_THRESHOLD)]
    confidence: f32,

    /// IoU threshold for non-maximum suppression.
    #[arg(long, default_value_t = ModelConfig::DEFAULT_IOU_THRESHOLD)]
    iou: f32,

    /// Square model input size in pixels.
    #[arg(long, default_value_t = ModelConfig::DEFAULT_INPUT_SIZE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    input_size: u32,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output a JSON report instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Write the annotated image (PNG) from the first run to this path.
    #[arg(long)]
    annotated: Option<PathBuf>,

    /// Full configuration as a JSON string, shaped like
    /// `{"pipeline": {...}, "model": {...}}`.
    ///
    /// When provided, all other model and threshold flags are ignored.
    #[arg(long)]
    config_json: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct BenchConfig {
    pipeline: PipelineConfig,
    model: ModelConfig,
}

/// Machine-readable summary printed with `--json`.
#[derive(Serialize)]
struct Report<'a> {
    image: &'a Path,
    width: u32,
    height: u32,
    run_ms: Vec<f64>,
    mean_ms: f64,
    detections: &'a [Detection],
    cards: &'a [ResultCard],
}

/// Build a [`BenchConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<BenchConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(BenchConfig {
        pipeline: PipelineConfig {
            confidence_threshold: cli.confidence,
            ..PipelineConfig::default()
        },
        model: ModelConfig {
            model_path: cli.model.clone(),
            labels_path: cli.labels.clone(),
            input_size: cli.input_size,
            iou_threshold: cli.iou,
            ..ModelConfig::default()
        },
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let detector = match OnnxDetector::load(&config.model) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error loading model: {e}");
            return ExitCode::FAILURE;
        }
    };

    let source = ImageSource::Path(cli.image_path.clone());
    let board = match source.load() {
        Ok(image) => Arc::new(image),
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({}x{})",
        cli.image_path.display(),
        board.width(),
        board.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut durations = Vec::with_capacity(cli.runs);
    let mut first: Option<RunOutput> = None;

    for run in 0..cli.runs {
        let started = Instant::now();
        let output = match detect(
            &detector,
            Arc::clone(&board),
            config.pipeline.confidence_threshold,
        ) {
            Ok(output) => output,
            Err(e) => {
                eprintln!("Detection error: {e}");
                return ExitCode::FAILURE;
            }
        };
        let elapsed = started.elapsed();
        eprintln!(
            "Run {}/{}: {} detection(s) in {:.3}ms",
            run + 1,
            cli.runs,
            output.detections.len(),
            ms(elapsed),
        );
        durations.push(elapsed);
        if first.is_none() {
            first = Some(output);
        }
    }

    let Some(output) = first else {
        eprintln!("No runs completed");
        return ExitCode::FAILURE;
    };

    // Write the annotated image from the first run.
    if let Some(ref path) = cli.annotated {
        match output
            .display_image()
            .save_with_format(path, image::ImageFormat::Png)
        {
            Ok(()) => eprintln!("Annotated image written to {}", path.display()),
            Err(e) => eprintln!("Error writing annotated image to {}: {e}", path.display()),
        }
    }

    let mut panel = ResultsPanel::new();
    panel.rebuild(&output.detections, &DefectCatalog::builtin());

    if cli.json {
        let run_ms: Vec<f64> = durations.iter().copied().map(ms).collect();
        let report = Report {
            image: &cli.image_path,
            width: board.width(),
            height: board.height(),
            mean_ms: mean(&run_ms),
            run_ms,
            detections: &output.detections,
            cards: panel.cards(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&output, &panel, &durations);
    }

    ExitCode::SUCCESS
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Print detections, result cards and a timing summary.
fn print_report(output: &RunOutput, panel: &ResultsPanel, durations: &[Duration]) {
    println!("Detections\n{}", "=".repeat(60));
    if let Some(text) = panel.placeholder() {
        println!("{text}");
    }
    for (detection, card) in output.detections.iter().zip(panel.cards()) {
        let b = detection.bounding_box;
        println!(
            "{:<18} {:>5}  [{:.0}, {:.0}, {:.0}, {:.0}]",
            card.class_name,
            format_confidence(detection.confidence),
            b.x1,
            b.y1,
            b.x2,
            b.y2,
        );
        println!("    {}", card.description);
        println!("    Remedy: {}", card.remedy);
    }

    let run_ms: Vec<f64> = durations.iter().copied().map(ms).collect();
    let min = run_ms.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = run_ms.iter().copied().reduce(f64::max).unwrap_or(0.0);
    println!();
    println!(
        "Summary ({} runs): min={min:.3}ms  mean={:.3}ms  max={max:.3}ms",
        run_ms.len(),
        mean(&run_ms),
    );
}
