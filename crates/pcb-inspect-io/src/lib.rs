//! pcb-inspect-io: Dioxus component library and image encoding.
//!
//! Turns core state (`ImageSurface`, `ResultsPanel`, `StatusLine`) into
//! markup for the desktop webview and reads user-picked files.

pub mod components;
pub mod raster;

pub use components::{ControlBar, DefectAnalysis, FileUpload, ImagePanel};
