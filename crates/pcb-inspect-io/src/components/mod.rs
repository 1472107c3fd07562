//! Dioxus UI components for pcb-inspect.
//!
//! Provides the upload control with drag-and-drop, the control bar, the
//! input/output image panels and the defect analysis list.

mod control_bar;
mod defect_analysis;
mod image_panel;
mod upload;

pub use control_bar::ControlBar;
pub use defect_analysis::DefectAnalysis;
pub use image_panel::{ImagePanel, tone_class};
pub use upload::{ALLOWED_EXTENSIONS, FileUpload, has_allowed_extension};
