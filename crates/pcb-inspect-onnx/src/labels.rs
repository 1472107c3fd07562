//! Class-name tables.

use std::path::Path;
use std::sync::Arc;

use crate::error::OnnxError;

/// Class order of the PCB defect dataset the default weights were
/// trained on.
pub const DEFAULT_LABELS: [&str; 6] = [
    "missing_hole",
    "mouse_bite",
    "open_circuit",
    "short",
    "spur",
    "spurious_copper",
];

#[must_use]
pub fn default_labels() -> Arc<[String]> {
    DEFAULT_LABELS.iter().map(|s| (*s).to_owned()).collect()
}

/// Parse a labels file: one class per line, blank lines and `#` comments
/// skipped, surrounding whitespace trimmed.
#[must_use]
pub fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// Load the class names from `path`, or the defaults when `path` is
/// `None`.
///
/// # Errors
///
/// Returns [`OnnxError::Labels`] if the file cannot be read and
/// [`OnnxError::EmptyLabels`] if it names no classes.
pub fn load_labels(path: Option<&Path>) -> Result<Arc<[String]>, OnnxError> {
    let Some(path) = path else {
        return Ok(default_labels());
    };
    let text = std::fs::read_to_string(path).map_err(|source| OnnxError::Labels {
        path: path.to_path_buf(),
        source,
    })?;
    let names = parse_labels(&text);
    if names.is_empty() {
        return Err(OnnxError::EmptyLabels(path.to_path_buf()));
    }
    Ok(names.into())
}
