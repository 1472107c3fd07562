//! Startup configuration.
//!
//! Read once from `pcb-inspect.json` in the working directory. A missing
//! file means all defaults; any other problem aborts startup.

use std::path::{Path, PathBuf};

use pcb_inspect_core::PipelineConfig;
use pcb_inspect_onnx::ModelConfig;
use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "pcb-inspect.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub model: ModelConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AppConfig {
    /// Load from `path`, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file exists but cannot be
    /// read and [`ConfigError::Parse`] if it is not valid configuration
    /// JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let config = AppConfig::load(Path::new("/no/such/dir/pcb-inspect.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn nested_partial_config() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "pipeline": { "confidence_threshold": 0.5 }, "model": { "model_path": "pcb.onnx" } }"#,
        )
        .unwrap();
        assert!((config.pipeline.confidence_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.pipeline.display_max_edge, 560);
        assert_eq!(config.model.model_path, PathBuf::from("pcb.onnx"));
        assert_eq!(config.model.input_size, 640);
    }

    #[test]
    fn directory_is_a_read_error() {
        let result = AppConfig::load(Path::new(env!("CARGO_MANIFEST_DIR")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
