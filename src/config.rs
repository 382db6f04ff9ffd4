use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_UNDO_COUNT: usize = 50;
pub const DEFAULT_MAX_LAYERS: usize = 20;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;
pub const DEFAULT_MAX_RECENT_DOCUMENTS: usize = 50;
pub const DEFAULT_THUMBNAIL_SIZE: [u32; 2] = [256, 256];
pub const DEFAULT_MAX_CANVAS_DIMENSION: f32 = 16_384.0;

/// Errors that can occur while loading the editor configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Tunable limits for documents, history, caching and storage.
///
/// Missing fields fall back to their defaults when deserializing, so a config
/// file only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Depth of the undo stack; the oldest snapshot is evicted beyond this
    pub max_undo_count: usize,
    /// Maximum number of layers in one document
    pub max_layers: usize,
    /// Quiet period before a burst of drawing changes counts as settled
    pub settle_delay_ms: u64,
    /// Number of documents kept in storage and in the recent index
    pub max_recent_documents: usize,
    /// Bounding box for document and layer thumbnails
    pub thumbnail_size: [u32; 2],
    /// Largest accepted canvas width or height, in canvas units
    pub max_canvas_dimension: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_count: DEFAULT_MAX_UNDO_COUNT,
            max_layers: DEFAULT_MAX_LAYERS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            max_recent_documents: DEFAULT_MAX_RECENT_DOCUMENTS,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            max_canvas_dimension: DEFAULT_MAX_CANVAS_DIMENSION,
        }
    }
}

impl EditorConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads the config from `path`, using defaults if the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = EditorConfig::from_json_str(r#"{ "max_undo_count": 5 }"#).unwrap();
        assert_eq!(config.max_undo_count, 5);
        assert_eq!(config.max_layers, DEFAULT_MAX_LAYERS);
        assert_eq!(config.settle_delay(), Duration::from_millis(100));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            EditorConfig::from_json_str("{ not json"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
