//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LapseError, LapseResult};

/// Global application configuration (`config.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults for the renderer; CLI flags override these.
    pub render: RenderDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default render parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Directory rendered videos are written to.
    pub outdir: PathBuf,

    /// Output frame rate.
    pub fps: u32,

    /// x264 constant rate factor.
    pub crf: u32,

    /// x264 preset name.
    pub preset: String,

    /// Encoder binary, resolved through `PATH`.
    pub encoder: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "lapse_render_engine=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("Timelapses"),
            fps: 24,
            crf: 20,
            preset: "slow".to_string(),
            encoder: "ffmpeg".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location. Callers that load config
    /// before logging is set up use this and log the error themselves.
    pub fn try_load() -> LapseResult<Self> {
        Self::try_load_from(&config_file_path())
    }

    /// Load config from `path`. A missing file yields defaults.
    pub fn try_load_from(path: &Path) -> LapseResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            LapseError::config(format!("Failed to read config at {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            LapseError::config(format!("Failed to parse config at {}: {e}", path.display()))
        })
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("lapse").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_renderer_flags() {
        let config = AppConfig::default();
        assert_eq!(config.render.outdir, PathBuf::from("Timelapses"));
        assert_eq!(config.render.fps, 24);
        assert_eq!(config.render.crf, 20);
        assert_eq!(config.render.preset, "slow");
        assert_eq!(config.render.encoder, "ffmpeg");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::try_load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.render.fps, 24);
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"render":{"fps":30,"preset":"medium"}}"#).unwrap();

        let config = AppConfig::try_load_from(&path).unwrap();
        assert_eq!(config.render.fps, 30);
        assert_eq!(config.render.preset, "medium");
        assert_eq!(config.render.crf, 20);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::try_load_from(&path).unwrap_err();
        assert!(matches!(err, LapseError::Config { .. }));
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_full_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.render.encoder = "/opt/ffmpeg/bin/ffmpeg".to_string();
        config.logging.json = true;
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::try_load_from(&path).unwrap();
        assert_eq!(loaded.render.encoder, "/opt/ffmpeg/bin/ffmpeg");
        assert!(loaded.logging.json);
    }
}
