//! Configuration management for the fingerspelling pipeline

use anyhow::{bail, Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "FINGERSPELL_CONFIG";

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub live: LiveConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Request/reply subject for one-shot predictions
    #[serde(default = "default_predict_subject")]
    pub predict_subject: String,
    /// Request/reply subject for model metadata
    #[serde(default = "default_metadata_subject")]
    pub metadata_subject: String,
    /// Subject carrying live frames
    #[serde(default = "default_frame_subject")]
    pub frame_subject: String,
    /// Subject for stabilized live letters
    #[serde(default = "default_letter_subject")]
    pub letter_subject: String,
}

fn default_predict_subject() -> String {
    "asl.predict".to_string()
}

fn default_metadata_subject() -> String {
    "asl.metadata".to_string()
}

fn default_frame_subject() -> String {
    "asl.frames".to_string()
}

fn default_letter_subject() -> String {
    "asl.letters".to_string()
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding metadata, classifier and scaler
    pub models_dir: String,
    /// Metadata file name inside `models_dir`
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_metadata_file() -> String {
    "metadata.json".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Live session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    /// Number of recent per-frame predictions in the majority vote
    #[serde(default = "default_vote_window")]
    pub vote_window: usize,
    /// Consecutive ticks without a hand before a session is cleared (0 = never)
    #[serde(default)]
    pub reset_after_misses: u32,
    /// Seconds without frames before a session is dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_vote_window() -> usize {
    8
}

fn default_session_idle_secs() -> u64 {
    300
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            vote_window: default_vote_window(),
            reset_after_misses: 0,
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum one-shot requests processed concurrently
    pub workers: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `FINGERSPELL_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.live.vote_window == 0 {
            bail!("live.vote_window must be greater than zero");
        }
        if self.pipeline.workers == 0 {
            bail!("pipeline.workers must be greater than zero");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                predict_subject: default_predict_subject(),
                metadata_subject: default_metadata_subject(),
                frame_subject: default_frame_subject(),
                letter_subject: default_letter_subject(),
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                metadata_file: default_metadata_file(),
                onnx_threads: 1,
            },
            live: LiveConfig::default(),
            pipeline: PipelineConfig { workers: 4 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.predict_subject, "asl.predict");
        assert_eq!(config.models.metadata_file, "metadata.json");
        assert_eq!(config.live.vote_window, 8);
        assert_eq!(config.live.reset_after_misses, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_minimal_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[nats]
url = "nats://nats:4222"

[models]
models_dir = "/srv/models"

[pipeline]
workers = 2

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.nats.url, "nats://nats:4222");
        assert_eq!(config.nats.letter_subject, "asl.letters");
        assert_eq!(config.models.models_dir, "/srv/models");
        assert_eq!(config.models.onnx_threads, 1);
        assert_eq!(config.live.session_idle_secs, 300);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_zero_vote_window_rejected() {
        let mut config = AppConfig::default();
        config.live.vote_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load_from_path(dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = AppConfig::load_from_path(path).unwrap();
        assert_eq!(config.live.vote_window, 8);
        assert_eq!(config.pipeline.workers, 4);
    }
}
