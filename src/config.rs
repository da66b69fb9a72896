//! Runtime configuration
//!
//! Read from an optional TOML file; every field has a default so an empty or
//! missing file is valid. Command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::events::DEFAULT_JSON_CAPACITY;
use crate::detection::DEFAULT_MIN_CONFIDENCE;
use crate::detection::ocr::default_model_dir;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera the frames come from, recorded with every detection
    pub camera_index: u32,

    /// Annotations at or below this confidence are ignored
    pub min_confidence: f32,

    pub database_path: PathBuf,
    pub csv_log_path: PathBuf,
    pub json_log_path: PathBuf,

    /// Records kept in the JSON log
    pub json_log_capacity: usize,

    /// Binarize frames before OCR
    pub preprocess: bool,

    /// Directory holding the ocrs models, `~/.cache/ocrs` when unset
    pub ocr_model_dir: Option<PathBuf>,

    /// Confidence reported for every OCR line
    pub assumed_confidence: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            database_path: PathBuf::from("vehicles.db"),
            csv_log_path: PathBuf::from("detection_logs.csv"),
            json_log_path: PathBuf::from("detection_logs.json"),
            json_log_capacity: DEFAULT_JSON_CAPACITY,
            preprocess: false,
            ocr_model_dir: None,
            assumed_confidence: 0.9,
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&content)
            }
            None => Ok(Config::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.assumed_confidence) {
            return Err(ConfigError::Invalid(format!(
                "assumed_confidence must be within [0, 1], got {}",
                self.assumed_confidence
            )));
        }
        if self.json_log_capacity == 0 {
            return Err(ConfigError::Invalid(
                "json_log_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Model directory, falling back to the ocrs cache location
    pub fn model_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.ocr_model_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_model_dir().ok_or(ConfigError::NoHomeDir),
        }
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Camera index:       {}", self.camera_index)?;
        writeln!(f, "Min confidence:     {:.2}", self.min_confidence)?;
        writeln!(f, "Database:           {}", self.database_path.display())?;
        writeln!(f, "CSV log:            {}", self.csv_log_path.display())?;
        writeln!(
            f,
            "JSON log:           {} (last {})",
            self.json_log_path.display(),
            self.json_log_capacity
        )?;
        writeln!(f, "Preprocess frames:  {}", self.preprocess)?;
        write!(
            f,
            "OCR models:         {}",
            self.model_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(not found)".to_string())
        )
    }
}
