//! Typed errors for the collaborator boundaries

use std::path::PathBuf;

use thiserror::Error;

/// Failure inside the OCR annotator. The frame loop logs it and treats the
/// frame as having no annotations.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("OCR models not found, expected {detection:?} and {recognition:?}")]
    ModelsNotFound {
        detection: PathBuf,
        recognition: PathBuf,
    },

    #[error("Failed to load OCR model {path:?}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("Invalid image for OCR: {0}")]
    ImageSource(String),

    #[error("OCR engine error: {0}")]
    Engine(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Home directory not found")]
    NoHomeDir,
}
