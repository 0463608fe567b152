//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("chart not found: {path}")]
    ChartNotFound { path: String },

    #[error("invalid chart: {message}")]
    InvalidChart { message: String },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("archive error: {message}")]
    Archive { message: String },

    #[error("found in requirements.yaml, but missing in charts/ directory: {}", missing.join(", "))]
    MissingDependencies { missing: Vec<String> },
}

impl CoreError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidChart {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
