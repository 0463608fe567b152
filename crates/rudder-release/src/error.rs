//! Error types for rudder-release
//!
//! Two layers:
//! - [`BackendError`]: failures reported by a [`ReleaseBackend`](crate::backend::ReleaseBackend),
//!   classifiable through [`BackendError::kind`]
//! - [`ReleaseError`]: what the lifecycle manager and query service return,
//!   classifiable through [`ReleaseError::kind`]

use rudder_core::CoreError;
use rudder_engine::EngineError;
use rudder_repo::RepoError;
use serde::Serialize;
use thiserror::Error;

/// Result type for release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Result type for backend and storage operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Errors reported by a release backend
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("release: {name:?} not found")]
    ReleaseNotFound { name: String },

    #[error("release: {name:?} revision {revision} not found")]
    RevisionNotFound { name: String, revision: u32 },

    #[error(
        "a release named {name} already exists.\nRun: rudder ls --all {name}; to check the status of the release\nOr delete it with purge"
    )]
    AlreadyExists { name: String },

    #[error("{0}")]
    InvalidRequest(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("release backend unavailable: {0}")]
    Unavailable(String),

    /// Failure wrapped by the transport to the backend
    #[error("rpc error: code = {code} desc = {source}")]
    Transport {
        code: String,
        #[source]
        source: Box<BackendError>,
    },
}

/// Classification of a [`BackendError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    ReleaseNotFound,
    RevisionNotFound,
    AlreadyExists,
    InvalidRequest,
    Storage,
    Unavailable,
}

impl BackendError {
    /// Kind of the underlying failure, looking through transport wrapping
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            Self::ReleaseNotFound { .. } => BackendErrorKind::ReleaseNotFound,
            Self::RevisionNotFound { .. } => BackendErrorKind::RevisionNotFound,
            Self::AlreadyExists { .. } => BackendErrorKind::AlreadyExists,
            Self::InvalidRequest(_) => BackendErrorKind::InvalidRequest,
            Self::Storage(_) => BackendErrorKind::Storage,
            Self::Unavailable(_) => BackendErrorKind::Unavailable,
            Self::Transport { source, .. } => source.kind(),
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::ReleaseNotFound { name: name.into() }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Storage(format!("serialization error: {}", e))
    }
}

/// Strip transport wrapping so only the backend's own description remains
pub fn normalize(err: BackendError) -> BackendError {
    match err {
        BackendError::Transport { source, .. } => normalize(*source),
        other => other,
    }
}

/// Caller-visible error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Verification,
    Dependency,
    Backend,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Verification => "verification",
            Self::Dependency => "dependency",
            Self::Backend => "backend",
            Self::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

/// Errors returned by release lifecycle and query operations
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A required request field is missing or malformed
    #[error("{0}")]
    Validation(String),

    /// Chart or release absent
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Verification(String),

    #[error("found in requirements.yaml, but missing in charts/ directory: {}", missing.join(", "))]
    Dependency { missing: Vec<String> },

    /// Normalized backend failure
    #[error("{0}")]
    Backend(BackendError),

    /// Normalized backend failure of an upgrade
    #[error("UPGRADE FAILED: {0}")]
    UpgradeFailed(BackendError),

    #[error("{0}")]
    Internal(String),
}

impl ReleaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Verification(_) => ErrorKind::Verification,
            Self::Dependency { .. } => ErrorKind::Dependency,
            Self::Backend(e) | Self::UpgradeFailed(e) => match e.kind() {
                BackendErrorKind::ReleaseNotFound | BackendErrorKind::RevisionNotFound => {
                    ErrorKind::NotFound
                }
                BackendErrorKind::InvalidRequest => ErrorKind::Validation,
                _ => ErrorKind::Backend,
            },
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn upgrade_failed(e: BackendError) -> Self {
        Self::UpgradeFailed(normalize(e))
    }
}

impl From<BackendError> for ReleaseError {
    fn from(e: BackendError) -> Self {
        ReleaseError::Backend(normalize(e))
    }
}

impl From<RepoError> for ReleaseError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::VerificationFailed { .. } => ReleaseError::Verification(e.to_string()),
            RepoError::InvalidReference { .. } => ReleaseError::Validation(e.to_string()),
            e if e.is_not_found() => ReleaseError::NotFound(e.to_string()),
            e => ReleaseError::Internal(e.to_string()),
        }
    }
}

impl From<CoreError> for ReleaseError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MissingDependencies { missing } => ReleaseError::Dependency { missing },
            CoreError::ChartNotFound { .. } => ReleaseError::NotFound(e.to_string()),
            CoreError::Io(_) => ReleaseError::Internal(e.to_string()),
            e => ReleaseError::Validation(e.to_string()),
        }
    }
}

impl From<EngineError> for ReleaseError {
    fn from(e: EngineError) -> Self {
        match &e {
            EngineError::Template(t) if !t.kind().is_user_error() => {
                ReleaseError::Internal(e.to_string())
            }
            EngineError::Template(t) => ReleaseError::Validation(format!(
                "invalid name template ({}): {}",
                t.kind().as_str(),
                t.message
            )),
            EngineError::EmptyName { .. } => ReleaseError::Validation(e.to_string()),
        }
    }
}
