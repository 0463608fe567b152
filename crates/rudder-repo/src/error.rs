//! Error types for repository operations

use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("Repository not found: {name}")]
    RepositoryNotFound { name: String },

    #[error("no repositories to show")]
    NoRepositories,

    #[error("Repository file not found: {path}. Add a repository first")]
    RepositoryFileMissing { path: String },

    #[error("Invalid repository configuration: {message}")]
    InvalidConfig { message: String },

    // ============ Index Errors ============
    #[error("Invalid index {path}: {message}")]
    InvalidIndex { path: String, message: String },

    #[error("chart {name:?} not found in repository {repo}")]
    ChartNotInRepository { name: String, repo: String },

    #[error("no chart version found for {name}-{version}")]
    VersionNotFound { name: String, version: String },

    // ============ Resolution Errors ============
    #[error("{0}")]
    ChartNotFound(String),

    #[error("invalid chart reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("no getter registered for scheme {scheme:?}")]
    UnsupportedScheme { scheme: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("failed to download {reference:?}: {message}")]
    DownloadFailed { reference: String, message: String },

    // ============ Verification Errors ============
    #[error("verification failed: {message}")]
    VerificationFailed { message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    pub(crate) fn verification(message: impl Into<String>) -> Self {
        Self::VerificationFailed {
            message: message.into(),
        }
    }

    /// Whether the error means nothing matched the requested reference
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ChartNotFound(_)
                | Self::RepositoryNotFound { .. }
                | Self::NoRepositories
                | Self::RepositoryFileMissing { .. }
                | Self::ChartNotInRepository { .. }
                | Self::VersionNotFound { .. }
        )
    }
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            RepoError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else {
            RepoError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for RepoError {
    fn from(e: url::ParseError) -> Self {
        RepoError::InvalidReference {
            reference: String::new(),
            reason: e.to_string(),
        }
    }
}
