//! Release status codes and list ordering

use serde::{Deserialize, Serialize};

/// Release status as reported by the release backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    #[default]
    Unknown,
    Deployed,
    Deleted,
    Deleting,
    Failed,
    Superseded,
}

impl StatusCode {
    /// Codes selected by a list request with `all` set
    pub const ALL: [StatusCode; 5] = [
        StatusCode::Unknown,
        StatusCode::Deployed,
        StatusCode::Deleted,
        StatusCode::Deleting,
        StatusCode::Failed,
    ];

    /// Codes selected by a list request with no status flag set
    pub const DEFAULT_LIST: [StatusCode; 2] = [StatusCode::Deployed, StatusCode::Failed];
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unknown => "UNKNOWN",
            Self::Deployed => "DEPLOYED",
            Self::Deleted => "DELETED",
            Self::Deleting => "DELETING",
            Self::Failed => "FAILED",
            Self::Superseded => "SUPERSEDED",
        };
        write!(f, "{}", s)
    }
}

/// Sort key for release listings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortBy {
    #[default]
    Name,
    LastReleased,
}

/// Sort direction for release listings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_serialization() {
        assert_eq!(serde_json::to_string(&StatusCode::Superseded).unwrap(), "\"SUPERSEDED\"");
        let parsed: StatusCode = serde_json::from_str("\"DELETING\"").unwrap();
        assert_eq!(parsed, StatusCode::Deleting);
        assert_eq!(StatusCode::Deployed.to_string(), "DEPLOYED");
    }

    #[test]
    fn test_sort_serialization() {
        assert_eq!(serde_json::to_string(&SortBy::LastReleased).unwrap(), "\"LAST_RELEASED\"");
        assert_eq!(serde_json::to_string(&SortOrder::Desc).unwrap(), "\"DESC\"");
    }
}
