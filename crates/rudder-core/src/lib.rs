//! Rudder Core - chart model and request types for the release API
//!
//! This crate provides the foundational types used throughout Rudder:
//! - `Chart`: a chart package loaded from a directory or `.tgz` archive
//! - `Requirements`: declared sub-chart dependencies and their validation
//! - Request models with their default-value policy
//! - `StatusCode`: release status as reported by the backend

pub mod archive;
pub mod chart;
pub mod dependency;
pub mod error;
pub mod release;
pub mod request;

pub use chart::{Chart, ChartFile, ChartMetadata, Maintainer};
pub use dependency::{Dependency, Requirements, check_dependencies, validate_chart};
pub use error::{CoreError, Result};
pub use release::{SortBy, SortOrder, StatusCode};
pub use request::{
    DEFAULT_LIST_LIMIT, DEFAULT_NAMESPACE, DEFAULT_TIMEOUT, DeleteReleaseRequest,
    GetReleaseRequest, InstallReleaseRequest, ListChartRequest, ListReleaseRequest,
    UpdateReleaseRequest, default_keyring_path,
};
