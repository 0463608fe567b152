//! Rudder Release - release lifecycle over a pluggable backend
//!
//! This crate provides:
//! - **Backend capability**: [`ReleaseBackend`], the narrow interface to the
//!   service of record, with typed [`BackendError`]s
//! - **Lifecycle**: [`ReleaseLifecycleManager`] for install, upgrade (with
//!   upgrade-or-install), rollback and delete
//! - **Queries**: [`ReleaseQueryService`] for listing and inspecting releases
//! - **Error normalization**: [`normalize`] strips transport wrapping from
//!   backend failures
//! - **Local backend**: [`LocalBackend`] over file or in-memory storage drivers

pub mod actions;
pub mod backend;
pub mod error;
pub mod manager;
pub mod query;
pub mod release;
pub mod storage;
pub mod values;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::{DeleteOptions, InstallOptions, ListOptions, RollbackOptions, UpdateOptions};
pub use backend::{LocalBackend, ReleaseBackend};
pub use error::{
    BackendError, BackendErrorKind, BackendResult, ErrorKind, ReleaseError, Result, normalize,
};
pub use manager::ReleaseLifecycleManager;
pub use query::ReleaseQueryService;
pub use release::{
    GetHistoryResponse, GetReleaseContentResponse, GetReleaseResponse, GetReleaseStatusResponse,
    Info, ListReleasesResponse, Release, ReleaseResponse, UninstallReleaseResponse,
};
pub use storage::{FileDriver, MemoryDriver, StorageDriver};
