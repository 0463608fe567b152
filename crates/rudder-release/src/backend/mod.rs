//! Release backend capability
//!
//! The lifecycle manager and query service only talk to the service of
//! record through [`ReleaseBackend`]. [`LocalBackend`] is the storage-backed
//! implementation shipped with the server; tests substitute their own.

mod local;

pub use local::LocalBackend;

use async_trait::async_trait;
use rudder_core::Chart;

use crate::actions::{DeleteOptions, InstallOptions, ListOptions, RollbackOptions, UpdateOptions};
use crate::error::BackendResult;
use crate::release::{
    GetHistoryResponse, GetReleaseContentResponse, GetReleaseStatusResponse, ListReleasesResponse,
    ReleaseResponse, UninstallReleaseResponse,
};

/// Operations offered by the release backend
#[async_trait]
pub trait ReleaseBackend: Send + Sync {
    async fn list_releases(&self, opts: ListOptions) -> BackendResult<ListReleasesResponse>;

    /// Up to `max` revisions, newest first; zero returns every revision
    async fn release_history(&self, name: &str, max: u32) -> BackendResult<GetHistoryResponse>;

    /// Status at `version`; zero selects the latest revision
    async fn release_status(
        &self,
        name: &str,
        version: u32,
    ) -> BackendResult<GetReleaseStatusResponse>;

    /// Full revision at `version`; zero selects the latest revision
    async fn release_content(
        &self,
        name: &str,
        version: u32,
    ) -> BackendResult<GetReleaseContentResponse>;

    async fn install_release_from_chart(
        &self,
        chart: &Chart,
        opts: InstallOptions,
    ) -> BackendResult<ReleaseResponse>;

    async fn update_release(
        &self,
        name: &str,
        chart: &Chart,
        opts: UpdateOptions,
    ) -> BackendResult<ReleaseResponse>;

    async fn rollback_release(
        &self,
        name: &str,
        opts: RollbackOptions,
    ) -> BackendResult<ReleaseResponse>;

    async fn delete_release(
        &self,
        name: &str,
        opts: DeleteOptions,
    ) -> BackendResult<UninstallReleaseResponse>;
}
