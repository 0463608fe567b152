//! Storage drivers for persisting release revisions
//!
//! - **File**: one JSON document per revision on local disk
//! - **Memory**: in-process, for tests and ephemeral servers
//!
//! Release names are unique across namespaces, so drivers address releases
//! by name alone.

mod file;
mod memory;

pub use file::FileDriver;
pub use memory::MemoryDriver;

use async_trait::async_trait;

use crate::error::{BackendError, BackendResult};
use crate::release::Release;

/// Storage driver trait for release persistence
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Get a specific revision of a release
    async fn get(&self, name: &str, version: u32) -> BackendResult<Release>;

    /// Every revision of every release, in no particular order
    async fn list(&self) -> BackendResult<Vec<Release>>;

    /// All revisions of a release, newest first
    ///
    /// Fails with `ReleaseNotFound` when the release has no revisions.
    async fn history(&self, name: &str) -> BackendResult<Vec<Release>>;

    /// Store a new revision
    async fn create(&self, release: &Release) -> BackendResult<()>;

    /// Overwrite an existing revision
    async fn update(&self, release: &Release) -> BackendResult<()>;

    /// Delete every revision of a release
    async fn delete_all(&self, name: &str) -> BackendResult<Vec<Release>>;

    /// Get the latest revision of a release
    async fn get_latest(&self, name: &str) -> BackendResult<Release> {
        self.history(name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::not_found(name))
    }

    /// Check if a release exists
    async fn exists(&self, name: &str) -> BackendResult<bool> {
        match self.get_latest(name).await {
            Ok(_) => Ok(true),
            Err(BackendError::ReleaseNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
