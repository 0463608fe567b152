//! In-memory storage driver
//!
//! Releases live only as long as the driver. Clones share the same store.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::StorageDriver;
use crate::error::{BackendError, BackendResult};
use crate::release::Release;

/// In-memory storage driver
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    /// name -> version -> release
    store: Arc<RwLock<HashMap<String, BTreeMap<u32, Release>>>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated releases
    pub fn with_releases(releases: Vec<Release>) -> Self {
        let mut store: HashMap<String, BTreeMap<u32, Release>> = HashMap::new();
        for release in releases {
            store
                .entry(release.name.clone())
                .or_default()
                .insert(release.version, release);
        }
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Number of stored revisions across all releases
    pub async fn len(&self) -> usize {
        self.store.read().await.values().map(|v| v.len()).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl StorageDriver for MemoryDriver {
    async fn get(&self, name: &str, version: u32) -> BackendResult<Release> {
        let store = self.store.read().await;
        store
            .get(name)
            .and_then(|versions| versions.get(&version))
            .cloned()
            .ok_or_else(|| BackendError::RevisionNotFound {
                name: name.to_string(),
                revision: version,
            })
    }

    async fn list(&self) -> BackendResult<Vec<Release>> {
        let store = self.store.read().await;
        Ok(store.values().flat_map(|v| v.values()).cloned().collect())
    }

    async fn history(&self, name: &str) -> BackendResult<Vec<Release>> {
        let store = self.store.read().await;
        match store.get(name) {
            Some(versions) if !versions.is_empty() => Ok(versions.values().rev().cloned().collect()),
            _ => Err(BackendError::not_found(name)),
        }
    }

    async fn create(&self, release: &Release) -> BackendResult<()> {
        let mut store = self.store.write().await;
        let versions = store.entry(release.name.clone()).or_default();
        if versions.contains_key(&release.version) {
            return Err(BackendError::Storage(format!(
                "revision {} of release {} already stored",
                release.version, release.name
            )));
        }
        versions.insert(release.version, release.clone());
        Ok(())
    }

    async fn update(&self, release: &Release) -> BackendResult<()> {
        let mut store = self.store.write().await;
        store
            .entry(release.name.clone())
            .or_default()
            .insert(release.version, release.clone());
        Ok(())
    }

    async fn delete_all(&self, name: &str) -> BackendResult<Vec<Release>> {
        let mut store = self.store.write().await;
        match store.remove(name) {
            Some(versions) if !versions.is_empty() => Ok(versions.into_values().rev().collect()),
            _ => Err(BackendError::not_found(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::tests::release;
    use rudder_core::StatusCode;

    #[tokio::test]
    async fn test_memory_driver_roundtrip() {
        let driver = MemoryDriver::new();
        driver.create(&release("web", 1, StatusCode::Superseded)).await.unwrap();
        driver.create(&release("web", 2, StatusCode::Deployed)).await.unwrap();

        let history = driver.history("web").await.unwrap();
        assert_eq!(history.iter().map(|r| r.version).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(driver.get_latest("web").await.unwrap().version, 2);
        assert_eq!(driver.len().await, 2);
    }

    #[tokio::test]
    async fn test_memory_driver_clones_share_state() {
        let driver = MemoryDriver::new();
        let clone = driver.clone();
        clone.create(&release("web", 1, StatusCode::Deployed)).await.unwrap();
        assert!(driver.exists("web").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_driver_delete_all() {
        let driver = MemoryDriver::with_releases(vec![
            release("web", 1, StatusCode::Superseded),
            release("web", 2, StatusCode::Deployed),
            release("db", 1, StatusCode::Deployed),
        ]);

        let removed = driver.delete_all("web").await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(matches!(
            driver.delete_all("web").await,
            Err(BackendError::ReleaseNotFound { .. })
        ));
        assert_eq!(driver.list().await.unwrap().len(), 1);
    }
}
