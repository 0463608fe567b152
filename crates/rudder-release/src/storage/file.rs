//! File-based storage driver
//!
//! Layout: `<base>/<namespace>/<name>/v<N>.json`

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::StorageDriver;
use crate::error::{BackendError, BackendResult};
use crate::release::Release;

/// File-based storage driver
#[derive(Debug, Clone)]
pub struct FileDriver {
    base_dir: PathBuf,
}

impl FileDriver {
    /// Create a new file driver, creating the base directory if needed
    pub fn new(base_dir: impl Into<PathBuf>) -> BackendResult<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn release_path(&self, release: &Release) -> BackendResult<PathBuf> {
        check_segment(&release.namespace)?;
        check_segment(&release.name)?;
        Ok(self
            .base_dir
            .join(&release.namespace)
            .join(&release.name)
            .join(format!("v{}.json", release.version)))
    }

    fn namespace_dirs(&self) -> BackendResult<Vec<PathBuf>> {
        subdirs(&self.base_dir)
    }

    /// Every `<namespace>/<name>` directory holding revisions of `name`
    fn release_dirs(&self, name: &str) -> BackendResult<Vec<PathBuf>> {
        check_segment(name)?;
        Ok(self
            .namespace_dirs()?
            .into_iter()
            .map(|ns| ns.join(name))
            .filter(|p| p.is_dir())
            .collect())
    }

    fn write_release(&self, path: &Path, release: &Release) -> BackendResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(release)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn read_dir_releases(&self, dir: &Path) -> BackendResult<Vec<Release>> {
        let mut releases = Vec::new();
        for path in json_files(dir)? {
            match read_release(&path) {
                Ok(release) => releases.push(release),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable release record"),
            }
        }
        Ok(releases)
    }

    fn remove_if_empty(dir: &Path) {
        let empty = std::fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if empty {
            let _ = std::fs::remove_dir(dir);
        }
    }
}

/// Names and namespaces become single path components under the base directory
fn check_segment(segment: &str) -> BackendResult<()> {
    let mut components = Path::new(segment).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    );
    if !single || segment.contains(['/', '\\']) {
        return Err(BackendError::InvalidRequest(format!(
            "{:?} is not a valid storage key",
            segment
        )));
    }
    Ok(())
}

fn subdirs(dir: &Path) -> BackendResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    Ok(std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect())
}

fn json_files(dir: &Path) -> BackendResult<Vec<PathBuf>> {
    Ok(std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
        .collect())
}

fn read_release(path: &Path) -> BackendResult<Release> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

#[async_trait]
impl StorageDriver for FileDriver {
    async fn get(&self, name: &str, version: u32) -> BackendResult<Release> {
        for dir in self.release_dirs(name)? {
            let path = dir.join(format!("v{}.json", version));
            if path.exists() {
                return read_release(&path);
            }
        }

        Err(BackendError::RevisionNotFound {
            name: name.to_string(),
            revision: version,
        })
    }

    async fn list(&self) -> BackendResult<Vec<Release>> {
        let mut releases = Vec::new();
        for ns in self.namespace_dirs()? {
            for dir in subdirs(&ns)? {
                releases.extend(self.read_dir_releases(&dir)?);
            }
        }
        Ok(releases)
    }

    async fn history(&self, name: &str) -> BackendResult<Vec<Release>> {
        let mut releases = Vec::new();
        for dir in self.release_dirs(name)? {
            releases.extend(self.read_dir_releases(&dir)?);
        }

        if releases.is_empty() {
            return Err(BackendError::not_found(name));
        }

        // Newest first
        releases.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(releases)
    }

    async fn create(&self, release: &Release) -> BackendResult<()> {
        let path = self.release_path(release)?;
        if path.exists() {
            return Err(BackendError::Storage(format!(
                "revision {} of release {} already stored",
                release.version, release.name
            )));
        }
        self.write_release(&path, release)
    }

    async fn update(&self, release: &Release) -> BackendResult<()> {
        // A revision may have been stored under another namespace before a replace
        for dir in self.release_dirs(&release.name)? {
            let path = dir.join(format!("v{}.json", release.version));
            if path.exists() {
                return self.write_release(&path, release);
            }
        }
        self.write_release(&self.release_path(release)?, release)
    }

    async fn delete_all(&self, name: &str) -> BackendResult<Vec<Release>> {
        let releases = self.history(name).await?;

        for dir in self.release_dirs(name)? {
            std::fs::remove_dir_all(&dir)?;
            if let Some(ns) = dir.parent() {
                Self::remove_if_empty(ns);
            }
        }

        Ok(releases)
    }
}
