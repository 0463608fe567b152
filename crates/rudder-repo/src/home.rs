//! Repository home directory layout
//!
//! ```text
//! <home>/repository/repositories.yaml
//! <home>/repository/cache/<repo>-index.yaml
//! <home>/repository/<chart>              local chart cache
//! ```

use std::path::{Path, PathBuf};

use crate::config::RepositoryEntry;

/// Environment variable overriding the default home
pub const HOME_ENV_VAR: &str = "HELM_HOME";

/// Root of the chart repository store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHome(PathBuf);

impl RepoHome {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }

    /// `$HELM_HOME`, falling back to `~/.helm`
    pub fn from_env() -> Self {
        match std::env::var(HOME_ENV_VAR) {
            Ok(home) if !home.is_empty() => Self::new(home),
            _ => Self::new(Self::default_path()),
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".helm")
    }

    pub fn root(&self) -> &Path {
        &self.0
    }

    pub fn repository(&self) -> PathBuf {
        self.0.join("repository")
    }

    pub fn repository_file(&self) -> PathBuf {
        self.repository().join("repositories.yaml")
    }

    pub fn cache(&self) -> PathBuf {
        self.repository().join("cache")
    }

    /// Cached index file of one repository
    pub fn cache_index(&self, repo: &str) -> PathBuf {
        self.cache().join(format!("{}-index.yaml", repo))
    }

    /// Index file recorded for a repository entry
    ///
    /// Relative `cache` values live in the cache directory; an empty value
    /// falls back to [`RepoHome::cache_index`].
    pub fn index_for(&self, entry: &RepositoryEntry) -> PathBuf {
        if entry.cache.is_empty() {
            return self.cache_index(&entry.name);
        }
        let cache = Path::new(&entry.cache);
        if cache.is_absolute() {
            cache.to_path_buf()
        } else {
            self.cache().join(cache)
        }
    }
}
