//! Repository file management
//!
//! `repositories.yaml` lists the configured chart repositories and where
//! each one's index is cached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RepoError, Result};
use crate::home::RepoHome;

/// Contents of `repositories.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFile {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "Utc::now")]
    pub generated: DateTime<Utc>,

    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for RepositoryFile {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            generated: Utc::now(),
            repositories: Vec::new(),
        }
    }
}

impl RepositoryFile {
    /// Load a repository file from a specific path
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RepoError::RepositoryFileMissing {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| RepoError::InvalidConfig {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Save to a specific path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Get a repository by name
    pub fn get(&self, name: &str) -> Option<&RepositoryEntry> {
        self.repositories.iter().find(|r| r.name == name)
    }

    /// Add or replace a repository entry
    pub fn update(&mut self, entry: RepositoryEntry) {
        match self.repositories.iter_mut().find(|r| r.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.repositories.push(entry),
        }
    }
}

/// A configured chart repository
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryEntry {
    pub name: String,
    /// Cached index file, relative to the cache directory or absolute
    pub cache: String,
    pub url: String,
    pub cert_file: String,
    pub key_file: String,
    pub ca_file: String,
}

impl RepositoryEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            cache: format!("{}-index.yaml", name),
            name,
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Every configured repository; an empty store is an error
pub fn list_repositories(home: &RepoHome) -> Result<RepositoryFile> {
    tracing::info!("listing chart repositories");
    let file = RepositoryFile::load(&home.repository_file())?;
    if file.repositories.is_empty() {
        return Err(RepoError::NoRepositories);
    }
    Ok(file)
}
