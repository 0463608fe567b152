//! Repository index types
//!
//! Helm-compatible `index.yaml`: chart name to every published version.

use chrono::{DateTime, Utc};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{RepoError, Result};

/// Repository index (Helm-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "Utc::now")]
    pub generated: DateTime<Utc>,

    /// Chart versions indexed by chart name
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartVersion>>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for IndexFile {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            generated: Utc::now(),
            entries: BTreeMap::new(),
        }
    }
}

impl IndexFile {
    /// Parse an index and sort its entries newest first
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let mut index: Self = serde_yaml::from_str(yaml)?;
        index.sort_entries();
        Ok(index)
    }

    /// Load a cached index file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RepoError::InvalidIndex {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&content).map_err(|e| RepoError::InvalidIndex {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Sort every entry list by version, newest first
    ///
    /// Versions that are not valid semver sort after all valid ones.
    pub fn sort_entries(&mut self) {
        for versions in self.entries.values_mut() {
            versions.sort_by(|a, b| compare_versions(b, a));
        }
    }

    /// Find a chart version
    ///
    /// An empty `version` selects the newest version. Otherwise an exact
    /// version string wins, then the newest version matching `version` as a
    /// semver constraint.
    pub fn get(&self, name: &str, version: &str) -> Option<&ChartVersion> {
        let versions = self.entries.get(name)?;

        if version.is_empty() {
            return versions
                .iter()
                .find(|v| Version::parse(&v.version).is_ok())
                .or_else(|| versions.first());
        }

        if let Some(exact) = versions.iter().find(|v| v.version == version) {
            return Some(exact);
        }

        let req = VersionReq::parse(version).ok()?;
        versions.iter().find(|v| {
            Version::parse(&v.version)
                .map(|parsed| req.matches(&parsed))
                .unwrap_or(false)
        })
    }

    /// Add a chart version, keeping entries sorted
    pub fn add(&mut self, version: ChartVersion) {
        let list = self.entries.entry(version.name.clone()).or_default();
        list.push(version);
        list.sort_by(|a, b| compare_versions(b, a));
    }
}

fn compare_versions(a: &ChartVersion, b: &ChartVersion) -> Ordering {
    match (Version::parse(&a.version), Version::parse(&b.version)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.version.cmp(&b.version),
    }
}

/// One published version of a chart
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartVersion {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub deprecated: bool,
    /// Download locations, absolute or relative to the repository URL
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ChartVersion {
    /// `name-version`, the conventional archive base name
    pub fn archive_name(&self) -> String {
        format!("{}-{}.tgz", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: 1.0.0
      description: Web server
      urls:
        - nginx-1.0.0.tgz
    - name: nginx
      version: 1.2.0
      description: Web server
      keywords: [http, proxy]
      urls:
        - https://example.com/charts/nginx-1.2.0.tgz
    - name: nginx
      version: 1.1.0
      urls:
        - nginx-1.1.0.tgz
  mysql:
    - name: mysql
      version: 0.3.0
      description: Relational database
      urls:
        - mysql-0.3.0.tgz
generated: 2018-01-10T10:00:00Z
"#;

    #[test]
    fn test_entries_sorted_newest_first() {
        let index = IndexFile::from_yaml(INDEX).unwrap();
        let versions: Vec<_> = index.entries["nginx"].iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions, vec!["1.2.0", "1.1.0", "1.0.0"]);
    }

    #[test]
    fn test_get_latest_and_specific() {
        let index = IndexFile::from_yaml(INDEX).unwrap();
        assert_eq!(index.get("nginx", "").unwrap().version, "1.2.0");
        assert_eq!(index.get("nginx", "1.0.0").unwrap().version, "1.0.0");
        assert_eq!(index.get("nginx", "~1.1").unwrap().version, "1.1.0");
        assert!(index.get("nginx", "9.9.9").is_none());
        assert!(index.get("redis", "").is_none());
    }

    #[test]
    fn test_add_keeps_order() {
        let mut index = IndexFile::default();
        for v in ["0.1.0", "0.3.0", "0.2.0"] {
            index.add(ChartVersion {
                name: "demo".to_string(),
                version: v.to_string(),
                ..Default::default()
            });
        }
        assert_eq!(index.get("demo", "").unwrap().version, "0.3.0");
        assert_eq!(index.entries["demo"].last().unwrap().version, "0.1.0");
    }

    #[test]
    fn test_load_invalid_index() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("broken-index.yaml");
        std::fs::write(&path, "entries: [not, a, map").unwrap();
        assert!(matches!(IndexFile::load(&path), Err(RepoError::InvalidIndex { .. })));
    }
}
