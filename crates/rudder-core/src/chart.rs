//! Chart definition and loading

use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::archive;
use crate::dependency::Requirements;
use crate::error::{CoreError, Result};

/// Chart metadata, as declared in `Chart.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// Chart name (required)
    pub name: String,

    /// Chart version (required, SemVer)
    #[serde(with = "version_serde")]
    pub version: Version,

    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub app_version: Option<String>,

    #[serde(default)]
    pub home: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub maintainers: Vec<Maintainer>,

    #[serde(default)]
    pub deprecated: bool,
}

/// Maintainer information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Maintainer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A file carried by a chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartFile {
    /// Path relative to the chart root
    pub name: String,
    pub data: Vec<u8>,
}

/// A loaded chart, with its bundled sub-charts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    pub metadata: ChartMetadata,

    /// Raw `values.yaml` content (empty if the chart has none)
    #[serde(default)]
    pub values: String,

    /// Files under `templates/`
    #[serde(default)]
    pub templates: Vec<ChartFile>,

    /// Every other file except `Chart.yaml`, `values.yaml` and `charts/`
    #[serde(default)]
    pub files: Vec<ChartFile>,

    /// Sub-charts bundled under `charts/`
    #[serde(default)]
    pub dependencies: Vec<Chart>,
}

const CHART_FILE: &str = "Chart.yaml";
const VALUES_FILE: &str = "values.yaml";
const REQUIREMENTS_FILE: &str = "requirements.yaml";

impl Chart {
    /// Load a chart from a directory or a `.tgz` archive
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(CoreError::ChartNotFound {
                path: path.display().to_string(),
            });
        }

        if path.is_dir() {
            Self::from_files(archive::read_directory(path)?)
        } else {
            Self::from_archive(&std::fs::read(path)?)
        }
    }

    /// Load a chart from the bytes of a `.tgz` archive
    pub fn from_archive(data: &[u8]) -> Result<Self> {
        Self::from_files(archive::read_archive(data)?)
    }

    /// Build a chart from a map of relative path to content
    pub fn from_files(files: BTreeMap<String, Vec<u8>>) -> Result<Self> {
        let chart_yaml = files
            .get(CHART_FILE)
            .ok_or_else(|| CoreError::invalid("Chart.yaml file is missing"))?;
        let metadata: ChartMetadata = serde_yaml::from_slice(chart_yaml)?;

        if metadata.name.trim().is_empty() {
            return Err(CoreError::invalid("chart metadata (Chart.yaml) is missing a name"));
        }

        let mut chart = Chart {
            metadata,
            values: String::new(),
            templates: Vec::new(),
            files: Vec::new(),
            dependencies: Vec::new(),
        };

        // charts/<name>/... directories, grouped per sub-chart
        let mut unpacked: BTreeMap<String, BTreeMap<String, Vec<u8>>> = BTreeMap::new();

        for (name, data) in files {
            if name == CHART_FILE {
                continue;
            }

            if name == VALUES_FILE {
                chart.values = String::from_utf8(data)
                    .map_err(|e| CoreError::invalid(format!("values.yaml is not UTF-8: {}", e)))?;
                continue;
            }

            if let Some(rest) = name.strip_prefix("charts/").map(str::to_string) {
                if let Some((sub, inner)) = rest.split_once('/') {
                    unpacked
                        .entry(sub.to_string())
                        .or_default()
                        .insert(inner.to_string(), data);
                } else if archive::is_archive(Path::new(&rest)) {
                    let sub = Chart::from_archive(&data).map_err(|e| {
                        CoreError::invalid(format!(
                            "error unpacking {} in {}: {}",
                            rest, chart.metadata.name, e
                        ))
                    })?;
                    chart.dependencies.push(sub);
                } else {
                    chart.files.push(ChartFile { name, data });
                }
                continue;
            }

            if name.starts_with("templates/") {
                chart.templates.push(ChartFile { name, data });
            } else {
                chart.files.push(ChartFile { name, data });
            }
        }

        for (sub, sub_files) in unpacked {
            // Stray files under charts/<dir>/ without a Chart.yaml are not sub-charts
            if !sub_files.contains_key(CHART_FILE) {
                continue;
            }
            let loaded = Chart::from_files(sub_files).map_err(|e| {
                CoreError::invalid(format!("error loading sub-chart {}: {}", sub, e))
            })?;
            chart.dependencies.push(loaded);
        }

        Ok(chart)
    }

    /// Chart name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Look up a non-template file by relative path
    pub fn file(&self, name: &str) -> Option<&ChartFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Parse `requirements.yaml`, if the chart declares one
    pub fn requirements(&self) -> Result<Option<Requirements>> {
        let Some(file) = self.file(REQUIREMENTS_FILE) else {
            return Ok(None);
        };
        let requirements: Requirements = serde_yaml::from_slice(&file.data)
            .map_err(|e| CoreError::invalid(format!("requirements.yaml is invalid: {}", e)))?;
        Ok(Some(requirements))
    }

    /// Parsed default values
    pub fn default_values(&self) -> Result<serde_yaml::Value> {
        if self.values.trim().is_empty() {
            return Ok(serde_yaml::Value::Mapping(Default::default()));
        }
        Ok(serde_yaml::from_str(&self.values)?)
    }
}

/// Custom serde for semver::Version
mod version_serde {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(version: &Version, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&version.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Version, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Chart.yaml versions are frequently unquoted (`version: 1.0`)
        let raw = serde_yaml::Value::deserialize(deserializer)?;
        let s = match raw {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "invalid chart version: {:?}",
                    other
                )));
            }
        };
        Version::parse(s.trim_start_matches('v')).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_metadata_deserialize() {
        let yaml = r#"
apiVersion: v1
name: myapp
version: 1.2.3
description: My application
keywords: [web, demo]
"#;
        let metadata: ChartMetadata = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(metadata.name, "myapp");
        assert_eq!(metadata.version, Version::new(1, 2, 3));
        assert_eq!(metadata.keywords, vec!["web", "demo"]);
        assert!(!metadata.deprecated);
    }

    #[test]
    fn test_load_directory_with_subcharts() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "Chart.yaml", "name: app\nversion: 0.1.0\n");
        write(root, "values.yaml", "replicas: 2\n");
        write(root, "templates/deploy.yaml", "kind: Deployment\n");
        write(root, "requirements.yaml", "dependencies:\n  - name: redis\n    version: 1.x\n");
        write(root, "charts/redis/Chart.yaml", "name: redis\nversion: 1.0.0\n");
        write(root, "charts/redis/templates/svc.yaml", "kind: Service\n");

        let chart = Chart::load(root).unwrap();
        assert_eq!(chart.name(), "app");
        assert_eq!(chart.values, "replicas: 2\n");
        assert_eq!(chart.templates.len(), 1);
        assert_eq!(chart.dependencies.len(), 1);
        assert_eq!(chart.dependencies[0].name(), "redis");
        assert!(chart.file("requirements.yaml").is_some());

        let reqs = chart.requirements().unwrap().unwrap();
        assert_eq!(reqs.dependencies[0].name, "redis");
    }

    #[test]
    fn test_load_archive_with_nested_archive() {
        let temp = TempDir::new().unwrap();

        let sub = temp.path().join("src/db");
        write(&sub, "Chart.yaml", "name: db\nversion: 2.0.0\n");
        let sub_archive = archive::create_archive(&sub, temp.path()).unwrap();

        let parent = temp.path().join("src/web");
        write(&parent, "Chart.yaml", "name: web\nversion: 1.0.0\n");
        std::fs::create_dir_all(parent.join("charts")).unwrap();
        std::fs::copy(&sub_archive, parent.join("charts/db-2.0.0.tgz")).unwrap();

        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let archive_path = archive::create_archive(&parent, &out).unwrap();

        let chart = Chart::load(&archive_path).unwrap();
        assert_eq!(chart.name(), "web");
        assert_eq!(chart.dependencies.len(), 1);
        assert_eq!(chart.dependencies[0].metadata.version, Version::new(2, 0, 0));
    }

    #[test]
    fn test_load_missing_path() {
        let err = Chart::load("/definitely/not/here").unwrap_err();
        assert!(matches!(err, CoreError::ChartNotFound { .. }));
    }

    #[test]
    fn test_load_without_chart_yaml() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "values.yaml", "a: 1\n");
        let err = Chart::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("Chart.yaml"));
    }

    #[test]
    fn test_absent_requirements() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Chart.yaml", "name: solo\nversion: 1.0.0\n");
        let chart = Chart::load(temp.path()).unwrap();
        assert!(chart.requirements().unwrap().is_none());
    }

    #[test]
    fn test_malformed_requirements() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Chart.yaml", "name: solo\nversion: 1.0.0\n");
        write(temp.path(), "requirements.yaml", "dependencies: {broken");
        let chart = Chart::load(temp.path()).unwrap();
        assert!(matches!(chart.requirements(), Err(CoreError::InvalidChart { .. })));
    }

    #[test]
    fn test_unquoted_short_version() {
        let metadata: ChartMetadata =
            serde_yaml::from_str("name: x\nversion: v3.1.0\n").unwrap();
        assert_eq!(metadata.version, Version::new(3, 1, 0));
    }

    #[test]
    fn test_default_values() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Chart.yaml", "name: v\nversion: 1.0.0\n");
        write(temp.path(), "values.yaml", "image:\n  tag: latest\n");
        let chart = Chart::load(temp.path()).unwrap();
        let values = chart.default_values().unwrap();
        assert_eq!(values["image"]["tag"].as_str(), Some("latest"));
    }
}
