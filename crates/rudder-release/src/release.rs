//! Stored release revisions and the response snapshots built from them

use chrono::{DateTime, Utc};
use rudder_core::{ChartMetadata, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One revision of a release, as recorded by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub name: String,

    pub namespace: String,

    /// Revision number, starting at 1
    pub version: u32,

    pub info: Info,

    /// Metadata of the chart this revision was built from
    pub chart: ChartMetadata,

    /// Chart default values as of this revision
    #[serde(default)]
    pub chart_values: Value,

    /// Caller-supplied value overrides
    #[serde(default)]
    pub config: Value,
}

/// Status and timestamps of a revision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub status: StatusCode,

    pub first_deployed: DateTime<Utc>,

    pub last_deployed: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DateTime<Utc>>,

    #[serde(default)]
    pub description: String,
}

impl Release {
    /// First revision of a new release
    pub fn for_install(
        name: String,
        namespace: String,
        chart: ChartMetadata,
        chart_values: Value,
        config: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            name,
            namespace,
            version: 1,
            info: Info {
                status: StatusCode::Unknown,
                first_deployed: now,
                last_deployed: now,
                deleted: None,
                description: "Initial install underway".to_string(),
            },
            chart,
            chart_values,
            config,
        }
    }

    /// Next revision after `previous`, keeping its name, namespace and first deployment time
    pub fn for_upgrade(
        previous: &Release,
        chart: ChartMetadata,
        chart_values: Value,
        config: Value,
    ) -> Self {
        Self {
            name: previous.name.clone(),
            namespace: previous.namespace.clone(),
            version: previous.version + 1,
            info: Info {
                status: StatusCode::Unknown,
                first_deployed: previous.info.first_deployed,
                last_deployed: Utc::now(),
                deleted: None,
                description: "Preparing upgrade".to_string(),
            },
            chart,
            chart_values,
            config,
        }
    }

    /// Effective values: chart defaults overlaid with the overrides
    pub fn values(&self) -> Value {
        let mut values = self.chart_values.clone();
        crate::values::merge(&mut values, &self.config);
        values
    }

    pub fn mark_deployed(&mut self, description: impl Into<String>) {
        self.info.status = StatusCode::Deployed;
        self.info.last_deployed = Utc::now();
        self.info.description = description.into();
    }

    pub fn mark_superseded(&mut self) {
        self.info.status = StatusCode::Superseded;
        self.info.description = "Superseded".to_string();
    }

    pub fn mark_deleted(&mut self) {
        self.info.status = StatusCode::Deleted;
        self.info.deleted = Some(Utc::now());
        self.info.description = "Deletion complete".to_string();
    }
}

/// Response of `ListReleases`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListReleasesResponse {
    /// Number of releases in this page
    pub count: i64,

    /// Name of the first release of the next page, empty on the last page
    pub next: String,

    /// Number of releases matching the query
    pub total: i64,

    pub releases: Vec<Release>,
}

/// Response of `ReleaseStatus`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetReleaseStatusResponse {
    pub name: String,
    pub namespace: String,
    /// Revision the status describes
    pub version: u32,
    pub info: Info,
}

impl From<&Release> for GetReleaseStatusResponse {
    fn from(release: &Release) -> Self {
        Self {
            name: release.name.clone(),
            namespace: release.namespace.clone(),
            version: release.version,
            info: release.info.clone(),
        }
    }
}

/// Response of `ReleaseContent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetReleaseContentResponse {
    pub release: Release,
}

/// Response of `ReleaseHistory`, newest revision first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GetHistoryResponse {
    pub releases: Vec<Release>,
}

/// Response of the mutating backend operations
///
/// `release` is empty when the backend has nothing to report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReleaseResponse {
    pub release: Option<Release>,
}

/// Response of `DeleteRelease`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UninstallReleaseResponse {
    pub release: Option<Release>,

    /// Extra information from the backend
    #[serde(default)]
    pub info: String,
}

/// Aggregate returned by `GetRelease`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetReleaseResponse {
    pub history: GetHistoryResponse,
    pub status: GetReleaseStatusResponse,
    pub content: GetReleaseContentResponse,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use semver::Version;
    use serde_json::json;

    pub(crate) fn metadata(name: &str, version: &str) -> ChartMetadata {
        ChartMetadata {
            name: name.to_string(),
            version: Version::parse(version).unwrap(),
            api_version: None,
            description: None,
            app_version: None,
            home: None,
            icon: None,
            sources: vec![],
            keywords: vec![],
            maintainers: vec![],
            deprecated: false,
        }
    }

    pub(crate) fn release(name: &str, version: u32, status: StatusCode) -> Release {
        let mut release = Release::for_install(
            name.to_string(),
            "default".to_string(),
            metadata("nginx", "1.0.0"),
            json!({}),
            json!({}),
        );
        release.version = version;
        release.info.status = status;
        release
    }

    #[test]
    fn test_for_upgrade_keeps_identity() {
        let mut first = release("web", 1, StatusCode::Deployed);
        first.namespace = "apps".to_string();

        let next = Release::for_upgrade(&first, metadata("nginx", "1.1.0"), json!({}), json!({}));
        assert_eq!(next.name, "web");
        assert_eq!(next.namespace, "apps");
        assert_eq!(next.version, 2);
        assert_eq!(next.info.first_deployed, first.info.first_deployed);
        assert_eq!(next.chart.version.to_string(), "1.1.0");
    }

    #[test]
    fn test_values_overlay_config() {
        let mut r = release("web", 1, StatusCode::Deployed);
        r.chart_values = json!({"image": {"tag": "1.0", "pull": "always"}, "replicas": 1});
        r.config = json!({"image": {"tag": "2.0"}});

        assert_eq!(
            r.values(),
            json!({"image": {"tag": "2.0", "pull": "always"}, "replicas": 1})
        );
    }

    #[test]
    fn test_status_transitions() {
        let mut r = release("web", 1, StatusCode::Unknown);
        r.mark_deployed("Install complete");
        assert_eq!(r.info.status, StatusCode::Deployed);

        r.mark_superseded();
        assert_eq!(r.info.status, StatusCode::Superseded);

        r.mark_deleted();
        assert_eq!(r.info.status, StatusCode::Deleted);
        assert!(r.info.deleted.is_some());
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(release("web", 3, StatusCode::Deployed)).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["info"]["status"], "DEPLOYED");
        assert!(json["info"].get("firstDeployed").is_some());
        assert!(json.get("chartValues").is_some());
    }
}
