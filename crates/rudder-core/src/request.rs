//! Inbound operation requests and their default-value policy
//!
//! Every request type has an idempotent `apply_defaults`: fields the caller
//! left unset are filled in, fields already set are left untouched.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::release::{SortBy, SortOrder, StatusCode};

/// Namespace used when a request does not name one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Backend operation timeout in seconds when a request leaves it at zero
pub const DEFAULT_TIMEOUT: i64 = 300;

/// Page size for release listings and maximum history depth
pub const DEFAULT_LIST_LIMIT: i32 = 256;

/// Default public key used to verify chart signatures (`~/.rudder/rudder.pub`)
pub fn default_keyring_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rudder")
        .join("rudder.pub")
}

fn default_keyring() -> String {
    default_keyring_path().to_string_lossy().into_owned()
}

/// Body of `POST /api/v1/release`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallReleaseRequest {
    pub name: String,
    pub namespace: String,
    /// Chart reference: local path, `repo/chart`, or URL
    #[serde(rename = "chartPath")]
    pub chart: String,
    pub dry_run: bool,
    pub disable_hooks: bool,
    /// Allow reusing the name of a deleted or failed release
    pub replace: bool,
    pub name_template: String,
    pub verify: bool,
    pub keyring: String,
    pub version: String,
    pub timeout: i64,
    pub wait: bool,
    /// Raw YAML value overrides
    pub values: String,
}

impl InstallReleaseRequest {
    pub fn apply_defaults(&mut self) {
        if self.namespace.is_empty() {
            self.namespace = DEFAULT_NAMESPACE.to_string();
        }
        if self.keyring.is_empty() {
            self.keyring = default_keyring();
        }
        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT;
        }
    }
}

/// Body of `PATCH /api/v1/release/{name}`, covering both upgrade and rollback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateReleaseRequest {
    pub rollback: bool,
    /// Rollback target; zero selects the revision before the latest
    pub revision: i32,
    pub release: String,
    pub chart: String,
    pub dry_run: bool,
    pub recreate: bool,
    pub disable_hooks: bool,
    pub verify: bool,
    pub keyring: String,
    /// Install the release if it does not exist yet
    pub install: bool,
    pub namespace: String,
    pub version: String,
    pub timeout: i64,
    pub reset_values: bool,
    pub reuse_values: bool,
    pub wait: bool,
    pub values: String,
}

impl UpdateReleaseRequest {
    /// Defaults for the upgrade path
    pub fn apply_upgrade_defaults(&mut self) {
        if self.keyring.is_empty() {
            self.keyring = default_keyring();
        }
        if self.namespace.is_empty() {
            self.namespace = DEFAULT_NAMESPACE.to_string();
        }
        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT;
        }
    }

    /// Defaults for the rollback path
    pub fn apply_rollback_defaults(&mut self) {
        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT;
        }
    }

    /// Equivalent install request used when upgrading a release that does
    /// not exist yet
    pub fn to_install_request(&self) -> InstallReleaseRequest {
        InstallReleaseRequest {
            name: self.release.clone(),
            namespace: self.namespace.clone(),
            chart: self.chart.clone(),
            dry_run: self.dry_run,
            disable_hooks: self.disable_hooks,
            replace: false,
            name_template: String::new(),
            verify: self.verify,
            keyring: self.keyring.clone(),
            version: self.version.clone(),
            timeout: self.timeout,
            wait: self.wait,
            values: self.values.clone(),
        }
    }
}

/// Parameters of `DELETE /api/v1/release/{name}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteReleaseRequest {
    pub name: String,
    #[serde(rename = "dry-run", alias = "dryRun")]
    pub dry_run: bool,
    #[serde(rename = "no-hooks", alias = "noHooks")]
    pub no_hooks: bool,
    pub purge: bool,
    pub timeout: i64,
}

/// Parameters of `GET /api/v1/releases`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListReleaseRequest {
    /// Regular expression matched against release names
    pub filter: String,
    pub short: bool,
    pub by_date: bool,
    pub sort_desc: bool,
    pub limit: i32,
    /// Name of the first release of the page
    pub offset: String,
    pub all: bool,
    pub deleted: bool,
    pub deleting: bool,
    pub deployed: bool,
    pub failed: bool,
    pub superseded: bool,
    pub namespace: String,
}

impl ListReleaseRequest {
    pub fn apply_defaults(&mut self) {
        if self.limit == 0 {
            self.limit = DEFAULT_LIST_LIMIT;
        }
        if self.namespace.is_empty() {
            self.namespace = DEFAULT_NAMESPACE.to_string();
        }
    }

    /// Status codes a listing should include
    pub fn status_codes(&self) -> Vec<StatusCode> {
        if self.all {
            return StatusCode::ALL.to_vec();
        }

        let flags = [
            (self.deployed, StatusCode::Deployed),
            (self.deleted, StatusCode::Deleted),
            (self.deleting, StatusCode::Deleting),
            (self.failed, StatusCode::Failed),
            (self.superseded, StatusCode::Superseded),
        ];
        let codes: Vec<_> = flags
            .into_iter()
            .filter_map(|(set, code)| set.then_some(code))
            .collect();

        if codes.is_empty() {
            StatusCode::DEFAULT_LIST.to_vec()
        } else {
            codes
        }
    }

    pub fn sort_by(&self) -> SortBy {
        if self.by_date {
            SortBy::LastReleased
        } else {
            SortBy::Name
        }
    }

    pub fn sort_order(&self) -> SortOrder {
        if self.sort_desc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Parameters of `GET /api/v1/release/{name}` and its sub-resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetReleaseRequest {
    pub name: String,
    /// Revision for status and content; zero means latest
    pub revision: i32,
    /// Maximum history entries
    pub max: i32,
    pub namespace: String,
}

impl GetReleaseRequest {
    pub fn apply_defaults(&mut self) {
        if self.max == 0 {
            self.max = DEFAULT_LIST_LIMIT;
        }
        if self.namespace.is_empty() {
            self.namespace = DEFAULT_NAMESPACE.to_string();
        }
    }
}

/// Parameters of `GET /api/v1/charts`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListChartRequest {
    pub filter: String,
    /// Index every version instead of only the newest
    pub versions: bool,
    /// Treat the filter as a regular expression
    pub regexp: bool,
    pub version: String,
}
