//! Options passed to the release backend for each operation

use rudder_core::{
    DEFAULT_LIST_LIMIT, DeleteReleaseRequest, InstallReleaseRequest, ListReleaseRequest, SortBy,
    SortOrder, StatusCode, UpdateReleaseRequest,
};

/// Options for `ListReleases`
#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    /// Maximum releases per page
    pub limit: i64,

    /// Name of the first release to return
    pub offset: String,

    /// Regular expression matched against release names
    pub filter: String,

    pub sort_by: SortBy,

    pub sort_order: SortOrder,

    pub status_codes: Vec<StatusCode>,

    /// Namespace to list; empty lists every namespace
    pub namespace: String,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT as i64,
            offset: String::new(),
            filter: String::new(),
            sort_by: SortBy::Name,
            sort_order: SortOrder::Asc,
            status_codes: StatusCode::DEFAULT_LIST.to_vec(),
            namespace: String::new(),
        }
    }
}

impl From<&ListReleaseRequest> for ListOptions {
    fn from(req: &ListReleaseRequest) -> Self {
        Self {
            limit: req.limit as i64,
            offset: req.offset.clone(),
            filter: req.filter.clone(),
            sort_by: req.sort_by(),
            sort_order: req.sort_order(),
            status_codes: req.status_codes(),
            namespace: req.namespace.clone(),
        }
    }
}

/// Options for `InstallReleaseFromChart`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallOptions {
    /// Release name; the backend generates one when empty
    pub name: String,

    pub namespace: String,

    /// Raw YAML value overrides
    pub values: String,

    pub dry_run: bool,

    /// Allow reusing the name of a deleted or failed release
    pub reuse_name: bool,

    pub disable_hooks: bool,

    /// Seconds
    pub timeout: i64,

    pub wait: bool,
}

impl InstallOptions {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Set value overrides
    pub fn with_values(mut self, values: impl Into<String>) -> Self {
        self.values = values.into();
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn reuse_name(mut self) -> Self {
        self.reuse_name = true;
        self
    }
}

impl From<&InstallReleaseRequest> for InstallOptions {
    fn from(req: &InstallReleaseRequest) -> Self {
        Self {
            name: req.name.clone(),
            namespace: req.namespace.clone(),
            values: req.values.clone(),
            dry_run: req.dry_run,
            reuse_name: req.replace,
            disable_hooks: req.disable_hooks,
            timeout: req.timeout,
            wait: req.wait,
        }
    }
}

/// Options for `UpdateRelease`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    /// Raw YAML value overrides
    pub values: String,

    pub dry_run: bool,

    /// Recreate resources instead of patching them
    pub recreate: bool,

    pub disable_hooks: bool,

    pub timeout: i64,

    /// Discard previous overrides and use the chart defaults
    pub reset_values: bool,

    /// Merge the new overrides over the previous ones
    pub reuse_values: bool,

    pub wait: bool,
}

impl UpdateOptions {
    pub fn with_values(mut self, values: impl Into<String>) -> Self {
        self.values = values.into();
        self
    }

    pub fn reset_values(mut self) -> Self {
        self.reset_values = true;
        self
    }

    pub fn reuse_values(mut self) -> Self {
        self.reuse_values = true;
        self
    }
}

impl From<&UpdateReleaseRequest> for UpdateOptions {
    fn from(req: &UpdateReleaseRequest) -> Self {
        Self {
            values: req.values.clone(),
            dry_run: req.dry_run,
            recreate: req.recreate,
            disable_hooks: req.disable_hooks,
            timeout: req.timeout,
            reset_values: req.reset_values,
            reuse_values: req.reuse_values,
            wait: req.wait,
        }
    }
}

/// Options for `RollbackRelease`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollbackOptions {
    /// Target revision; zero rolls back to the revision before the latest
    pub version: u32,

    pub dry_run: bool,

    pub recreate: bool,

    pub disable_hooks: bool,

    pub timeout: i64,

    pub wait: bool,
}

impl RollbackOptions {
    pub fn to_revision(version: u32) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }
}

impl From<&UpdateReleaseRequest> for RollbackOptions {
    fn from(req: &UpdateReleaseRequest) -> Self {
        Self {
            version: u32::try_from(req.revision).unwrap_or(0),
            dry_run: req.dry_run,
            recreate: req.recreate,
            disable_hooks: req.disable_hooks,
            timeout: req.timeout,
            wait: req.wait,
        }
    }
}

/// Options for `DeleteRelease`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    pub dry_run: bool,

    pub disable_hooks: bool,

    /// Remove every revision instead of marking the release deleted
    pub purge: bool,

    pub timeout: i64,
}

impl DeleteOptions {
    pub fn purge() -> Self {
        Self {
            purge: true,
            ..Default::default()
        }
    }
}

impl From<&DeleteReleaseRequest> for DeleteOptions {
    fn from(req: &DeleteReleaseRequest) -> Self {
        Self {
            dry_run: req.dry_run,
            disable_hooks: req.no_hooks,
            purge: req.purge,
            timeout: req.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_options_from_request() {
        let mut req = ListReleaseRequest {
            by_date: true,
            sort_desc: true,
            ..Default::default()
        };
        req.apply_defaults();

        let opts = ListOptions::from(&req);
        assert_eq!(opts.sort_by, SortBy::LastReleased);
        assert_eq!(opts.sort_order, SortOrder::Desc);
        assert_eq!(opts.limit, 256);
        assert_eq!(opts.namespace, "default");
        assert_eq!(opts.status_codes, vec![StatusCode::Deployed, StatusCode::Failed]);
    }

    #[test]
    fn test_install_options_carry_replace() {
        let req = InstallReleaseRequest {
            name: "web".into(),
            replace: true,
            values: "a: 1".into(),
            ..Default::default()
        };
        let opts = InstallOptions::from(&req);
        assert!(opts.reuse_name);
        assert_eq!(opts.values, "a: 1");
    }

    #[test]
    fn test_rollback_negative_revision_means_previous() {
        let req = UpdateReleaseRequest {
            rollback: true,
            revision: -4,
            ..Default::default()
        };
        assert_eq!(RollbackOptions::from(&req).version, 0);
    }

    #[test]
    fn test_delete_options_from_request() {
        let req = DeleteReleaseRequest {
            name: "web".into(),
            no_hooks: true,
            purge: true,
            ..Default::default()
        };
        let opts = DeleteOptions::from(&req);
        assert!(opts.disable_hooks && opts.purge && !opts.dry_run);
    }
}
