//! Chart requirements and bundled-dependency validation

use serde::{Deserialize, Serialize};

use crate::chart::Chart;
use crate::error::{CoreError, Result};

/// Contents of `requirements.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// A declared sub-chart requirement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dependency {
    /// Name of the required chart
    pub name: String,

    /// Version constraint (semver range)
    #[serde(default)]
    pub version: String,

    /// Repository URL or alias
    #[serde(default)]
    pub repository: String,

    /// Values path that toggles the dependency
    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub alias: Option<String>,
}

/// Check that every requirement is satisfied by a bundled sub-chart
///
/// All unmatched requirement names are reported together, in declaration
/// order.
pub fn check_dependencies(chart: &Chart, requirements: &Requirements) -> Result<()> {
    let missing: Vec<String> = requirements
        .dependencies
        .iter()
        .filter(|req| !chart.dependencies.iter().any(|d| d.name() == req.name))
        .map(|req| req.name.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::MissingDependencies { missing })
    }
}

/// Validate a chart against its own `requirements.yaml`
///
/// A chart without a requirements file always passes.
pub fn validate_chart(chart: &Chart) -> Result<()> {
    match chart.requirements()? {
        Some(requirements) => check_dependencies(chart, &requirements),
        None => Ok(()),
    }
}
