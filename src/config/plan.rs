//! Plan files: many targets on one server, checked in one run.
//!
//! ```yaml
//! endpoint: http://localhost:8000
//! timeout: 30s
//! check:
//!   cross_stride: [3, 7]
//!   strict_duplicates: true
//! targets:
//!   - kind: reads
//!     name: chr1 reads
//!     reference_name: "1"
//!   - kind: variant_annotations
//!     reference_name: "1"
//!     start: 10177
//!     end: 11008
//!   - kind: json
//!     path: variants/search
//!     items_field: variants
//!     id_field: id
//!     filter: { variantSetId: vs1, referenceName: "1", start: 0, end: 100000 }
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use paging_verify::CheckArgs;
use serde::Deserialize;

use super::duration::parse_duration;
use super::target::TargetConfig;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    /// Base URL of the server under test.
    pub endpoint: String,
    /// Per-request timeout, e.g. "30s".
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub check: CheckArgs,
    pub targets: Vec<TargetConfig>,
}

impl PlanConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {path:?}"))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid plan file: {path:?}"))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let plan: PlanConfig =
            serde_yaml::from_str(content).with_context(|| "Failed to parse plan YAML")?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.targets.is_empty() {
            anyhow::bail!("Plan has no targets");
        }
        self.timeout()?;
        self.check.to_config()?;
        Ok(())
    }

    /// Configured timeout, or `None` for the client default.
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .with_context(|| "Invalid plan timeout")
    }
}
