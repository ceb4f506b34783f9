//! paging-check library
//!
//! Checks that a GA4GH-style search API pages consistently: the same items come
//! back whatever the page size, an unpaged query is a subset of a paged walk,
//! and single pages sized to fit the collection are complete and final.
//!
//! # CLI Usage
//!
//! ```bash
//! # Reads of the first read group on reference "1"
//! paging-check reads --endpoint http://localhost:8000 --reference-name 1
//!
//! # Variant annotations in a region
//! paging-check variant-annotations --reference-name 1 --start 10177 --end 11008
//!
//! # Any other search endpoint
//! paging-check search --path variants/search --items-field variants \
//!   --filter '{"variantSetId": "vs1", "referenceName": "1", "start": 0, "end": 100000}'
//!
//! # Many targets from a plan file
//! paging-check plan checks.yaml --output-format markdown --output report.md
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};
use ga4gh_client::Ga4ghClient;

pub mod config;
pub mod output;
pub mod run;

pub use config::{parse_duration, PlanConfig, TargetConfig};
pub use output::{render, write_output};
pub use run::{run_plan, run_target};

/// Server connection options
#[derive(Args, Clone, Debug)]
pub struct ServerOpts {
    /// Base URL of the GA4GH server
    #[arg(long, default_value = "http://localhost:8000", env = "PAGING_CHECK_ENDPOINT")]
    pub endpoint: String,

    /// Bearer token sent with every request
    #[arg(long, env = "PAGING_CHECK_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: Option<String>,

    /// Per-request timeout (e.g. "30s", "500ms", "2m")
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub timeout: Duration,
}

impl ServerOpts {
    pub fn client(&self) -> anyhow::Result<Ga4ghClient> {
        build_client(&self.endpoint, self.timeout, self.bearer_token.as_deref())
    }
}

/// Build a client, attaching the bearer token when one is set.
pub fn build_client(
    endpoint: &str,
    timeout: Duration,
    bearer_token: Option<&str>,
) -> anyhow::Result<Ga4ghClient> {
    let client = Ga4ghClient::new(endpoint, timeout)?;
    Ok(match bearer_token.filter(|t| !t.is_empty()) {
        Some(token) => client.with_bearer_token(token),
        None => client,
    })
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
    Markdown,
}

/// Report output options
#[derive(Args, Clone, Debug)]
pub struct OutputOpts {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub output_format: OutputFormat,

    /// Output file (optional, defaults to stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}
