//! What to check: one collection on the server.
//!
//! Each target is both a set of command-line arguments and an entry of a plan
//! file, so the same knobs are spelled the same way in both places.

use clap::Args;
use ga4gh_client::JsonFilter;
use serde::Deserialize;

/// Reads of some read groups on one reference.
#[derive(Args, Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadsTarget {
    /// Label used in reports
    #[arg(long)]
    pub name: Option<String>,

    /// Reference to search. Resolved on the server when absent
    #[arg(long)]
    pub reference_id: Option<String>,

    /// Reference name to resolve, e.g. "1" (first reference when omitted)
    #[arg(long)]
    pub reference_name: Option<String>,

    /// Reference set to resolve the reference in (first set when omitted)
    #[arg(long)]
    pub reference_set: Option<String>,

    /// Read groups to search. Resolved on the server when none are given
    #[arg(long = "read-group-id", value_delimiter = ',')]
    pub read_group_ids: Vec<String>,

    /// Read group name to resolve (first read group when omitted)
    #[arg(long)]
    pub read_group_name: Option<String>,

    /// Dataset to resolve read groups in (first dataset when omitted)
    #[arg(long)]
    pub dataset: Option<String>,

    /// Start of the reference range (0-based, inclusive)
    #[arg(long)]
    pub start: Option<i64>,

    /// End of the reference range (0-based, exclusive)
    #[arg(long)]
    pub end: Option<i64>,
}

/// Annotations of one variant annotation set within a reference range.
#[derive(Args, Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantAnnotationsTarget {
    /// Label used in reports
    #[arg(long)]
    pub name: Option<String>,

    /// Annotation set to search. Resolved on the server when absent
    #[arg(long)]
    pub variant_annotation_set_id: Option<String>,

    /// Annotation set name to resolve (first set when omitted)
    #[arg(long)]
    pub annotation_set_name: Option<String>,

    /// Dataset to resolve the annotation set in (first dataset when omitted)
    #[arg(long)]
    pub dataset: Option<String>,

    /// Reference name, e.g. "1"
    #[arg(long)]
    pub reference_name: Option<String>,

    /// Reference id, used instead of the reference name
    #[arg(long)]
    pub reference_id: Option<String>,

    /// Start of the reference range (0-based, inclusive)
    #[arg(long)]
    pub start: Option<i64>,

    /// End of the reference range (0-based, exclusive)
    #[arg(long)]
    pub end: Option<i64>,

    /// Sequence Ontology term ids to filter on, e.g. SO:0001583
    #[arg(long = "effect", value_delimiter = ',')]
    pub effects: Vec<String>,
}

/// Any endpoint following the GA4GH paging convention.
#[derive(Args, Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonTarget {
    /// Label used in reports
    #[arg(long)]
    #[serde(default)]
    pub name: Option<String>,

    /// Search path below the endpoint, e.g. "variants/search"
    #[arg(long)]
    pub path: String,

    /// Response field holding the records, e.g. "variants"
    #[arg(long)]
    pub items_field: String,

    /// Record field identifying a record. Whole records are compared when omitted
    #[arg(long)]
    #[serde(default)]
    pub id_field: Option<String>,

    /// Filter fields as a JSON object, e.g. '{"variantSetId": "vs1"}'
    #[arg(long, value_parser = parse_json_filter, default_value = "{}")]
    #[serde(default)]
    pub filter: JsonFilter,
}

/// One entry of a plan file.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetConfig {
    Reads(ReadsTarget),
    VariantAnnotations(VariantAnnotationsTarget),
    Json(JsonTarget),
}

impl TargetConfig {
    /// Report label, if the target has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            TargetConfig::Reads(t) => t.name.as_deref(),
            TargetConfig::VariantAnnotations(t) => t.name.as_deref(),
            TargetConfig::Json(t) => t.name.as_deref(),
        }
    }

    /// The name, or what kind of collection this is.
    pub fn label(&self) -> String {
        if let Some(name) = self.name() {
            return name.to_string();
        }
        match self {
            TargetConfig::Reads(_) => "reads".to_string(),
            TargetConfig::VariantAnnotations(_) => "variant annotations".to_string(),
            TargetConfig::Json(t) => t.path.clone(),
        }
    }
}

/// Parse a JSON object given on the command line.
pub fn parse_json_filter(s: &str) -> anyhow::Result<JsonFilter> {
    match serde_json::from_str(s)? {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("Filter must be a JSON object, got: {other}"),
    }
}
