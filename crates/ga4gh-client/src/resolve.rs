//! Discover valid identifiers to search with.
//!
//! The paging checks need real reference, read group and annotation set ids
//! from the server under test. Each resolver lists one resource type, picks the
//! record with the requested name, or the first record when no name is given.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::Ga4ghClient;

/// Records requested per listing call.
const LISTING_PAGE_SIZE: u32 = 1000;

/// Listing calls made for one resource type before giving up.
const MAX_LISTING_PAGES: usize = 100;

/// Any GA4GH record that has an id and optional name.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadGroupSet {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    read_groups: Vec<NamedRecord>,
}

/// Looks up identifiers on one server.
#[derive(Debug, Clone)]
pub struct Resolver {
    client: Ga4ghClient,
}

impl Resolver {
    pub fn new(client: Ga4ghClient) -> Self {
        Self { client }
    }

    pub async fn dataset_id(&self, name: Option<&str>) -> Result<String> {
        let datasets: Vec<NamedRecord> = self.list("datasets/search", "datasets", json!({})).await?;
        pick(datasets, name, "dataset")
    }

    pub async fn reference_set_id(&self, name: Option<&str>) -> Result<String> {
        let sets: Vec<NamedRecord> = self
            .list("referencesets/search", "referenceSets", json!({}))
            .await?;
        pick(sets, name, "reference set")
    }

    /// A reference of the given set, matched by name (e.g. `"1"`).
    pub async fn reference_id(&self, reference_set_id: &str, name: Option<&str>) -> Result<String> {
        let references: Vec<NamedRecord> = self
            .list(
                "references/search",
                "references",
                json!({ "referenceSetId": reference_set_id }),
            )
            .await?;
        pick(references, name, "reference")
    }

    /// A read group of the dataset, matched by read group name.
    pub async fn read_group_id(&self, dataset_id: &str, name: Option<&str>) -> Result<String> {
        let sets: Vec<ReadGroupSet> = self
            .list(
                "readgroupsets/search",
                "readGroupSets",
                json!({ "datasetId": dataset_id }),
            )
            .await?;

        for set in &sets {
            debug!(
                "Read group set {} ({}) has {} read groups",
                set.id,
                set.name.as_deref().unwrap_or("unnamed"),
                set.read_groups.len()
            );
        }

        let groups: Vec<NamedRecord> = sets.into_iter().flat_map(|s| s.read_groups).collect();
        pick(groups, name, "read group")
    }

    pub async fn variant_set_id(&self, dataset_id: &str, name: Option<&str>) -> Result<String> {
        let sets: Vec<NamedRecord> = self
            .list(
                "variantsets/search",
                "variantSets",
                json!({ "datasetId": dataset_id }),
            )
            .await?;
        pick(sets, name, "variant set")
    }

    pub async fn variant_annotation_set_id(
        &self,
        variant_set_id: &str,
        name: Option<&str>,
    ) -> Result<String> {
        let sets: Vec<NamedRecord> = self
            .list(
                "variantannotationsets/search",
                "variantAnnotationSets",
                json!({ "variantSetId": variant_set_id }),
            )
            .await?;
        pick(sets, name, "variant annotation set")
    }

    /// Reference id for a reference name, looked up in the first (or named) reference set.
    pub async fn resolve_reference_id(
        &self,
        reference_set: Option<&str>,
        reference_name: Option<&str>,
    ) -> Result<String> {
        let set_id = self.reference_set_id(reference_set).await?;
        let id = self.reference_id(&set_id, reference_name).await?;
        info!("Resolved reference {} to {}", reference_name.unwrap_or("(first)"), id);
        Ok(id)
    }

    /// Read group id in the first (or named) dataset.
    pub async fn resolve_read_group_id(
        &self,
        dataset: Option<&str>,
        read_group_name: Option<&str>,
    ) -> Result<String> {
        let dataset_id = self.dataset_id(dataset).await?;
        let id = self.read_group_id(&dataset_id, read_group_name).await?;
        info!("Resolved read group {} to {}", read_group_name.unwrap_or("(first)"), id);
        Ok(id)
    }

    /// Variant annotation set id, following dataset then variant set.
    pub async fn resolve_variant_annotation_set_id(
        &self,
        dataset: Option<&str>,
        annotation_set_name: Option<&str>,
    ) -> Result<String> {
        let dataset_id = self.dataset_id(dataset).await?;
        let variant_set_id = self.variant_set_id(&dataset_id, None).await?;
        let id = self
            .variant_annotation_set_id(&variant_set_id, annotation_set_name)
            .await?;
        info!(
            "Resolved variant annotation set {} to {}",
            annotation_set_name.unwrap_or("(first)"),
            id
        );
        Ok(id)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &str,
        mut body: Value,
    ) -> Result<Vec<T>> {
        let Value::Object(body) = &mut body else {
            anyhow::bail!("Listing filter for {field} must be a JSON object");
        };
        body.insert("pageSize".to_string(), json!(LISTING_PAGE_SIZE));

        let mut records = Vec::new();
        for page in 1..=MAX_LISTING_PAGES {
            let mut response: Value = self
                .client
                .post_search(path, &*body)
                .await
                .with_context(|| format!("Failed to list {field}"))?;

            let batch = response
                .get_mut(field)
                .map(Value::take)
                .unwrap_or(Value::Array(Vec::new()));
            let batch: Vec<T> = serde_json::from_value(batch).with_context(|| {
                format!("Failed to decode '{field}' from {}", self.client.url(path))
            })?;
            debug!("Listed {} {} on page {}", batch.len(), field, page);
            records.extend(batch);

            match response.get("nextPageToken").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => {
                    body.insert("pageToken".to_string(), json!(token));
                }
                _ => return Ok(records),
            }
        }
        anyhow::bail!("Listing {field} did not finish within {MAX_LISTING_PAGES} pages")
    }
}

/// Pick `name` among `records`, or the first record without a name.
fn pick(records: Vec<NamedRecord>, name: Option<&str>, what: &str) -> Result<String> {
    let mut records = records.into_iter();
    let found = match name {
        Some(name) => records.find(|r| r.name.as_deref() == Some(name)),
        None => records.next(),
    };
    found.map(|r| r.id).ok_or_else(|| match name {
        Some(name) => anyhow::anyhow!("No {what} named '{name}' found on the server"),
        None => anyhow::anyhow!("The server has no {what}"),
    })
}
