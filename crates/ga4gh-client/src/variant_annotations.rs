//! `variantannotations/search`.

use async_trait::async_trait;
use paging_verify::{Page, PageSize, PageToken, SearchPage, TransportError};
use serde::{Deserialize, Serialize};

use crate::client::{Ga4ghClient, SearchRequest};
use crate::models::{OntologyTerm, VariantAnnotation};

pub const VARIANT_ANNOTATIONS_SEARCH_PATH: &str = "variantannotations/search";

/// Selects the annotations of one annotation set within a reference range.
///
/// Exactly one of `reference_name` and `reference_id` is expected by servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantAnnotationsFilter {
    pub variant_annotation_set_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub start: i64,
    pub end: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<OntologyTerm>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchVariantAnnotationsResponse {
    #[serde(default)]
    variant_annotations: Vec<VariantAnnotation>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// The variant annotation search endpoint of one server.
#[derive(Debug, Clone)]
pub struct VariantAnnotationsSearch {
    client: Ga4ghClient,
}

impl VariantAnnotationsSearch {
    pub fn new(client: Ga4ghClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchPage for VariantAnnotationsSearch {
    type Filter = VariantAnnotationsFilter;
    type Item = VariantAnnotation;

    fn describe(&self) -> String {
        self.client.url(VARIANT_ANNOTATIONS_SEARCH_PATH)
    }

    async fn search_page(
        &self,
        filter: &VariantAnnotationsFilter,
        page_size: Option<PageSize>,
        page_token: Option<PageToken>,
    ) -> Result<Page<VariantAnnotation>, TransportError> {
        let request = SearchRequest::new(filter, page_size, page_token.as_ref());
        let response: SearchVariantAnnotationsResponse = self
            .client
            .post_search(VARIANT_ANNOTATIONS_SEARCH_PATH, &request)
            .await?;
        Ok(Page {
            items: response.variant_annotations,
            next_page_token: PageToken::from_wire(response.next_page_token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_encoding() {
        let filter = VariantAnnotationsFilter {
            variant_annotation_set_id: "vas1".to_string(),
            reference_name: Some("1".to_string()),
            start: 10177,
            end: 11008,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({
                "variantAnnotationSetId": "vas1",
                "referenceName": "1",
                "start": 10177,
                "end": 11008
            })
        );
    }

    #[test]
    fn test_filter_with_effects() {
        let filter = VariantAnnotationsFilter {
            variant_annotation_set_id: "vas1".to_string(),
            reference_id: Some("ref1".to_string()),
            start: 0,
            end: 100,
            effects: vec![OntologyTerm::with_id("SO:0001583")],
            ..Default::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value["effects"], json!([{"id": "SO:0001583"}]));
        assert!(value.get("referenceName").is_none());
    }
}
