//! `reads/search`.

use async_trait::async_trait;
use paging_verify::{Page, PageSize, PageToken, SearchPage, TransportError};
use serde::{Deserialize, Serialize};

use crate::client::{Ga4ghClient, SearchRequest};
use crate::models::ReadAlignment;

pub const READS_SEARCH_PATH: &str = "reads/search";

/// Selects the reads of some read groups overlapping a reference range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadsFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub read_group_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchReadsResponse {
    #[serde(default)]
    alignments: Vec<ReadAlignment>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// The reads search endpoint of one server.
#[derive(Debug, Clone)]
pub struct ReadsSearch {
    client: Ga4ghClient,
}

impl ReadsSearch {
    pub fn new(client: Ga4ghClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchPage for ReadsSearch {
    type Filter = ReadsFilter;
    type Item = ReadAlignment;

    fn describe(&self) -> String {
        self.client.url(READS_SEARCH_PATH)
    }

    async fn search_page(
        &self,
        filter: &ReadsFilter,
        page_size: Option<PageSize>,
        page_token: Option<PageToken>,
    ) -> Result<Page<ReadAlignment>, TransportError> {
        let request = SearchRequest::new(filter, page_size, page_token.as_ref());
        let response: SearchReadsResponse =
            self.client.post_search(READS_SEARCH_PATH, &request).await?;
        Ok(Page {
            items: response.alignments,
            next_page_token: PageToken::from_wire(response.next_page_token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_omits_absent_bounds() {
        let filter = ReadsFilter {
            read_group_ids: vec!["rg1".to_string()],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"readGroupIds": ["rg1"]})
        );

        let filter = ReadsFilter {
            reference_id: Some("ref1".to_string()),
            read_group_ids: vec!["rg1".to_string()],
            start: Some(0),
            end: Some(150),
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"referenceId": "ref1", "readGroupIds": ["rg1"], "start": 0, "end": 150})
        );
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: SearchReadsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.alignments.is_empty());
        assert!(response.next_page_token.is_none());

        let response: SearchReadsResponse =
            serde_json::from_str(r#"{"alignments": [], "nextPageToken": null}"#).unwrap();
        assert!(response.next_page_token.is_none());
    }
}
