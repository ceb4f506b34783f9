//! Search over any endpoint that speaks the GA4GH paging convention.
//!
//! Records stay untyped JSON. Identity is either one configured field or the
//! whole record in canonical form.

use std::fmt;

use async_trait::async_trait;
use paging_verify::{
    canonical_json, ItemIdentity, Page, PageSize, PageToken, SearchPage, TransportError,
};
use serde_json::{Map, Value};

use crate::client::{Ga4ghClient, SearchRequest};

/// Filter fields sent alongside `pageSize` and `pageToken`.
pub type JsonFilter = Map<String, Value>;

/// An untyped record with its precomputed identity.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    pub value: Value,
    key: String,
}

impl JsonRecord {
    /// Wrap `value`, identified by `id_field` when the record has it.
    ///
    /// A record lacking the field, or carrying it as `null` or `""`, falls
    /// back to its canonical JSON text.
    pub fn new(value: Value, id_field: Option<&str>) -> Self {
        let key = match id_field.and_then(|field| value.get(field)) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            None | Some(Value::Null) | Some(Value::String(_)) => canonical_json(&value),
            Some(other) => canonical_json(other),
        };
        Self { value, key }
    }
}

impl ItemIdentity for JsonRecord {
    type Key = String;

    fn identity(&self) -> String {
        self.key.clone()
    }
}

/// A search endpoint returning its records under `items_field`.
#[derive(Clone)]
pub struct JsonSearch {
    client: Ga4ghClient,
    path: String,
    items_field: String,
    id_field: Option<String>,
}

impl fmt::Debug for JsonSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSearch")
            .field("url", &self.client.url(&self.path))
            .field("items_field", &self.items_field)
            .field("id_field", &self.id_field)
            .finish()
    }
}

impl JsonSearch {
    pub fn new(
        client: Ga4ghClient,
        path: impl Into<String>,
        items_field: impl Into<String>,
    ) -> Self {
        Self {
            client,
            path: path.into(),
            items_field: items_field.into(),
            id_field: None,
        }
    }

    /// Identify records by this field instead of their full content.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = Some(id_field.into());
        self
    }
}

#[async_trait]
impl SearchPage for JsonSearch {
    type Filter = JsonFilter;
    type Item = JsonRecord;

    fn describe(&self) -> String {
        self.client.url(&self.path)
    }

    async fn search_page(
        &self,
        filter: &JsonFilter,
        page_size: Option<PageSize>,
        page_token: Option<PageToken>,
    ) -> Result<Page<JsonRecord>, TransportError> {
        let request = SearchRequest::new(filter, page_size, page_token.as_ref());
        let response: Value = self.client.post_search(&self.path, &request).await?;

        let decode_error = |message: String| TransportError::Decode {
            url: self.client.url(&self.path),
            message,
        };

        let Value::Object(mut response) = response else {
            return Err(decode_error("response is not a JSON object".to_string()));
        };

        // Servers may omit an empty list entirely.
        let items = match response.remove(&self.items_field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(decode_error(format!(
                    "field '{}' is not an array",
                    self.items_field
                )))
            }
        };

        let next_page_token = match response.remove("nextPageToken") {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) => PageToken::from_wire(Some(token)),
            Some(_) => {
                return Err(decode_error(
                    "field 'nextPageToken' is not a string".to_string(),
                ))
            }
        };

        let id_field = self.id_field.as_deref();
        Ok(Page {
            items: items
                .into_iter()
                .map(|value| JsonRecord::new(value, id_field))
                .collect(),
            next_page_token,
        })
    }
}
