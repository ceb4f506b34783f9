//! Fake GA4GH endpoint for tests, served by axum.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

type Handler = dyn Fn(&str, &Value) -> (StatusCode, String) + Send + Sync;

struct ServerState {
    handler: Arc<Handler>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct FakeServer {
    pub url: String,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl FakeServer {
    /// Answer every POST with `handler(path, body) -> (status, body)`.
    ///
    /// The handler runs on the blocking pool, so it may sleep.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> (StatusCode, String) + Send + Sync + 'static,
    {
        let state = Arc::new(ServerState {
            handler: Arc::new(handler),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/*path", post(serve))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { url, state, handle }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = uri.path().to_string();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        authorization,
        body: body.clone(),
    });

    let handler = Arc::clone(&state.handler);
    let (status, response_body) = tokio::task::spawn_blocking(move || handler(&path, &body))
        .await
        .unwrap();
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response_body,
    )
        .into_response()
}

/// Serve `items` under `field` with offset tokens, the way a correct server pages.
///
/// The final page carries an empty-string token. Requests without a page size
/// get `default_page_size` items.
pub fn paged(items: &[Value], field: &str, body: &Value, default_page_size: usize) -> String {
    let offset = body["pageToken"]
        .as_str()
        .and_then(|t| t.strip_prefix("offset:"))
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(0)
        .min(items.len());
    let size = body["pageSize"]
        .as_u64()
        .map(|n| n as usize)
        .unwrap_or(default_page_size);
    let end = (offset + size).min(items.len());
    let next = if end < items.len() {
        format!("offset:{end}")
    } else {
        String::new()
    };
    let mut response = serde_json::Map::new();
    response.insert(field.to_string(), Value::Array(items[offset..end].to_vec()));
    response.insert("nextPageToken".to_string(), Value::String(next));
    Value::Object(response).to_string()
}

/// `count` reads of one read group, each aligned at a distinct position.
pub fn reads(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("read-{i}"),
                "readGroupId": "rg1",
                "fragmentName": format!("fragment-{i}"),
                "readNumber": 0,
                "alignment": {
                    "position": {
                        "referenceName": "1",
                        "position": 10000 + i * 10,
                        "strand": "POS_STRAND"
                    },
                    "mappingQuality": 60,
                    "cigar": [{"operation": "ALIGNMENT_MATCH", "operationLength": 100}]
                },
                "alignedSequence": "ACGT"
            })
        })
        .collect()
}

/// `count` variant annotations between 10177 and 11008 on reference 1.
pub fn variant_annotations(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("va-{i}"),
                "variantId": format!("variant-{i}"),
                "variantAnnotationSetId": "vas1",
                "createDateTime": "2016-01-01T00:00:00Z",
                "transcriptEffects": [{
                    "id": format!("te-{i}"),
                    "featureId": "feature-1",
                    "alternateBases": "A",
                    "effects": [{"id": "SO:0001583", "term": "missense_variant"}]
                }]
            })
        })
        .collect()
}
