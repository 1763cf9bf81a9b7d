//! OpenSearch over plain HTTP (`_search` and `_bulk`).

use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{BulkReport, IndexOp, RecordStore, RetrievalError, SearchHit, SearchQuery};

/// Bulk requests are split so no single body exceeds this many bytes.
const MAX_BULK_BYTES: usize = 10 * 1024 * 1024;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Rounds of resending items the cluster rejected with 429.
const BULK_MAX_RETRIES: u32 = 3;
const BULK_INITIAL_BACKOFF: Duration = Duration::from_millis(200);
const BULK_MAX_BACKOFF: Duration = Duration::from_millis(800);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<Value>,
}

/// Search-index client. Built once at startup and shared read-only.
#[derive(Clone)]
pub struct OpenSearchClient {
    client: Client,
    base_url: String,
    index: String,
    credentials: Option<(String, String)>,
}

impl OpenSearchClient {
    pub fn new(
        endpoint: &str,
        index: impl Into<String>,
        credentials: Option<(String, String)>,
    ) -> Result<Self, RetrievalError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: normalize_endpoint(endpoint),
            index: index.into(),
            credentials,
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    async fn send_bulk_chunk(&self, body: String) -> Result<Vec<Value>, RetrievalError> {
        let response = self
            .post(format!("{}/_bulk", self.base_url))
            .header("content-type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let bulk: BulkResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;

        Ok(bulk.items)
    }

    /// One pass over `ops`. Returns the counts and the ops rejected with 429.
    async fn bulk_pass(
        &self,
        ops: &[IndexOp],
    ) -> Result<(BulkReport, Vec<IndexOp>), RetrievalError> {
        let mut report = BulkReport::default();
        let mut throttled = Vec::new();

        for chunk in chunk_bulk_body(&self.index, ops)? {
            let items = self.send_bulk_chunk(chunk.body).await?;
            let summary = summarize_bulk_items(&items);
            report.merge(summary.report);
            throttled.extend(
                summary
                    .throttled
                    .into_iter()
                    .filter_map(|i| ops.get(chunk.ops.start + i).cloned()),
            );
        }

        Ok((report, throttled))
    }
}

#[async_trait]
impl RecordStore for OpenSearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, RetrievalError> {
        let body = query.to_dsl();
        debug!("Search on index {}: {}", self.index, body);

        let response = self
            .post(format!("{}/{}/_search", self.base_url, self.index))
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;

        Ok(parsed.hits.hits)
    }

    /// Items rejected with 429 are resent with exponential backoff; any still
    /// throttled after the last round count as failed.
    async fn bulk_index(&self, ops: &[IndexOp]) -> Result<BulkReport, RetrievalError> {
        let (mut report, mut pending) = self.bulk_pass(ops).await?;
        let mut backoff = BULK_INITIAL_BACKOFF;

        for attempt in 1..=BULK_MAX_RETRIES {
            if pending.is_empty() {
                break;
            }
            warn!(
                "{} document(s) throttled by {}, retry {attempt}/{BULK_MAX_RETRIES} in {backoff:?}",
                pending.len(),
                self.index
            );
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(BULK_MAX_BACKOFF);

            let (retried, throttled) = self.bulk_pass(&pending).await?;
            report.merge(retried);
            pending = throttled;
        }
        report.failed += pending.len();

        if report.failed > 0 {
            warn!(
                "Bulk indexing into {}: {} indexed, {} failed",
                self.index, report.indexed, report.failed
            );
        }
        Ok(report)
    }
}

async fn check_status(response: Response) -> Result<Response, RetrievalError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(RetrievalError::Backend {
        status: status.as_u16(),
        message,
    })
}

/// Accepts a bare host (`search-x.us-west-2.es.amazonaws.com`) or a full URL.
fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// One `_bulk` request body and the range of ops it carries.
#[derive(Debug)]
struct BulkChunk {
    body: String,
    ops: Range<usize>,
}

/// Renders `ops` as NDJSON action/source pairs, split into bodies under `MAX_BULK_BYTES`.
/// A single oversized document still gets its own chunk.
fn chunk_bulk_body(index: &str, ops: &[IndexOp]) -> Result<Vec<BulkChunk>, RetrievalError> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for (i, op) in ops.iter().enumerate() {
        let action = json!({ "index": { "_index": index, "_id": op.id } });
        let source = serde_json::to_string(&op.source)
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;
        let pair = format!("{action}\n{source}\n");

        if !current.is_empty() && current.len() + pair.len() > MAX_BULK_BYTES {
            chunks.push(BulkChunk {
                body: std::mem::take(&mut current),
                ops: start..i,
            });
            start = i;
        }
        current.push_str(&pair);
    }

    if !current.is_empty() {
        chunks.push(BulkChunk {
            body: current,
            ops: start..ops.len(),
        });
    }
    Ok(chunks)
}

#[derive(Debug, Default, PartialEq)]
struct BulkItemSummary {
    report: BulkReport,
    /// Positions (within the chunk) of items rejected with 429.
    throttled: Vec<usize>,
}

fn summarize_bulk_items(items: &[Value]) -> BulkItemSummary {
    let mut summary = BulkItemSummary::default();
    for (i, item) in items.iter().enumerate() {
        let action = item.as_object().and_then(|o| o.values().next());
        match action {
            Some(a) if a.get("status").and_then(Value::as_u64) == Some(429) => {
                summary.throttled.push(i)
            }
            Some(a) if a.get("error").is_none() => summary.report.indexed += 1,
            _ => summary.report.failed += 1,
        }
    }
    summary
}
