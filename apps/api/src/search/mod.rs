//! Record Store Adapter: the read/search and bulk-write seam over the search index.
//!
//! Callers build a backend-neutral `SearchQuery`; `OpenSearchClient` renders it as
//! bool-query DSL. The trait is the only thing the retrieval and ingestion code
//! sees, so tests run against an in-memory store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

pub mod opensearch;

/// Field holding the full-text content of every indexed record.
pub const CONTENT_FIELD: &str = "content";

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Search backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search backend returned status {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),
}

/// A structured filter clause. `Term` is an exact keyword match; `Match` is an
/// analyzed match (used where the stored field is text rather than keyword).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldFilter {
    Term { field: String, value: String },
    Match { field: String, value: String },
}

impl FieldFilter {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        FieldFilter::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matching(field: impl Into<String>, value: impl Into<String>) -> Self {
        FieldFilter::Match {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            FieldFilter::Term { field, .. } | FieldFilter::Match { field, .. } => field,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            FieldFilter::Term { value, .. } | FieldFilter::Match { value, .. } => value,
        }
    }

    fn to_dsl(&self) -> Value {
        match self {
            FieldFilter::Term { field, value } => json!({ "term": { field: value } }),
            FieldFilter::Match { field, value } => json!({ "match": { field: value } }),
        }
    }
}

/// A backend-neutral search request.
///
/// `text_match: None` means match-all; filters always apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text_match: Option<String>,
    pub filters: Vec<FieldFilter>,
    pub size: usize,
    pub source_fields: Vec<String>,
}

impl SearchQuery {
    /// Renders the query as OpenSearch bool-query DSL.
    pub fn to_dsl(&self) -> Value {
        let must = match &self.text_match {
            Some(text) => json!({ "match": { CONTENT_FIELD: text } }),
            None => json!({ "match_all": {} }),
        };
        let filters: Vec<Value> = self.filters.iter().map(FieldFilter::to_dsl).collect();

        let mut body = json!({
            "query": {
                "bool": {
                    "must": [must],
                    "filter": filters,
                }
            },
            "size": self.size,
        });
        if !self.source_fields.is_empty() {
            body["_source"] = json!(self.source_fields);
        }
        body
    }
}

/// One ranked hit: relevance score plus the requested source fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl SearchHit {
    pub fn source_str(&self, field: &str) -> Option<&str> {
        self.source.get(field).and_then(Value::as_str)
    }

    /// Relevance score; engines omit it when sorting on other keys.
    pub fn relevance(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// A document ready for indexing under a caller-chosen id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexOp {
    pub id: String,
    pub source: Value,
}

/// Outcome of a bulk write. Per-document failures are counted, not raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub indexed: usize,
    pub failed: usize,
}

impl BulkReport {
    pub fn merge(&mut self, other: BulkReport) {
        self.indexed += other.indexed;
        self.failed += other.failed;
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns hits in the engine's ranking order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, RetrievalError>;

    async fn bulk_index(&self, ops: &[IndexOp]) -> Result<BulkReport, RetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precise_query_dsl() {
        let query = SearchQuery {
            text_match: Some("I hate weapons".to_string()),
            filters: vec![
                FieldFilter::term("content_type", "motto"),
                FieldFilter::matching("assessment", "Blacklist"),
            ],
            size: 5,
            source_fields: vec!["content".to_string(), "reason".to_string()],
        };

        let dsl = query.to_dsl();
        assert_eq!(
            dsl["query"]["bool"]["must"][0]["match"]["content"],
            "I hate weapons"
        );
        assert_eq!(
            dsl["query"]["bool"]["filter"][0]["term"]["content_type"],
            "motto"
        );
        assert_eq!(
            dsl["query"]["bool"]["filter"][1]["match"]["assessment"],
            "Blacklist"
        );
        assert_eq!(dsl["size"], 5);
        assert_eq!(dsl["_source"][1], "reason");
    }

    #[test]
    fn test_broad_query_dsl_uses_match_all() {
        let query = SearchQuery {
            text_match: None,
            filters: vec![FieldFilter::term("doc_type", "crosslingual_terminology")],
            size: 10,
            source_fields: vec![],
        };

        let dsl = query.to_dsl();
        assert!(dsl["query"]["bool"]["must"][0]["match_all"].is_object());
        assert!(dsl.get("_source").is_none());
    }

    #[test]
    fn test_hit_deserializes_with_null_score() {
        let hit: SearchHit = serde_json::from_value(json!({
            "_id": "abc",
            "_score": null,
            "_source": {"content": "Paimon"}
        }))
        .unwrap();

        assert_eq!(hit.relevance(), 0.0);
        assert_eq!(hit.source_str("content"), Some("Paimon"));
        assert_eq!(hit.source_str("missing"), None);
    }
}
