//! In-memory doubles for the adapter traits, shared by unit tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::llm_client::{LlmError, ModelInvoker, ModelRequest};
use crate::search::{
    BulkReport, FieldFilter, IndexOp, RecordStore, RetrievalError, SearchHit, SearchQuery,
    CONTENT_FIELD,
};
use crate::state::AppState;
use crate::storage::blob::{BlobError, BlobStore};
use crate::storage::terms::{TermRow, TermStore, TermStoreError};

pub fn hit(source: Value, score: f64) -> SearchHit {
    SearchHit {
        id: None,
        score: Some(score),
        source: source.as_object().cloned().unwrap_or_default(),
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A tiny search engine: term filters are exact, match filters need every token
/// present, and the text score is the number of shared content tokens.
#[derive(Default)]
pub struct InMemoryRecordStore {
    documents: Mutex<Vec<(String, Value)>>,
    queries: Mutex<Vec<SearchQuery>>,
    failing: bool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, source: Value) -> Self {
        {
            let mut docs = self.documents.lock().unwrap();
            let id = format!("doc-{}", docs.len());
            docs.push((id, source));
        }
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn search_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

fn passes(filter: &FieldFilter, source: &Value) -> bool {
    let Some(stored) = source.get(filter.field()).and_then(Value::as_str) else {
        return false;
    };
    match filter {
        FieldFilter::Term { value, .. } => stored == value,
        FieldFilter::Match { value, .. } => {
            let stored = tokens(stored);
            tokens(value).iter().all(|t| stored.contains(t))
        }
    }
}

fn project(source: &Value, fields: &[String]) -> Map<String, Value> {
    let all = source.as_object().cloned().unwrap_or_default();
    if fields.is_empty() {
        return all;
    }
    all.into_iter().filter(|(k, _)| fields.contains(k)).collect()
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, RetrievalError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.failing {
            return Err(RetrievalError::Backend {
                status: 503,
                message: "cluster unavailable".to_string(),
            });
        }

        let query_tokens = query.text_match.as_deref().map(tokens);
        let mut hits: Vec<SearchHit> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, source)| query.filters.iter().all(|f| passes(f, source)))
            .filter_map(|(id, source)| {
                let score = match &query_tokens {
                    None => 1.0,
                    Some(wanted) => {
                        let content = tokens(
                            source.get(CONTENT_FIELD).and_then(Value::as_str).unwrap_or(""),
                        );
                        wanted.iter().filter(|t| content.contains(t)).count() as f64
                    }
                };
                (score > 0.0).then(|| SearchHit {
                    id: Some(id.clone()),
                    score: Some(score),
                    source: project(source, &query.source_fields),
                })
            })
            .collect();

        hits.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
        hits.truncate(query.size);
        Ok(hits)
    }

    async fn bulk_index(&self, ops: &[IndexOp]) -> Result<BulkReport, RetrievalError> {
        if self.failing {
            return Err(RetrievalError::Backend {
                status: 503,
                message: "cluster unavailable".to_string(),
            });
        }
        let mut docs = self.documents.lock().unwrap();
        for op in ops {
            match docs.iter_mut().find(|doc| doc.0 == op.id) {
                Some(doc) => doc.1 = op.source.clone(),
                None => docs.push((op.id.clone(), op.source.clone())),
            }
        }
        Ok(BulkReport {
            indexed: ops.len(),
            failed: 0,
        })
    }
}

/// Replays scripted replies in order; once the script runs out every call fails
/// with a transient 503.
#[derive(Default)]
pub struct ScriptedInvoker {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicU32,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn error(self, err: LlmError) -> Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn invoke(&self, request: &ModelRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::Api {
                    status: 503,
                    message: "no scripted reply".to_string(),
                })
            })
    }
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, key: &str, body: &str) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::from(body.to_string()));
        self
    }

    pub fn object(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Bytes, BlobError> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> Result<(), BlobError> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTermStore {
    rows: Mutex<BTreeMap<String, TermRow>>,
}

impl InMemoryTermStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<TermRow> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl TermStore for InMemoryTermStore {
    async fn upsert(&self, row: &TermRow) -> Result<(), TermStoreError> {
        self.rows
            .lock()
            .unwrap()
            .insert(row.term.clone(), row.clone());
        Ok(())
    }
}

/// App state wired entirely to in-memory doubles.
pub fn test_state(
    store: Arc<InMemoryRecordStore>,
    llm: Arc<ScriptedInvoker>,
    blobs: Arc<InMemoryBlobStore>,
    terms: Arc<InMemoryTermStore>,
) -> AppState {
    AppState {
        record_store: store,
        llm,
        blobs,
        terms,
        config: Config::for_tests(),
    }
}
