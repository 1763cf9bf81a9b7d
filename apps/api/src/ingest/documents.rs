//! Search-index ingestion: source objects → index documents → bulk writes.
//!
//! Document ids are the SHA-256 of the document's JSON serialization, so
//! re-ingesting an identical record overwrites it instead of duplicating it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::moderation::models::Bucket;
use crate::search::{BulkReport, IndexOp, RecordStore};
use crate::storage::blob::{load_json_object, BlobStore};
use crate::storage::keys::file_stem;
use crate::translation::models::TermDocType;

/// `doc_type` of moderation precedent documents.
pub const PRECEDENT_DOC_TYPE: &str = "moderation_precedent";

/// Documents per bulk call; the client splits further by request size.
const BULK_BATCH: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Source payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct MultilingualItem {
    pub entity_type: String,
    /// Language code → term, e.g. `{"EN": "Paimon", "CHS": "派蒙"}`.
    pub mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrosslingualItem {
    pub term: String,
    pub entity_type: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrecedentItem {
    pub content: String,
    pub category: String,
    pub reason: String,
    pub assessment: Bucket,
    pub content_type: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// A source object, discriminated by its `type` field. Items stay raw until
/// [`read_items`] so one malformed item cannot reject the whole object.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum IngestPayload {
    #[serde(rename = "multilingual_terminology")]
    Multilingual {
        #[serde(default)]
        author: String,
        data: Vec<Value>,
    },
    #[serde(rename = "crosslingual_terminology")]
    Crosslingual {
        #[serde(default)]
        author: String,
        data: Vec<Value>,
    },
    #[serde(rename = "precedents")]
    Precedents {
        #[serde(default)]
        author: String,
        data: Vec<Value>,
    },
}

impl IngestPayload {
    pub fn parse(text: &str, key: &str) -> Result<Self, AppError> {
        serde_json::from_str(text)
            .map_err(|e| AppError::InputFormat(format!("{key} is not an ingest payload: {e}")))
    }
}

/// Decodes each raw item on its own, paired with its source position.
/// Items that do not decode are logged, counted in `rejected` and skipped.
pub fn read_items<T: DeserializeOwned>(data: &[Value], rejected: &mut usize) -> Vec<(usize, T)> {
    data.iter()
        .enumerate()
        .filter_map(|(idx, raw)| match T::deserialize(raw) {
            Ok(item) => Some((idx, item)),
            Err(e) => {
                warn!("Failed to process item {idx}: {e}");
                *rejected += 1;
                None
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Index documents
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecedentFields {
    pub category: String,
    pub reason: String,
    pub assessment: String,
    pub content_type: String,
    pub lang: String,
}

/// The persisted index record. Field order is fixed, which keeps the
/// serialization (and therefore the id) stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDocument {
    pub publish_date: String,
    pub doc: String,
    pub idx: usize,
    pub doc_type: String,
    pub content: String,
    pub doc_title: String,
    pub doc_author: String,
    pub doc_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(flatten)]
    pub precedent: Option<PrecedentFields>,
}

pub fn document_id(document: &IndexDocument) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(document)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Documents built from one payload, plus how many items were skipped.
#[derive(Debug, Clone, Default)]
pub struct BuiltDocuments {
    pub documents: Vec<IndexDocument>,
    pub rejected: usize,
}

/// Flattens a payload into index documents, one per readable item. `idx` is the
/// item's position in the source, so skipped items leave gaps.
pub fn build_documents(
    payload: &IngestPayload,
    doc_title: &str,
    publish_date: &str,
) -> BuiltDocuments {
    let base = |idx: usize, author: &str| IndexDocument {
        publish_date: publish_date.to_string(),
        doc: String::new(),
        idx,
        doc_type: String::new(),
        content: String::new(),
        doc_title: doc_title.to_string(),
        doc_author: author.to_string(),
        doc_category: String::new(),
        embedding: None,
        precedent: None,
    };

    let mut rejected = 0;
    let documents = match payload {
        IngestPayload::Multilingual { author, data } => {
            read_items::<MultilingualItem>(data, &mut rejected)
                .into_iter()
                .filter_map(|(idx, item)| match serde_json::to_string(&item.mapping) {
                    Ok(content) => Some(IndexDocument {
                        doc: item.mapping.values().cloned().collect::<Vec<_>>().join(" "),
                        doc_type: TermDocType::Multilingual.as_str().to_string(),
                        content,
                        doc_category: item.entity_type,
                        embedding: item.embedding,
                        ..base(idx, author.as_str())
                    }),
                    Err(e) => {
                        warn!("Failed to process item {idx}: {e}");
                        rejected += 1;
                        None
                    }
                })
                .collect()
        }

        IngestPayload::Crosslingual { author, data } => {
            read_items::<CrosslingualItem>(data, &mut rejected)
                .into_iter()
                .map(|(idx, item)| IndexDocument {
                    doc: item.term.clone(),
                    doc_type: TermDocType::Crosslingual.as_str().to_string(),
                    content: item.term,
                    doc_category: item.entity_type,
                    embedding: item.embedding,
                    ..base(idx, author.as_str())
                })
                .collect()
        }

        IngestPayload::Precedents { author, data } => {
            read_items::<PrecedentItem>(data, &mut rejected)
                .into_iter()
                .map(|(idx, item)| IndexDocument {
                    doc: item.content.clone(),
                    doc_type: PRECEDENT_DOC_TYPE.to_string(),
                    content: item.content,
                    doc_category: item.category.clone(),
                    embedding: item.embedding,
                    precedent: Some(PrecedentFields {
                        category: item.category,
                        reason: item.reason,
                        assessment: item.assessment.label().to_string(),
                        content_type: item.content_type,
                        lang: item.lang,
                    }),
                    ..base(idx, author.as_str())
                })
                .collect()
        }
    };

    BuiltDocuments {
        documents,
        rejected,
    }
}

pub fn build_index_ops(documents: &[IndexDocument]) -> Result<Vec<IndexOp>, AppError> {
    documents
        .iter()
        .map(|doc| -> Result<IndexOp, AppError> {
            let id = document_id(doc).map_err(|e| AppError::Internal(e.into()))?;
            let source = serde_json::to_value(doc).map_err(|e| AppError::Internal(e.into()))?;
            Ok(IndexOp { id, source })
        })
        .collect()
}

/// Indexes every item of one `.json` source object.
pub async fn ingest_object(
    blobs: &dyn BlobStore,
    store: &dyn RecordStore,
    key: &str,
    publish_date: &str,
) -> Result<BulkReport, AppError> {
    info!("Ingesting {key} into the search index");

    let text = load_json_object(blobs, key).await?;
    let payload = IngestPayload::parse(&text, key)?;
    let built = build_documents(&payload, file_stem(key), publish_date);
    let ops = build_index_ops(&built.documents)?;

    let mut report = BulkReport {
        indexed: 0,
        failed: built.rejected,
    };
    for batch in ops.chunks(BULK_BATCH) {
        report.merge(store.bulk_index(batch).await?);
    }

    if report.failed > 0 {
        warn!("{key}: {} document(s) failed to index", report.failed);
    }
    info!("Ingested {} document(s) from {key}", report.indexed);
    Ok(report)
}
