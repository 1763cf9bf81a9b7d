//! Key-value terminology ingestion: one row per (term, language) of every
//! multilingual mapping, so a term in any language leads to its full mapping.

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::ingest::documents::{read_items, IngestPayload, MultilingualItem};
use crate::storage::blob::{load_json_object, BlobStore};
use crate::storage::terms::{TermRow, TermStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermIngestReport {
    pub rows: usize,
    /// Source items skipped because they could not be read.
    pub rejected: usize,
}

/// Rows for every readable item, plus the number of items skipped.
#[derive(Debug, Clone, Default)]
pub struct TermRows {
    pub rows: Vec<TermRow>,
    pub rejected: usize,
}

/// Only multilingual payloads carry mappings; anything else is an input error.
/// A malformed item is skipped without affecting the others.
pub fn term_rows(payload: &IngestPayload) -> Result<TermRows, AppError> {
    let IngestPayload::Multilingual { data, .. } = payload else {
        return Err(AppError::InputFormat(
            "terminology table ingestion expects a multilingual_terminology payload".to_string(),
        ));
    };

    let mut rejected = 0;
    let items = read_items::<MultilingualItem>(data, &mut rejected);
    let rows = items
        .iter()
        .flat_map(|(_, item)| {
            item.mapping
                .iter()
                .filter(|(_, term)| !term.is_empty())
                .map(move |(language, term)| TermRow {
                    term: term.clone(),
                    entity_type: item.entity_type.clone(),
                    language: language.clone(),
                    mapping: item.mapping.clone(),
                })
        })
        .collect();

    Ok(TermRows { rows, rejected })
}

pub async fn ingest_terminology_object(
    blobs: &dyn BlobStore,
    terms: &dyn TermStore,
    key: &str,
) -> Result<TermIngestReport, AppError> {
    info!("Ingesting {key} into the terminology table");

    let text = load_json_object(blobs, key).await?;
    let TermRows { rows, rejected } = term_rows(&IngestPayload::parse(&text, key)?)?;
    for row in &rows {
        terms.upsert(row).await?;
    }

    if rejected > 0 {
        warn!("{key}: skipped {rejected} unreadable item(s)");
    }
    info!("Wrote {} terminology row(s) from {key}", rows.len());
    Ok(TermIngestReport {
        rows: rows.len(),
        rejected,
    })
}
