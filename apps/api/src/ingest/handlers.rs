//! Axum route handlers for the ingestion jobs.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::errors::AppError;
use crate::ingest::documents::ingest_object;
use crate::ingest::terminology::{ingest_terminology_object, TermIngestReport};
use crate::search::BulkReport;
use crate::state::AppState;
use crate::storage::keys::{parse_object_keys, KeyOutcome, ObjectKeysRequest};

fn require_keys(raw: &str) -> Result<Vec<String>, AppError> {
    let keys = parse_object_keys(raw);
    if keys.is_empty() {
        return Err(AppError::Validation("object_keys cannot be empty".to_string()));
    }
    Ok(keys)
}

/// POST /api/v1/ingest/objects
///
/// Indexes terminology or precedent objects into the search index.
pub async fn handle_ingest_objects(
    State(state): State<AppState>,
    Json(request): Json<ObjectKeysRequest>,
) -> Result<Json<Vec<KeyOutcome<BulkReport>>>, AppError> {
    let keys = require_keys(&request.object_keys)?;
    let publish_date = request
        .publish_date
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%d %H:%M:%S").to_string());

    let mut outcomes = Vec::with_capacity(keys.len());
    for key in keys {
        let result = ingest_object(
            state.blobs.as_ref(),
            state.record_store.as_ref(),
            &key,
            &publish_date,
        )
        .await;
        outcomes.push(KeyOutcome::from_result(key, result));
    }

    Ok(Json(outcomes))
}

/// POST /api/v1/terminology/objects
///
/// Writes multilingual terminology objects to the key-value terminology table.
pub async fn handle_terminology_objects(
    State(state): State<AppState>,
    Json(request): Json<ObjectKeysRequest>,
) -> Result<Json<Vec<KeyOutcome<TermIngestReport>>>, AppError> {
    let keys = require_keys(&request.object_keys)?;

    let mut outcomes = Vec::with_capacity(keys.len());
    for key in keys {
        let result =
            ingest_terminology_object(state.blobs.as_ref(), state.terms.as_ref(), &key).await;
        outcomes.push(KeyOutcome::from_result(key, result));
    }

    Ok(Json(outcomes))
}
