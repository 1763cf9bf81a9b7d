//! Axum route handlers for the Translation API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::keys::{parse_object_keys, KeyOutcome, ObjectKeysRequest};
use crate::translation::jobs::{translate_object, TranslationObjectReport};
use crate::translation::models::TranslationJob;
use crate::translation::translator::Translator;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(flatten)]
    pub job: TranslationJob,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/translate
///
/// Translates `src_content` item by item and returns the job with
/// `dest_content` filled in. Failed items come back as `null`.
pub async fn handle_translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslationJob>, AppError> {
    let TranslateRequest { model_id, job } = request;
    if job.src_lang.trim().is_empty() || job.dest_lang.trim().is_empty() {
        return Err(AppError::Validation(
            "src_lang and dest_lang are required".to_string(),
        ));
    }

    let model_id = model_id.unwrap_or_else(|| state.config.model_id.clone());
    let translator = Translator::new(state.record_store.clone(), state.llm.clone());

    Ok(Json(translator.translate_job(job, &model_id).await))
}

/// POST /api/v1/translate/objects
///
/// Runs a translation job for each listed `.json` object. Keys are processed in
/// order; each reports its own outcome.
pub async fn handle_translate_objects(
    State(state): State<AppState>,
    Json(request): Json<ObjectKeysRequest>,
) -> Result<Json<Vec<KeyOutcome<TranslationObjectReport>>>, AppError> {
    let keys = parse_object_keys(&request.object_keys);
    if keys.is_empty() {
        return Err(AppError::Validation("object_keys cannot be empty".to_string()));
    }

    let model_id = request
        .model_id
        .unwrap_or_else(|| state.config.model_id.clone());
    let translator = Translator::new(state.record_store.clone(), state.llm.clone());

    let mut outcomes = Vec::with_capacity(keys.len());
    for key in keys {
        let result = translate_object(state.blobs.as_ref(), &translator, &key, &model_id).await;
        outcomes.push(KeyOutcome::from_result(key, result));
    }

    Ok(Json(outcomes))
}
