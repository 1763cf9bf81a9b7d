//! Axum route handlers for the Moderation API.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::generation::decision::DecisionRecord;
use crate::moderation::models::ModerationRequest;
use crate::moderation::moderator::Moderator;
use crate::state::AppState;

/// POST /api/v1/moderate
///
/// Returns the parsed decision tags (`result`, `category`, `confidence`,
/// `explanation`, ...) flattened together with `white_response_cnt` and
/// `black_response_cnt`.
pub async fn handle_moderate(
    State(state): State<AppState>,
    Json(request): Json<ModerationRequest>,
) -> Result<Json<DecisionRecord>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    if request.content_type.trim().is_empty() {
        return Err(AppError::Validation("type cannot be empty".to_string()));
    }

    let model_id = request
        .model_id
        .as_deref()
        .unwrap_or(&state.config.model_id);

    let moderator = Moderator::new(state.record_store.clone(), state.llm.clone());
    let record = moderator
        .moderate(&request.text, &request.content_type, model_id)
        .await?;

    Ok(Json(record))
}
