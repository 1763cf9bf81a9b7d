//! Blob-backed translation jobs: read a job object, translate it, write the
//! result next to it under `translation/`.

use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::storage::blob::{load_json_object, BlobStore};
use crate::storage::keys::translation_output_key;
use crate::translation::models::TranslationJob;
use crate::translation::translator::Translator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationObjectReport {
    pub output_key: String,
    pub translated: usize,
    pub failed: usize,
}

pub async fn translate_object(
    blobs: &dyn BlobStore,
    translator: &Translator,
    key: &str,
    model_id: &str,
) -> Result<TranslationObjectReport, AppError> {
    info!("Start translating {key}");

    let text = load_json_object(blobs, key).await?;
    let job: TranslationJob = serde_json::from_str(&text)
        .map_err(|e| AppError::InputFormat(format!("{key} is not a translation job: {e}")))?;

    let job = translator.translate_job(job, model_id).await;
    let dest = job.dest_content.as_deref().unwrap_or_default();
    let translated = dest.iter().filter(|d| d.is_some()).count();
    let failed = dest.len() - translated;

    let body = serde_json::to_vec(&job).map_err(|e| AppError::Internal(e.into()))?;
    let output_key = translation_output_key(key);
    blobs
        .put(&output_key, Bytes::from(body), "application/json")
        .await?;

    info!("Finished translating {key} → {output_key}");
    Ok(TranslationObjectReport {
        output_key,
        translated,
        failed,
    })
}
