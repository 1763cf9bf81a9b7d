//! Object-key handling for batch jobs.
//!
//! Keys arrive the way bucket event notifications deliver them: comma-separated,
//! percent-encoded, with spaces turned into `+`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;

/// Body of every object-key job endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectKeysRequest {
    /// Comma-separated, percent-encoded keys, as delivered by bucket notifications.
    pub object_keys: String,
    #[serde(default)]
    pub model_id: Option<String>,
    /// Stamped on indexed documents; defaults to the job start time.
    #[serde(default)]
    pub publish_date: Option<String>,
}

/// Per-key result of an object job. One failed key never aborts the others.
#[derive(Debug, Clone, Serialize)]
pub struct KeyOutcome<T> {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> KeyOutcome<T> {
    pub fn from_result(key: String, result: Result<T, AppError>) -> Self {
        match result {
            Ok(value) => Self {
                key,
                result: Some(value),
                error: None,
            },
            Err(e) => {
                warn!("Object {key} failed: {e}");
                Self {
                    key,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Splits, percent-decodes and un-plusses a comma-separated key list.
/// Empty segments are dropped.
///
/// Decoding never fails: byte sequences that are not UTF-8 become U+FFFD, and
/// such a key then fails on its own when the object is loaded.
pub fn parse_object_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|k| !k.trim().is_empty())
        .map(|k| {
            let bytes = urlencoding::decode_binary(k.as_bytes());
            String::from_utf8_lossy(&bytes).replace('+', " ")
        })
        .collect()
}

pub fn ensure_json_key(key: &str) -> Result<(), AppError> {
    if key.ends_with(".json") {
        Ok(())
    } else {
        Err(AppError::InputFormat(format!(
            "Object '{key}' is not a .json file"
        )))
    }
}

/// Final path segment without the `.json` extension.
pub fn file_stem(key: &str) -> &str {
    let name = key.rsplit('/').next().unwrap_or(key);
    name.strip_suffix(".json").unwrap_or(name)
}

/// `dir/sub/file.json` → `dir/sub/translation/file.json`; a bare file name maps to
/// `translation/file.json`.
pub fn translation_output_key(key: &str) -> String {
    let (root, file_name) = key.rsplit_once('/').unwrap_or(("", key));
    format!("{root}/translation/{file_name}")
        .trim_matches('/')
        .to_string()
}
