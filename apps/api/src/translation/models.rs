use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::search::{RetrievalError, SearchHit, CONTENT_FIELD};

pub const DOC_TYPE_FIELD: &str = "doc_type";
pub const DOC_CATEGORY_FIELD: &str = "doc_category";
pub const IDX_FIELD: &str = "idx";

/// The two kinds of terminology the index holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermDocType {
    /// `content` maps language codes to the term in that language.
    #[serde(rename = "multilingual_terminology")]
    Multilingual,
    /// `content` is a term that must be kept untranslated.
    #[serde(rename = "crosslingual_terminology")]
    Crosslingual,
}

impl TermDocType {
    pub fn as_str(self) -> &'static str {
        match self {
            TermDocType::Multilingual => "multilingual_terminology",
            TermDocType::Crosslingual => "crosslingual_terminology",
        }
    }
}

/// A terminology hit as retrieved from the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermRecord {
    pub idx: i64,
    /// Entity type of the term (e.g. `Character`, `Product`).
    pub doc_category: String,
    pub content: String,
    pub doc_type: String,
    pub score: f64,
}

impl TermRecord {
    /// A stored `content` object is kept as its JSON text so both kinds of
    /// record carry a string.
    pub fn from_hit(hit: &SearchHit) -> Result<Self, RetrievalError> {
        let content = match hit.source.get(CONTENT_FIELD) {
            Some(Value::String(s)) => s.clone(),
            Some(other @ Value::Object(_)) => other.to_string(),
            _ => {
                return Err(RetrievalError::MalformedResponse(format!(
                    "terminology record {} has no usable '{CONTENT_FIELD}' field",
                    hit.id.as_deref().unwrap_or("<unknown>")
                )))
            }
        };

        Ok(Self {
            idx: hit.source.get(IDX_FIELD).and_then(Value::as_i64).unwrap_or(0),
            doc_category: hit
                .source_str(DOC_CATEGORY_FIELD)
                .unwrap_or_default()
                .to_string(),
            content,
            doc_type: hit.source_str(DOC_TYPE_FIELD).unwrap_or_default().to_string(),
            score: hit.relevance(),
        })
    }
}

/// One source → target term correspondence for a language pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminologyMapping {
    pub source_term: String,
    pub target_term: String,
    pub entity_type: String,
    pub language_pair: (String, String),
}

impl TerminologyMapping {
    /// `None` when the record is not a JSON object, lacks either language, or
    /// has no entity type.
    pub fn from_record(record: &TermRecord, src_lang: &str, dest_lang: &str) -> Option<Self> {
        let mapping: Map<String, Value> = serde_json::from_str(&record.content).ok()?;
        let term = |lang: &str| {
            mapping
                .get(lang)
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };

        if record.doc_category.is_empty() {
            return None;
        }

        Some(Self {
            source_term: term(src_lang)?,
            target_term: term(dest_lang)?,
            entity_type: record.doc_category.clone(),
            language_pair: (src_lang.to_string(), dest_lang.to_string()),
        })
    }

    /// `[entity_type] source=>target`
    pub fn render(&self) -> String {
        format!(
            "[{}] {}=>{}",
            self.entity_type, self.source_term, self.target_term
        )
    }
}

/// A batch translation job. Unknown fields are carried through to the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationJob {
    pub src_lang: String,
    pub dest_lang: String,
    pub src_content: Vec<String>,
    /// Filled positionally; `null` marks an item that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_content: Option<Vec<Option<String>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::hit;
    use serde_json::json;

    fn multilingual(content: &str, entity: &str) -> TermRecord {
        TermRecord {
            idx: 0,
            doc_category: entity.to_string(),
            content: content.to_string(),
            doc_type: TermDocType::Multilingual.as_str().to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn test_from_hit_accepts_object_content() {
        let h = hit(
            json!({
                "idx": 3,
                "doc_category": "Character",
                "content": {"EN": "Paimon", "CHS": "派蒙"},
                "doc_type": "multilingual_terminology"
            }),
            2.0,
        );

        let record = TermRecord::from_hit(&h).unwrap();
        assert_eq!(record.idx, 3);
        let mapping = TerminologyMapping::from_record(&record, "EN", "CHS").unwrap();
        assert_eq!(mapping.render(), "[Character] Paimon=>派蒙");
    }

    #[test]
    fn test_from_hit_without_content_is_malformed() {
        let h = hit(json!({"doc_category": "Character"}), 1.0);
        assert!(matches!(
            TermRecord::from_hit(&h),
            Err(RetrievalError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_partial_mappings_are_dropped() {
        let missing_dest = multilingual(r#"{"EN": "Paimon"}"#, "Character");
        let empty_entity = multilingual(r#"{"EN": "Paimon", "CHS": "派蒙"}"#, "");
        let not_json = multilingual("Paimon", "Character");

        for record in [missing_dest, empty_entity, not_json] {
            assert!(TerminologyMapping::from_record(&record, "EN", "CHS").is_none());
        }
    }

    #[test]
    fn test_job_carries_unknown_fields() {
        let job: TranslationJob = serde_json::from_value(json!({
            "src_lang": "EN",
            "dest_lang": "CHS",
            "src_content": ["hello"],
            "batch": "2024-06"
        }))
        .unwrap();
        assert!(job.dest_content.is_none());

        let out = serde_json::to_value(&job).unwrap();
        assert_eq!(out["batch"], "2024-06");
        assert!(out.get("dest_content").is_none());
    }
}
