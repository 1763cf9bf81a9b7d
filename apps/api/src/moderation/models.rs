use serde::{Deserialize, Serialize};

use crate::search::{RetrievalError, SearchHit, CONTENT_FIELD};

/// Index field holding the precedent label (`Whitelist` / `Blacklist`).
pub const ASSESSMENT_FIELD: &str = "assessment";
/// Index field holding the content category a precedent applies to (e.g. `motto`).
pub const CONTENT_TYPE_FIELD: &str = "content_type";
pub const CATEGORY_FIELD: &str = "category";
pub const REASON_FIELD: &str = "reason";

/// Precedent label. Each bucket implies the judgment its examples carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    Whitelist,
    Blacklist,
}

impl Bucket {
    /// The stored `assessment` value, also used as the prompt block tag.
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Whitelist => "Whitelist",
            Bucket::Blacklist => "Blacklist",
        }
    }

    pub fn judgment(self) -> Judgment {
        match self {
            Bucket::Whitelist => Judgment::Pass,
            Bucket::Blacklist => Judgment::Reject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Pass,
    Reject,
}

impl Judgment {
    pub fn as_str(self) -> &'static str {
        match self {
            Judgment::Pass => "pass",
            Judgment::Reject => "reject",
        }
    }
}

/// A previously judged example, as retrieved. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecedentRecord {
    pub text: String,
    pub category: String,
    pub explanation: String,
    pub judgment: Judgment,
    pub relevance_score: f64,
}

impl PrecedentRecord {
    /// `content` is required; a missing category or reason renders as empty.
    pub fn from_hit(hit: &SearchHit, bucket: Bucket) -> Result<Self, RetrievalError> {
        let text = hit.source_str(CONTENT_FIELD).ok_or_else(|| {
            RetrievalError::MalformedResponse(format!(
                "{} precedent {} has no '{CONTENT_FIELD}' field",
                bucket.label(),
                hit.id.as_deref().unwrap_or("<unknown>")
            ))
        })?;

        Ok(Self {
            text: text.to_string(),
            category: hit.source_str(CATEGORY_FIELD).unwrap_or_default().to_string(),
            explanation: hit.source_str(REASON_FIELD).unwrap_or_default().to_string(),
            judgment: bucket.judgment(),
            relevance_score: hit.relevance(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationRequest {
    pub text: String,
    /// Content category, e.g. `nickname` or `motto`.
    #[serde(rename = "type")]
    pub content_type: String,
    /// Overrides the configured model for this call.
    #[serde(default)]
    pub model_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::hit;
    use serde_json::json;

    #[test]
    fn test_from_hit_takes_judgment_from_bucket() {
        let h = hit(
            json!({"content": "I hate weapons", "category": "Verbal Abuse", "reason": "hostile"}),
            3.2,
        );

        let record = PrecedentRecord::from_hit(&h, Bucket::Blacklist).unwrap();
        assert_eq!(record.text, "I hate weapons");
        assert_eq!(record.explanation, "hostile");
        assert_eq!(record.judgment, Judgment::Reject);
        assert_eq!(record.relevance_score, 3.2);
    }

    #[test]
    fn test_from_hit_without_content_is_malformed() {
        let h = hit(json!({"category": "Ads"}), 1.0);
        let err = PrecedentRecord::from_hit(&h, Bucket::Whitelist).unwrap_err();
        assert!(matches!(err, RetrievalError::MalformedResponse(_)));
    }

    #[test]
    fn test_request_reads_type_field() {
        let req: ModerationRequest =
            serde_json::from_value(json!({"text": "hi", "type": "nickname"})).unwrap();
        assert_eq!(req.content_type, "nickname");
        assert!(req.model_id.is_none());
    }
}
