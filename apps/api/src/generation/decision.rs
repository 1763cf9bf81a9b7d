//! Decision Assembler: parsed tags plus retrieval diagnostics.

use serde::Serialize;

use crate::generation::tags::TagMap;

/// Tag carrying the model's verdict.
pub const VERDICT_TAG: &str = "result";

/// Precise-tier hit counts per precedent bucket. Zero means the bucket fell back
/// to the broad tier (or had nothing at all).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalDiagnostics {
    pub white_response_cnt: usize,
    pub black_response_cnt: usize,
}

impl RetrievalDiagnostics {
    const KEYS: [&'static str; 2] = ["white_response_cnt", "black_response_cnt"];
}

/// The terminal artifact of a moderation call. Serializes as one flat object:
/// every parsed tag plus the diagnostic counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    #[serde(flatten)]
    tags: TagMap,
    #[serde(flatten)]
    diagnostics: RetrievalDiagnostics,
}

impl DecisionRecord {
    /// Diagnostic counts override any model tag with the same name.
    pub fn assemble(mut tags: TagMap, diagnostics: RetrievalDiagnostics) -> Self {
        for key in RetrievalDiagnostics::KEYS {
            tags.remove(key);
        }
        Self { tags, diagnostics }
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    pub fn diagnostics(&self) -> RetrievalDiagnostics {
        self.diagnostics
    }

    /// No `<result>` verdict was parsed (this includes an empty tag map). Still a
    /// valid record; callers flag it as unparseable model output for monitoring.
    /// The re-attached prefill always yields a `content` tag on its own.
    pub fn is_unparseable(&self) -> bool {
        !self.tags.contains_key(VERDICT_TAG)
    }
}
