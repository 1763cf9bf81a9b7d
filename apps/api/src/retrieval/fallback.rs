//! Fallback Retriever: precise query first, match-all only when precise is empty.
//!
//! Guarantees:
//! - At most two backend calls per lookup; the broad query is issued only when the
//!   precise query returned zero hits.
//! - A result is entirely precise-tier or entirely broad-tier, never a mix.
//! - Backend failures propagate. An unreachable index is never reported as "no precedents".
//!
//! Hits are ordered by relevance descending with a stable sort, so ties keep the
//! engine's own order. Engines do not promise a stable order for equal scores,
//! so tied records may come back in a different order between clusters.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::search::{FieldFilter, RecordStore, RetrievalError, SearchHit, SearchQuery};

/// Which query produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Precise,
    Broad,
}

/// Filters, page size and projected fields shared by both tiers of one lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupScope {
    pub filters: Vec<FieldFilter>,
    pub size: usize,
    pub source_fields: Vec<String>,
}

impl LookupScope {
    pub fn new(size: usize) -> Self {
        Self {
            filters: Vec::new(),
            size,
            source_fields: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_source_fields(mut self, fields: &[&str]) -> Self {
        self.source_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    fn query(&self, text_match: Option<&str>) -> SearchQuery {
        SearchQuery {
            text_match: text_match.map(str::to_string),
            filters: self.filters.clone(),
            size: self.size,
            source_fields: self.source_fields.clone(),
        }
    }
}

/// Ranked hits from exactly one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub tier: Tier,
    pub hits: Vec<SearchHit>,
}

impl RetrievalResult {
    /// Hits the precise query produced; zero whenever the broad tier answered.
    pub fn precise_hit_count(&self) -> usize {
        match self.tier {
            Tier::Precise => self.hits.len(),
            Tier::Broad => 0,
        }
    }
}

#[derive(Clone)]
pub struct FallbackRetriever {
    store: Arc<dyn RecordStore>,
}

impl FallbackRetriever {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn retrieve(
        &self,
        content: &str,
        scope: &LookupScope,
    ) -> Result<RetrievalResult, RetrievalError> {
        let precise = self.store.search(&scope.query(Some(content))).await?;
        if !precise.is_empty() {
            debug!("Precise tier returned {} hit(s)", precise.len());
            return Ok(ranked(Tier::Precise, precise, scope.size));
        }

        let broad = self.store.search(&scope.query(None)).await?;
        debug!(
            "Precise tier empty; broad tier returned {} hit(s)",
            broad.len()
        );
        Ok(ranked(Tier::Broad, broad, scope.size))
    }
}

fn ranked(tier: Tier, mut hits: Vec<SearchHit>, size: usize) -> RetrievalResult {
    // sort_by is stable: equal scores keep the backend order
    hits.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
    hits.truncate(size);
    RetrievalResult { tier, hits }
}
